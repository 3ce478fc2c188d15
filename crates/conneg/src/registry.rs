//! The content type registry.
//!
//! Maps a MIME type to the codec handling it. Readers work on an immutable snapshot, while
//! registration and [`ContentRegistry::clear`] publish a new snapshot, so lookups made while
//! handling requests never block on setup code.

use std::sync::Arc;

use arc_swap::ArcSwap;
use mime::Mime;
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::charset::Charset;
use crate::codec::{BinaryCodec, CborCodec, Codec, FormCodec, JsonCodec, TextCodec, YamlCodec};
use crate::error::ContentError;

static GLOBAL: Lazy<Arc<ContentRegistry>> = Lazy::new(|| Arc::new(ContentRegistry::with_defaults()));

/// A codec registered for one MIME type.
#[derive(Debug, Clone)]
pub struct Registration {
    mime_type: String,
    slash: usize,
    codec: Codec,
    default_charset: Option<Charset>,
}

impl Registration {
    /// The registered `type/subtype`, lower case and without parameters.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn type_(&self) -> &str {
        &self.mime_type[..self.slash]
    }

    pub fn subtype(&self) -> &str {
        &self.mime_type[self.slash + 1..]
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn is_binary(&self) -> bool {
        self.codec.is_binary()
    }

    /// The charset assumed for text bodies that do not name one, `None` for binary types.
    pub fn default_charset(&self) -> Option<Charset> {
        self.default_charset
    }
}

/// Snapshot of registrations in registration order.
pub type Registrations = Arc<Vec<Arc<Registration>>>;

/// Table of content types this process can decode and encode.
#[derive(Debug)]
pub struct ContentRegistry {
    registrations: ArcSwap<Vec<Arc<Registration>>>,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { registrations: ArcSwap::from_pointee(Vec::new()) }
    }

    /// A registry with the built-in codecs, in this order: `application/json`,
    /// `application/yaml`, `application/x-www-form-urlencoded` (all utf-8 text) and
    /// `application/cbor` (binary).
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let utf_8 = Charset::utf_8();
        registry.insert("application/json", Codec::Text(Arc::new(JsonCodec)), Some(utf_8));
        registry.insert("application/yaml", Codec::Text(Arc::new(YamlCodec)), Some(utf_8));
        registry.insert("application/x-www-form-urlencoded", Codec::Text(Arc::new(FormCodec)), Some(utf_8));
        registry.insert("application/cbor", Codec::Binary(Arc::new(CborCodec)), None);
        registry
    }

    /// The process-wide registry, created with [`ContentRegistry::with_defaults`] on first use.
    pub fn global() -> Arc<ContentRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Registers a binary codec, replacing any earlier registration of `mime_type`.
    pub fn register_binary(&self, mime_type: &str, codec: impl BinaryCodec + 'static) -> Result<(), ContentError> {
        let mime_type = parse_registration_type(mime_type)?;
        self.insert(&mime_type, Codec::Binary(Arc::new(codec)), None);
        Ok(())
    }

    /// Registers a text codec, replacing any earlier registration of `mime_type`.
    ///
    /// `default_charset` must be a charset label the resolver knows.
    pub fn register_text(
        &self,
        mime_type: &str,
        default_charset: &str,
        codec: impl TextCodec + 'static,
    ) -> Result<(), ContentError> {
        let mime_type = parse_registration_type(mime_type)?;
        let charset = Charset::for_label(default_charset)
            .map_err(|e| ContentError::configuration(format!("{e} for {mime_type}")))?;
        self.insert(&mime_type, Codec::Text(Arc::new(codec)), Some(charset));
        Ok(())
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.registrations.store(Arc::new(Vec::new()));
        info!("cleared content type registrations");
    }

    /// Finds the registration for `mime_type`, ignoring case and parameters.
    pub fn lookup(&self, mime_type: &str) -> Option<Arc<Registration>> {
        let mime_type = mime_type.trim().parse::<Mime>().ok()?;
        self.registrations
            .load()
            .iter()
            .find(|registration| registration.mime_type().eq_ignore_ascii_case(mime_type.essence_str()))
            .cloned()
    }

    /// Every registered MIME type, in registration order.
    pub fn content_types(&self) -> Vec<String> {
        self.registrations.load().iter().map(|registration| registration.mime_type().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.load().is_empty()
    }

    /// The current registrations; later changes do not affect the returned snapshot.
    pub fn snapshot(&self) -> Registrations {
        self.registrations.load_full()
    }

    /// `mime_type` is a lower case `type/subtype`.
    fn insert(&self, mime_type: &str, codec: Codec, default_charset: Option<Charset>) {
        let slash = mime_type.find('/').unwrap_or(mime_type.len());
        let registration = Arc::new(Registration { mime_type: mime_type.to_string(), slash, codec, default_charset });
        debug!(
            mime_type = registration.mime_type(),
            binary = registration.is_binary(),
            "register content type"
        );

        self.registrations.rcu(|current| {
            let mut next = Vec::clone(current);
            match next.iter_mut().find(|existing| existing.mime_type() == registration.mime_type()) {
                Some(existing) => *existing = Arc::clone(&registration),
                None => next.push(Arc::clone(&registration)),
            }
            next
        });
    }
}

/// Registration keys are concrete `type/subtype` pairs, parameters are dropped.
fn parse_registration_type(mime_type: &str) -> Result<String, ContentError> {
    let parsed = mime_type
        .trim()
        .parse::<Mime>()
        .map_err(|e| ContentError::configuration(format!("malformed mime type {mime_type:?}: {e}")))?;

    if parsed.type_() == mime::STAR || parsed.subtype() == mime::STAR {
        return Err(ContentError::configuration(format!("wildcard mime type {mime_type:?} can not be registered")));
    }

    Ok(parsed.essence_str().to_ascii_lowercase())
}
