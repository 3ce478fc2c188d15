//! Body codecs.
//!
//! A codec turns a [`Value`] into a representation and back. Binary codecs work on raw bytes,
//! text codecs on text; the charset conversion around a text codec belongs to the negotiator.
//!
//! Built-in codecs:
//! - [`JsonCodec`]: `application/json`
//! - [`YamlCodec`]: `application/yaml`
//! - [`FormCodec`]: `application/x-www-form-urlencoded`
//! - [`CborCodec`]: `application/cbor`

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CodecError;

mod cbor;
mod form;
mod json;
mod yaml;

pub use cbor::CborCodec;
pub use form::FormCodec;
pub use json::JsonCodec;
pub use yaml::YamlCodec;

/// A codec working on raw bytes.
#[cfg_attr(test, mockall::automock)]
pub trait BinaryCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError>;
}

/// A codec working on text, the charset is applied outside of it.
#[cfg_attr(test, mockall::automock)]
pub trait TextCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    fn decode(&self, text: &str) -> Result<Value, CodecError>;
}

/// A registered codec, tagged with its kind.
#[derive(Clone)]
pub enum Codec {
    Binary(Arc<dyn BinaryCodec>),
    Text(Arc<dyn TextCodec>),
}

impl Codec {
    pub fn is_binary(&self) -> bool {
        matches!(self, Codec::Binary(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Codec::Text(_))
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Binary(_) => f.write_str("Codec::Binary"),
            Codec::Text(_) => f.write_str("Codec::Text"),
        }
    }
}
