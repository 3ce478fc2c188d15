//! `Accept` header parsing (RFC 9110 §12.5.1).
//!
//! Ranges come out in preference order: quality first, then specificity, then position in the
//! header. Elements that do not parse, including those with an invalid `q`, are skipped.

use std::cmp::Reverse;

use mime::Mime;
use tracing::debug;

use crate::registry::Registration;

/// Quality in thousandths, `1000` is `q=1`.
pub type Quality = u16;

pub const MAX_QUALITY: Quality = 1000;

/// One element of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    type_: String,
    subtype: String,
    quality: Quality,
    parameters: Vec<(String, String)>,
    position: usize,
}

impl MediaRange {
    /// `*/*` with full quality, the range assumed when there is no `Accept` header.
    pub fn any() -> Self {
        Self { type_: "*".to_string(), subtype: "*".to_string(), quality: MAX_QUALITY, parameters: Vec::new(), position: 0 }
    }

    /// Parses one `Accept` element, `None` when it is malformed.
    pub fn parse(element: &str) -> Option<Self> {
        let mime = element.trim().parse::<Mime>().ok()?;
        let type_ = mime.type_().as_str().to_ascii_lowercase();
        let subtype = mime.subtype().as_str().to_ascii_lowercase();
        // `*/json` is not a media range
        if type_ == "*" && subtype != "*" {
            return None;
        }

        let mut quality = MAX_QUALITY;
        let mut parameters = Vec::new();
        for (name, value) in mime.params() {
            if name.as_str().eq_ignore_ascii_case("q") {
                quality = parse_quality(value.as_str())?;
            } else {
                parameters.push((name.as_str().to_ascii_lowercase(), value.as_str().to_string()));
            }
        }

        Some(Self { type_, subtype, quality, parameters, position: 0 })
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Index of the element in its `Accept` header, malformed elements included.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The value of parameter `name`, matched case-insensitively.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// 2 for `type/subtype`, 1 for `type/*`, 0 for `*/*`.
    pub fn specificity(&self) -> u8 {
        match (self.type_.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    pub fn matches(&self, registration: &Registration) -> bool {
        (self.type_ == "*" || self.type_ == registration.type_())
            && (self.subtype == "*" || self.subtype == registration.subtype())
    }
}

/// Parses an `Accept` header value into ranges in preference order.
///
/// An empty or absent header means `*/*`. Ranges with quality zero are kept, they exclude the
/// types they match.
pub fn parse_accept(header: Option<&str>) -> Vec<MediaRange> {
    let Some(header) = header.filter(|h| !h.trim().is_empty()) else {
        return vec![MediaRange::any()];
    };

    let mut ranges = Vec::new();
    for (position, element) in header.split(',').filter(|e| !e.trim().is_empty()).enumerate() {
        match MediaRange::parse(element) {
            Some(range) => ranges.push(MediaRange { position, ..range }),
            None => debug!(element, "skip malformed accept element"),
        }
    }

    // stable: equal ranges stay in header order
    ranges.sort_by_key(|range| (Reverse(range.quality), Reverse(range.specificity())));
    ranges
}

/// `qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )`
fn parse_quality(value: &str) -> Option<Quality> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut thousandths: Quality = 0;
    for (index, digit) in fraction.bytes().enumerate() {
        let place = [100, 10, 1][index];
        thousandths += Quality::from(digit - b'0') * place;
    }

    match whole {
        "0" => Some(thousandths),
        "1" if thousandths == 0 => Some(MAX_QUALITY),
        _ => None,
    }
}
