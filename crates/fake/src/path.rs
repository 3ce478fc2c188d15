//! Path and query helpers shared by patterns and URLs.

/// Percent-encodes every segment of `path`, keeping `/` separators and adding a leading `/`.
///
/// ```
/// use micro_fake::path::quote_path;
///
/// assert_eq!(quote_path("path that/needs/quo+ing"), "/path%20that/needs/quo%2Bing");
/// assert_eq!(quote_path(""), "/");
/// ```
pub fn quote_path(path: &str) -> String {
    let quoted = path.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/");
    if quoted.starts_with('/') { quoted } else { format!("/{quoted}") }
}

/// Form-encodes query pairs sorted by name, then value.
pub fn encode_query<K: AsRef<str>, V: AsRef<str>>(query: &[(K, V)]) -> Result<String, serde_urlencoded::ser::Error> {
    let mut pairs = query.iter().map(|(k, v)| (k.as_ref(), v.as_ref())).collect::<Vec<_>>();
    pairs.sort_unstable();
    serde_urlencoded::to_string(pairs)
}

/// Decodes a raw query string into pairs, in order of appearance.
pub fn decode_query(query: &str) -> Result<Vec<(String, String)>, serde_urlencoded::de::Error> {
    serde_urlencoded::from_str(query)
}
