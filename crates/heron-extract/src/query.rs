//! Query string parsing.

/// Decoded query string pairs, in request order.
///
/// Keys may repeat; [`QueryValues::get`] returns the last occurrence and
/// [`QueryValues::get_all`] returns every occurrence.
///
/// # Example
///
/// ```rust
/// use heron_extract::QueryValues;
///
/// let query = QueryValues::parse("tag=a&tag=b&q=rust+lang");
/// assert_eq!(query.get("q"), Some("rust lang"));
/// assert_eq!(query.get_all("tag"), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    pairs: Vec<(String, String)>,
}

impl QueryValues {
    /// Parses a raw query string. Undecodable input yields no pairs.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_default();
        Self { pairs }
    }

    /// Returns the last value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `name`, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns an iterator over all pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
