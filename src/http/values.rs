use std::fmt;

/// Ordered, multi-valued string mapping.
///
/// Keys keep the order in which they were first inserted and every key keeps
/// its values in the order they were added. Lookups are exact and
/// case-sensitive. Used both for query parameters and, as [`Headers`], for
/// request and response headers.
///
/// ```
/// use rawhttp::Values;
///
/// let mut values = Values::new();
/// values.add("a", "1");
/// values.add("b", "2");
/// values.add("a", "3");
///
/// assert_eq!(values.get("a"), ["1", "3"]);
/// assert_eq!(values.first("b"), Some("2"));
/// assert_eq!(values.keys().collect::<Vec<_>>(), ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: Vec<(String, Vec<String>)>,
}

/// Header collection of a request or response.
///
/// Header names are compared case-sensitively, the same way as any other
/// [`Values`] key.
pub type Headers = Values;

impl Values {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == key)
    }

    fn slot(&mut self, key: String) -> &mut Vec<String> {
        let index = match self.position(&key) {
            Some(index) => index,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Appends one value to `key`, creating the key if needed.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.slot(key.into()).push(value.into());
    }

    /// Appends several values to `key`, creating the key if needed.
    ///
    /// The key is created even when `values` is empty.
    pub fn append<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.slot(key.into())
            .extend(values.into_iter().map(Into::into));
    }

    /// Replaces all values of `key`. An existing key keeps its position.
    pub fn set<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let slot = self.slot(key.into());
        slot.clear();
        slot.extend(values.into_iter().map(Into::into));
    }

    /// All values of `key`, empty when the key is absent.
    pub fn get(&self, key: &str) -> &[String] {
        match self.position(key) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Removes `key` and returns its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates over keys with their values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get_ignore_case(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, values)| values.as_slice())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Values::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Values {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl fmt::Display for Values {
    /// Renders the values the way header lines are written: `key: v1, v2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, values) in self.iter() {
            writeln!(f, "{key}: {}", values.join(", "))?;
        }
        Ok(())
    }
}
