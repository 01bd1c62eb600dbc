use std::collections::HashMap;

/// The set of capabilities most recently advertised by the server.
///
/// Capability names are matched case-insensitively. A `name=value` item is
/// recorded under `name` with `value` appended to its value list, so
/// `AUTH=PLAIN AUTH=LOGIN` yields one `AUTH` entry with two values; a bare
/// name is recorded with an empty value list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Capabilities(pub(crate) HashMap<String, Vec<String>>);

impl Capabilities {
    /// Check if the server advertises the given capability name.
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_uppercase())
    }

    /// The values advertised for the given capability name, in the order the
    /// server listed them. `None` if the capability was not advertised at
    /// all; an empty slice if it was advertised without values.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.0.get(&name.to_ascii_uppercase()).map(|v| &v[..])
    }

    /// Check if the given capability was advertised with the given value,
    /// compared case-insensitively (e.g. `AUTH` / `PLAIN`).
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.values(name)
            .map_or(false, |vs| vs.iter().any(|v| v.eq_ignore_ascii_case(value)))
    }

    /// Iterate over all capability names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, values)| (name.as_str(), &values[..]))
    }

    /// Number of distinct capability names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no capabilities are known (e.g. before the first `CAPABILITY`
    /// exchange, or right after `STARTTLS` invalidated the cache).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
