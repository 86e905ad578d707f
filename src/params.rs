use std::ops::Index;
use std::slice;

/// A single captured path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// Parameters captured by the named groups of a matched route, in match order.
///
/// There are two ways to retrieve the value of a parameter:
/// ```rust
/// # use rxrouter::RadixTree;
/// let tree = RadixTree::new();
/// tree.insert("/users/{(?P<id>[0-9]+)}", "user").unwrap();
///
/// let params = tree.get("/users/42").unwrap().params;
///
/// // by the name of the parameter
/// assert_eq!(params.get("id"), Some("42"));
///
/// // or by its index, which also exposes the key
/// assert_eq!(params[0].key, "id");
/// assert_eq!(params[0].value, "42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    /// Returns the value of the first parameter registered under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, key: &str, value: &str) {
        self.0.push(Param {
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }

    // Drops the parameters captured by a branch that failed to match.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl Index<usize> for Params {
    type Output = Param;

    fn index(&self, i: usize) -> &Param {
        &self.0[i]
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_first_match() {
        let mut params = Params::default();
        params.push("id", "1");
        params.push("name", "gordon");
        params.push("id", "2");

        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.get("name"), Some("gordon"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn truncate_drops_backtracked_captures() {
        let mut params = Params::default();
        params.push("a", "1");
        let mark = params.len();
        params.push("b", "2");
        params.truncate(mark);

        assert_eq!(params.len(), 1);
        assert_eq!(params[0].key, "a");
        assert!(params.get("b").is_none());
    }
}
