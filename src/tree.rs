//! The per-method radix tree.
//!
//! Nodes own the text they consume. Literal children are keyed by their first
//! segment, children that start with a regex fragment are kept in registration
//! order and tried one after another:
//! ```ignore
//!  /abc/def/            "/abc/"
//!  /abc/123              ├─ "def/"
//!  /abc/{[0-9]+}/pig     ├─ "123"
//!                        └─ "{[0-9]+}/" (regex)
//!                            └─ "pig"
//! ```
//! Nodes are only ever split right after a `/` that is not inside a regex
//! fragment, so a segment holding a regex always lives in a node of its own.
use crate::cache::{RouteCache, Slot, DEFAULT_CACHE_CAPACITY};
use crate::error::RouteError;
use crate::params::Params;
use crate::pattern::{self, Atom, Route};

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tracing::trace;

/// A successful lookup: the registered value and the captured parameters.
#[derive(Debug, Clone)]
pub struct Match<T> {
    pub value: Arc<T>,
    pub params: Params,
}

struct Node<T> {
    part: String,
    // empty for pure literal nodes
    atoms: Vec<Atom>,
    handler: Option<Slot<T>>,
    children: HashMap<String, Node<T>>,
    regex_children: Vec<Node<T>>,
}

impl<T> Node<T> {
    fn new(part: &str, atoms: Vec<Atom>) -> Self {
        Self {
            part: part.to_owned(),
            atoms,
            handler: None,
            children: HashMap::new(),
            regex_children: Vec::new(),
        }
    }

    /// Builds the chain of nodes for `path`, a tail of `route`, below a
    /// position where nothing covers it yet.
    fn build(path: &str, route: &Route<'_>, value: Slot<T>) -> Self {
        let span = pattern::leading_span(path);
        let part = &path[..span];
        let mut node = Node::new(part, route.atoms(part));

        if span == path.len() {
            node.handler = Some(value);
        } else {
            node.attach(Node::build(&path[span..], route, value));
        }

        node
    }

    fn is_pattern(&self) -> bool {
        !self.atoms.is_empty()
    }

    fn is_vacant(&self) -> bool {
        self.handler.is_none() && self.children.is_empty() && self.regex_children.is_empty()
    }

    fn attach(&mut self, child: Node<T>) {
        if child.is_pattern() {
            self.regex_children.push(child);
        } else {
            let key = pattern::dispatch_key(&child.part).to_owned();
            self.children.insert(key, child);
        }
    }

    fn insert(&mut self, path: &str, route: &Route<'_>, value: Slot<T>) -> Result<(), RouteError> {
        let common = pattern::common_prefix(&self.part, path);
        debug_assert!(common > 0, "descended into a node that shares nothing");

        if common < self.part.len() {
            self.split(common);
        }

        let rest = &path[common..];
        if rest.is_empty() {
            if self.handler.is_some() {
                return Err(RouteError::DuplicatePath(route.path.to_owned()));
            }
            self.handler = Some(value);
            return Ok(());
        }

        let key = pattern::dispatch_key(rest);
        if pattern::has_pattern(key) {
            if let Some(child) = self.regex_children.iter_mut().find(|c| c.part == key) {
                return child.insert(rest, route, value);
            }
        } else if let Some(child) = self.children.get_mut(key) {
            return child.insert(rest, route, value);
        }

        self.attach(Node::build(rest, route, value));
        Ok(())
    }

    // Shrinks this node to `part[..at]` and moves everything it owned into a
    // new literal child holding the remainder.
    fn split(&mut self, at: usize) {
        debug_assert!(!self.is_pattern(), "regex nodes are never split");

        let child = Node {
            part: self.part.split_off(at),
            atoms: Vec::new(),
            handler: self.handler.take(),
            children: mem::take(&mut self.children),
            regex_children: mem::take(&mut self.regex_children),
        };
        self.attach(child);
    }

    /// Consumes this node's part from the front of `path`, returning the rest.
    fn consume<'p>(&self, path: &'p str, params: &mut Params) -> Option<&'p str> {
        if !self.is_pattern() {
            return path.strip_prefix(self.part.as_str());
        }

        let mut rest = path;
        let last = self.atoms.len() - 1;
        for (i, atom) in self.atoms.iter().enumerate() {
            rest = match atom {
                Atom::Literal(text) => rest.strip_prefix(text.as_str())?,
                Atom::Pattern(pattern) => {
                    let end = pattern.consume(rest, i == last, params)?;
                    &rest[end..]
                }
            };
        }

        Some(rest)
    }

    fn find(&self, path: &str, params: &mut Params) -> Option<&Slot<T>> {
        let rest = self.consume(path, params)?;
        if rest.is_empty() {
            return self.handler.as_ref();
        }

        let mark = params.len();
        if let Some(child) = self.children.get(pattern::dispatch_key(rest)) {
            if let Some(slot) = child.find(rest, params) {
                return Some(slot);
            }
            params.truncate(mark);
        }

        for child in &self.regex_children {
            if let Some(slot) = child.find(rest, params) {
                return Some(slot);
            }
            params.truncate(mark);
        }

        None
    }

    /// Follows the registered pattern text of `path` down to its node.
    fn exact(&self, path: &str) -> Option<&Node<T>> {
        let rest = path.strip_prefix(self.part.as_str())?;
        if rest.is_empty() {
            return Some(self);
        }

        let key = pattern::dispatch_key(rest);
        if pattern::has_pattern(key) {
            self.regex_children
                .iter()
                .find(|c| c.part == key)?
                .exact(rest)
        } else {
            self.children.get(key)?.exact(rest)
        }
    }

    /// Clears the handler registered for exactly `path` and prunes the nodes
    /// left without a handler or children on the way back up.
    fn remove(&mut self, path: &str) -> bool {
        let rest = match path.strip_prefix(self.part.as_str()) {
            Some(rest) => rest,
            None => return false,
        };
        if rest.is_empty() {
            return self.handler.take().is_some();
        }

        let key = pattern::dispatch_key(rest);
        if pattern::has_pattern(key) {
            let i = match self.regex_children.iter().position(|c| c.part == key) {
                Some(i) => i,
                None => return false,
            };
            if !self.regex_children[i].remove(rest) {
                return false;
            }
            if self.regex_children[i].is_vacant() {
                self.regex_children.remove(i);
            }
        } else {
            let vacant = match self.children.get_mut(key) {
                Some(child) => {
                    if !child.remove(rest) {
                        return false;
                    }
                    child.is_vacant()
                }
                None => return false,
            };
            if vacant {
                self.children.remove(key);
            }
        }

        true
    }
}

struct Inner<T> {
    root: Option<Node<T>>,
    size: usize,
}

/// A radix tree mapping path patterns to values, with a recency cache of
/// resolved lookups in front of it.
///
/// The tree is safe to share between threads. Lookups take a shared lock on
/// the trie and fill the cache while holding it; a cache hit only takes the
/// cache's own lock. `insert`, `update` and `remove` hold the trie's
/// exclusive lock for the whole operation.
///
/// ```rust
/// use rxrouter::RadixTree;
///
/// let tree = RadixTree::new();
/// tree.insert("/abc/def/", "def").unwrap();
/// tree.insert("/123/{(?P<v1>hello[0-9]{1,3})}/pig", "pig").unwrap();
///
/// let found = tree.get("/123/hello123/pig").unwrap();
/// assert_eq!(*found.value, "pig");
/// assert_eq!(found.params.get("v1"), Some("hello123"));
///
/// assert!(tree.get("/123/hello12345/pig").is_none());
/// ```
pub struct RadixTree<T> {
    inner: RwLock<Inner<T>>,
    cache: RouteCache<T>,
}

impl<T> RadixTree<T> {
    /// Creates an empty tree with a cache of [`DEFAULT_CACHE_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an empty tree caching up to `capacity` resolved paths. A
    /// capacity of zero disables the cache.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                root: None,
                size: 0,
            }),
            cache: RouteCache::new(capacity),
        }
    }

    /// Registers `value` for `path`.
    ///
    /// The path is fully parsed, and every regex fragment compiled, before the
    /// tree is modified, so an error leaves the tree untouched.
    pub fn insert(&self, path: &str, value: T) -> Result<(), RouteError> {
        self.insert_route(&Route::parse(path)?, value)
    }

    pub(crate) fn insert_route(&self, route: &Route<'_>, value: T) -> Result<(), RouteError> {
        let path = route.path;
        let slot = Arc::new(ArcSwap::from_pointee(value));

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        match inner.root {
            Some(ref mut root) => root.insert(path, route, slot)?,
            None => inner.root = Some(Node::build(path, route, slot)),
        }
        inner.size += 1;
        self.invalidate(path);

        Ok(())
    }

    /// Resolves a request path to its value and captured parameters.
    pub fn get(&self, path: &str) -> Option<Match<T>> {
        if let Some((value, params)) = self.cache.get(path) {
            trace!(path, "route cache hit");
            return Some(Match { value, params });
        }
        trace!(path, "route cache miss");

        let inner = self.inner.read();
        let mut params = Params::default();
        let slot = inner.root.as_ref()?.find(path, &mut params)?;

        let value = slot.load_full();
        // filled under the read lock so no writer can invalidate in between
        self.cache.put(path, Arc::clone(slot), params.clone());

        Some(Match { value, params })
    }

    /// Whether `path` resolves to a value.
    ///
    /// Unlike [`RadixTree::get`] this never fills the cache or changes the
    /// recency of its entries, so probing a path on behalf of another method
    /// leaves this tree's hot entries alone.
    pub fn contains_match(&self, path: &str) -> bool {
        if self.cache.contains(path) {
            return true;
        }

        let inner = self.inner.read();
        let mut params = Params::default();
        inner
            .root
            .as_ref()
            .map_or(false, |root| root.find(path, &mut params).is_some())
    }

    /// Replaces the value registered for exactly `path`. Returns `false` if no
    /// value is registered there.
    pub fn update(&self, path: &str, value: T) -> bool {
        let inner = self.inner.write();
        let slot = match inner.root.as_ref().and_then(|root| root.exact(path)) {
            Some(node) => match node.handler {
                Some(ref slot) => slot,
                None => return false,
            },
            None => return false,
        };

        // cached lookups share this cell and observe the new value
        slot.store(Arc::new(value));
        trace!(path, "route updated");
        true
    }

    /// Removes the value registered for exactly `path`. Returns `false` if no
    /// value is registered there.
    pub fn remove(&self, path: &str) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let removed = match inner.root {
            Some(ref mut root) => root.remove(path),
            None => false,
        };
        if !removed {
            return false;
        }

        inner.size -= 1;
        if inner.root.as_ref().map_or(false, Node::is_vacant) {
            inner.root = None;
            inner.size = 0;
        }
        self.invalidate(path);

        trace!(path, "route removed");
        true
    }

    /// Removes every route and empties the cache.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.root = None;
        inner.size = 0;
        self.cache.clear();
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.inner.read().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a lookup of `path` would currently be answered from the cache.
    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains(path)
    }

    /// Number of resolved paths currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    // A literal pattern can only ever resolve its own path. A regex pattern
    // may resolve any number of cached paths, so the whole cache goes.
    fn invalidate(&self, path: &str) {
        if pattern::has_pattern(path) {
            trace!(path, "flushing route cache");
            self.cache.clear();
        } else {
            self.cache.remove(path);
        }
    }
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
