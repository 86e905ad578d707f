//! Route pattern parsing and the `/`-aligned boundary helpers used by the tree.
//!
//! A registered path is a sequence of atoms: runs of literal text and
//! brace-delimited regex fragments. Inside a fragment every `{` and `}` counts
//! towards the nesting depth, so quantifiers such as `{1,3}` are part of the
//! fragment they appear in:
//! ```ignore
//!  /files/{(?P<name>[a-z]{1,8})}.{(?P<ext>txt|md)}
//!
//!  atoms: "/files/", [a-z]{1,8} as name, ".", txt|md as ext
//! ```
use crate::error::RouteError;
use crate::params::Params;

use std::collections::HashMap;
use std::ops::Range;

use regex::Regex;

/// A parsed piece of a route segment.
#[derive(Debug, Clone)]
pub(crate) enum Atom {
    Literal(String),
    Pattern(Pattern),
}

/// A compiled `{...}` fragment.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    regex: Regex,
    keys: Vec<String>,
}

impl Pattern {
    fn new(path: &str, source: &str) -> Result<Self, RouteError> {
        // matches are always anchored at the start of the remaining text
        let regex = Regex::new(&format!("^(?:{})", source)).map_err(|err| {
            RouteError::InvalidPattern {
                path: path.to_owned(),
                pattern: source.to_owned(),
                source: err,
            }
        })?;

        let keys = regex
            .capture_names()
            .flatten()
            .map(str::to_owned)
            .collect();

        Ok(Self { regex, keys })
    }

    /// Matches the fragment against the front of `text` and returns the number
    /// of bytes consumed. When `last` is set the match must run to the end of
    /// `text` or stop right before a `/`.
    pub(crate) fn consume(&self, text: &str, last: bool, params: &mut Params) -> Option<usize> {
        let captures = self.regex.captures(text)?;
        let end = captures.get(0)?.end();

        if last && end != text.len() && !text[end..].starts_with('/') {
            return None;
        }

        for key in &self.keys {
            if let Some(value) = captures.name(key) {
                params.push(key, value.as_str());
            }
        }

        Some(end)
    }
}

// Byte ranges of the literal runs and `{...}` bodies of `text`, each flagged
// with whether it is a regex body. Nothing is compiled here.
fn spans(text: &str) -> Result<Vec<(Range<usize>, bool)>, RouteError> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    if i > start {
                        spans.push((start..i, false));
                    }
                    start = i + 1;
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(RouteError::UnbalancedBraces(text.to_owned()));
                }
                depth -= 1;
                if depth == 0 {
                    if i == start {
                        return Err(RouteError::EmptyPattern {
                            path: text.to_owned(),
                            offset: start - 1,
                        });
                    }
                    spans.push((start..i, true));
                    start = i + 1;
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(RouteError::UnbalancedBraces(text.to_owned()));
    }

    if start < text.len() {
        spans.push((start..text.len(), false));
    }

    Ok(spans)
}

/// Splits `text` into literal runs and compiled regex fragments.
pub(crate) fn parse_atoms(text: &str) -> Result<Vec<Atom>, RouteError> {
    spans(text)?
        .into_iter()
        .map(|(range, is_pattern)| {
            let piece = &text[range];
            if is_pattern {
                Pattern::new(text, piece).map(Atom::Pattern)
            } else {
                Ok(Atom::Literal(piece.to_owned()))
            }
        })
        .collect()
}

/// A validated route path whose regex-bearing segments are compiled, ready to
/// be handed to the tree.
///
/// Every fragment is compiled exactly once, here. Tree nodes holding a regex
/// always cover exactly one segment, so they take their atoms from this map.
pub(crate) struct Route<'p> {
    pub(crate) path: &'p str,
    segments: HashMap<&'p str, Vec<Atom>>,
}

impl<'p> Route<'p> {
    pub(crate) fn parse(path: &'p str) -> Result<Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(path.to_owned()));
        }
        spans(path)?;

        let mut segments = HashMap::new();
        let mut pos = 0;
        while pos < path.len() {
            let segment = dispatch_key(&path[pos..]);
            if has_pattern(segment) && !segments.contains_key(segment) {
                let atoms = parse_atoms(segment).map_err(|err| match err {
                    RouteError::InvalidPattern {
                        pattern, source, ..
                    } => RouteError::InvalidPattern {
                        path: path.to_owned(),
                        pattern,
                        source,
                    },
                    other => other,
                })?;
                segments.insert(segment, atoms);
            }
            pos += segment.len();
        }

        Ok(Self { path, segments })
    }

    /// The atoms of a node part, empty for literal parts.
    pub(crate) fn atoms(&self, part: &str) -> Vec<Atom> {
        debug_assert!(
            !has_pattern(part) || self.segments.contains_key(part),
            "regex part '{}' is not a segment of '{}'",
            part,
            self.path
        );
        self.segments.get(part).cloned().unwrap_or_default()
    }
}

/// Whether `text` contains a regex fragment.
pub(crate) fn has_pattern(text: &str) -> bool {
    text.contains('{')
}

/// Index of the first `/` that is not inside a `{...}` fragment, or the length
/// of `path` if there is none.
pub(crate) fn first_unenclosed_slash(path: &str) -> usize {
    let mut depth = 0usize;

    for (i, b) in path.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'/' if depth == 0 => return i,
            _ => {}
        }
    }

    path.len()
}

/// The first segment of `tail`, up to and including its first unenclosed `/`.
///
/// Literal children are keyed by this value.
pub(crate) fn dispatch_key(tail: &str) -> &str {
    let end = first_unenclosed_slash(tail);
    &tail[..(end + 1).min(tail.len())]
}

/// Length of the longest common prefix of `a` and `b` that ends right after an
/// unenclosed `/`. Identical strings share their full length.
pub(crate) fn common_prefix(a: &str, b: &str) -> usize {
    if a == b {
        return a.len();
    }

    let mut depth = 0usize;
    let mut aligned = 0;

    for (i, (x, y)) in a.bytes().zip(b.bytes()).enumerate() {
        if x != y {
            break;
        }
        match x {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'/' if depth == 0 => aligned = i + 1,
            _ => {}
        }
    }

    aligned
}

/// Length of the front of `path` that a newly created node takes ownership of.
///
/// Consecutive literal segments stay together in one node. A segment holding a
/// regex fragment always gets a node of its own.
pub(crate) fn leading_span(path: &str) -> usize {
    let mut pos = 0;

    while pos < path.len() {
        let segment = dispatch_key(&path[pos..]);
        if has_pattern(segment) {
            return if pos == 0 { segment.len() } else { pos };
        }
        pos += segment.len();
    }

    path.len()
}
