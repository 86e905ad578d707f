use thiserror::Error;

/// Errors raised while registering a route.
///
/// All of these are configuration errors: the route table is expected to be
/// fully valid before the router starts serving requests. A rejected
/// registration never leaves a partially inserted route behind.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path does not start with `/`.
    #[error("expect path beginning with '/', found: '{0}'")]
    MissingLeadingSlash(String),

    /// A `{` without its matching `}`, or a stray `}`.
    #[error("unbalanced braces in path '{0}'")]
    UnbalancedBraces(String),

    /// A `{}` fragment with nothing between the braces.
    #[error("empty pattern at byte {offset} in path '{path}'")]
    EmptyPattern { path: String, offset: usize },

    /// The body of a `{...}` fragment is not a valid regular expression.
    #[error("invalid pattern '{pattern}' in path '{path}': {source}")]
    InvalidPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A handler is already registered for this exact path.
    #[error("a handler is already registered for path '{0}'")]
    DuplicatePath(String),
}
