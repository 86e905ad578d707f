//! # RxRouter
//!
//! RxRouter is an HTTP request router whose routes may contain regular expressions.
//!
//! Routes are matched against the request method and path. A compressing dynamic
//! trie (radix tree) is kept per method, and each tree carries a small recency
//! cache of resolved paths, so hot paths are answered without walking the trie.
//!
//! ## Features
//!
//! **Regex path fragments:** Any part of a segment can be a regular expression
//! enclosed in braces. Named capture groups are handed to your handler as
//! parameters, so `/users/{(?P<id>[0-9]+)}` both validates and extracts the id.
//!
//! **Predictable precedence:** Literal routes are tried before regex routes at the
//! same position, and regex routes are tried in the order they were registered.
//! The first route that matches the whole path wins.
//!
//! **Cached lookups:** The result of a successful lookup, parameters included,
//! is remembered per method. Updating, adding or removing routes keeps the cache
//! coherent.
//!
//! **Fail at setup, not at request time:** Malformed patterns, invalid regexes and
//! duplicate routes are rejected when they are registered.
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use rxrouter::{Router, Params};
//! use hyper::{Request, Response, Body, Error};
//!
//! async fn index(_: Request<Body>) -> Result<Response<Body>, Error> {
//!     Ok(Response::new("Hello, World!".into()))
//! }
//!
//! async fn hello(req: Request<Body>) -> Result<Response<Body>, Error> {
//!     let params = req.extensions().get::<Params>().unwrap();
//!     Ok(Response::new(format!("Hello, {}", params.get("user").unwrap()).into()))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::default()
//!         .get("/", index)
//!         .get("/hello/{(?P<user>[a-z]+)}", hello);
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await;
//! }
//! ```
//!
//! ### Regex fragments
//!
//! A fragment starts at `{` and ends at the matching `}`. Braces inside the
//! fragment, such as quantifiers, are counted, so `{[0-9]{1,3}}` is a single
//! fragment:
//!
//! ```ignore
//! Pattern: /123/{(?P<v1>hello[0-9]{1,3})}/pig
//!
//!  /123/hello1/pig           match: v1="hello1"
//!  /123/hello123/pig         match: v1="hello123"
//!  /123/hello12345/pig       no match
//!  /123/hello/pig            no match
//! ```
//!
//! A fragment that ends a segment must match up to the next `/` or the end of
//! the path.
//!
//! ### Registration errors
//!
//! By default the builder methods panic on an invalid route, since a router
//! with a partially valid route table is of no use. To handle errors yourself,
//! install a reporter or register through [`Router::insert`]:
//!
//! ```rust
//! use rxrouter::Router;
//! use hyper::{Request, Response, Body};
//!
//! async fn hello(_: Request<Body>) -> hyper::Result<Response<Body>> {
//!     Ok(Response::new(Body::empty()))
//! }
//!
//! let router = Router::default()
//!     .on_error(|err| eprintln!("skipping route: {}", err))
//!     .get("/ok", hello)
//!     .get("/broken/{[0-9]+", hello);
//!
//! assert_eq!(router.route_count(&hyper::Method::GET), 1);
//! ```
//!
//! ### Using the tree directly
//!
//! [`RadixTree`] stores any value, not just handlers:
//!
//! ```rust
//! use rxrouter::RadixTree;
//!
//! let tree = RadixTree::new();
//! tree.insert("/files/{(?P<name>[a-z]+)}.{(?P<ext>txt|md)}", 1).unwrap();
//!
//! let found = tree.get("/files/readme.md").unwrap();
//! assert_eq!(*found.value, 1);
//! assert_eq!(found.params.get("ext"), Some("md"));
//! ```

#![forbid(unsafe_code)]

mod cache;
mod error;
mod params;
mod pattern;
mod tree;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use router::{BoxedHandler, Handler, Router};

pub use cache::DEFAULT_CACHE_CAPACITY;
pub use error::RouteError;
pub use params::{Param, Params};
pub use tree::{Match, RadixTree};

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
    macro_rules! doc_comment {
        ($x:expr) => {
            #[doc = $x]
            extern "C" {}
        };
    }

    doc_comment!(include_str!("../README.md"));
}
