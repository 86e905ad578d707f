//! [`Router`](crate::Router) is an HTTP request router built on a radix tree
//! whose path segments may hold regular expressions.
//!
//! One tree is kept per request method and created on the first registration
//! for that method. Every tree remembers its most recently resolved paths, so
//! repeated requests for the same path skip the trie walk altogether.
//!
//! The `Router` can be used as a router for a hyper server:
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
//!```
//!
//! A registered path is literal text, optionally mixed with regex fragments
//! enclosed in braces. Named capture groups become parameters:
//! ```ignore
//!  Syntax                  Matches
//!  /blog/                  exactly "/blog/"
//!  {(?P<name>[a-z]+)}      the regex, captured as "name"
//!  {[0-9]{1,3}}            the regex, nothing captured
//! ```
//!
//! A fragment may share a segment with literal text or with other fragments:
//! ```ignore
//!  Path: /files/{(?P<name>[a-z]+)}.{(?P<ext>txt|md)}
//!
//!  Requests:
//!   /files/readme.md          match: name="readme", ext="md"
//!   /files/readme.rs          no match
//!   /files/readme.md/raw      no match
//! ```
//!
//! Literal routes take precedence over regex routes at the same position.
//! Among regex routes at the same position the one registered first wins.
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::RouteError;
use crate::pattern::Route;
use crate::tree::{Match, RadixTree};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{future, ready};
use hyper::header::{self, HeaderValue};
use hyper::service::Service;
use hyper::{Body, Method, Request, Response, StatusCode};
use parking_lot::RwLock;
use tracing::{debug, error};

/// The value stored in each method's tree.
pub type BoxedHandler = Box<dyn Handler>;

type ErrorReporter = Box<dyn Fn(RouteError) + Send + Sync>;

/// Router dispatches requests to different handlers via configurable routes.
pub struct Router {
    trees: RwLock<HashMap<Method, Arc<RadixTree<BoxedHandler>>>>,
    cache_capacity: usize,
    redirect_trailing_slash: bool,
    handle_method_not_allowed: bool,
    handle_options: bool,
    global_options: Option<BoxedHandler>,
    not_found: Option<BoxedHandler>,
    method_not_allowed: Option<BoxedHandler>,
    on_error: Option<ErrorReporter>,
}

impl Router {
    /// Insert a handler into the router for a specific path at the specified method.
    ///
    /// Registration errors are passed to the reporter installed with
    /// [`Router::on_error`]. Without one, this panics.
    /// ```rust
    /// use rxrouter::Router;
    /// use hyper::{Response, Body, Method};
    ///
    /// let router = Router::default()
    ///     .handle("/teapot", Method::GET, |_| async {
    ///         Ok(Response::new(Body::from("I am a teapot!")))
    ///     });
    /// ```
    pub fn handle(self, path: &str, method: Method, handler: impl Handler + 'static) -> Self {
        if let Err(err) = self.insert(method, path, handler) {
            self.report(err);
        }

        self
    }

    /// Registers a handler, returning any registration error to the caller.
    ///
    /// Unlike the builder methods this takes `&self`, so routes can be added
    /// while the router is already serving.
    /// ```rust
    /// use rxrouter::{Router, RouteError};
    /// use hyper::{Response, Body, Method};
    ///
    /// let router = Router::default();
    /// router.insert(Method::GET, "/home", |_| async { Ok(Response::new(Body::empty())) }).unwrap();
    ///
    /// let err = router
    ///     .insert(Method::GET, "/home", |_| async { Ok(Response::new(Body::empty())) })
    ///     .unwrap_err();
    /// assert!(matches!(err, RouteError::DuplicatePath(_)));
    /// ```
    pub fn insert(
        &self,
        method: Method,
        path: &str,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        // a rejected path never creates the method's tree
        let route = Route::parse(path)?;
        self.tree_or_create(&method).insert_route(&route, Box::new(handler))?;

        debug!(%method, path, "route registered");
        Ok(())
    }

    /// Lookup allows the manual lookup of the handler for a specific method and path.
    /// Returns `None` if no route matches.
    /// ```rust
    /// use rxrouter::Router;
    /// use hyper::{Response, Body, Method};
    ///
    /// let router = Router::default()
    ///     .get("/home", |_| async {
    ///         Ok(Response::new(Body::from("Welcome!")))
    ///     });
    ///
    /// let res = router.lookup(&Method::GET, "/home").unwrap();
    /// assert!(res.params.is_empty());
    /// assert!(router.lookup(&Method::POST, "/home").is_none());
    /// ```
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Match<BoxedHandler>> {
        self.tree(method)?.get(path)
    }

    /// Replaces the handler registered for exactly `path`. Returns `false` if
    /// there is none.
    pub fn update(&self, method: &Method, path: &str, handler: impl Handler + 'static) -> bool {
        let updated = self
            .tree(method)
            .map_or(false, |tree| tree.update(path, Box::new(handler)));

        if updated {
            debug!(%method, path, "route updated");
        }
        updated
    }

    /// Removes the handler registered for exactly `path`. Returns `false` if
    /// there is none.
    pub fn remove(&self, method: &Method, path: &str) -> bool {
        let removed = self
            .tree(method)
            .map_or(false, |tree| tree.remove(path));

        if removed {
            debug!(%method, path, "route removed");
        }
        removed
    }

    /// Number of routes registered for `method`.
    pub fn route_count(&self, method: &Method) -> usize {
        self.tree(method).map_or(0, |tree| tree.len())
    }

    fn tree(&self, method: &Method) -> Option<Arc<RadixTree<BoxedHandler>>> {
        self.trees.read().get(method).cloned()
    }

    // Creation is serialized by the map's write lock.
    fn tree_or_create(&self, method: &Method) -> Arc<RadixTree<BoxedHandler>> {
        if let Some(tree) = self.tree(method) {
            return tree;
        }

        let capacity = self.cache_capacity;
        let mut trees = self.trees.write();
        Arc::clone(
            trees
                .entry(method.clone())
                .or_insert_with(|| Arc::new(RadixTree::with_capacity(capacity))),
        )
    }

    fn report(&self, err: RouteError) {
        error!(error = %err, "route registration failed");
        match self.on_error {
            Some(ref reporter) => reporter(err),
            None => panic!("{}", err),
        }
    }

    /// Register a handler for `GET` requests
    pub fn get(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::GET, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::HEAD, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::OPTIONS, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::POST, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::PUT, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::PATCH, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.handle(path, Method::DELETE, handler)
    }

    /// Sets how many resolved paths each method's tree keeps cached. Zero
    /// disables the cache. Only trees created after this call are affected.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Installs a reporter for registration errors raised by the builder
    /// methods, instead of panicking.
    /// ```rust
    /// use rxrouter::Router;
    /// use hyper::{Response, Body};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let errors = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&errors);
    ///
    /// let router = Router::default()
    ///     .on_error(move |err| sink.lock().unwrap().push(err.to_string()))
    ///     .get("no-slash", |_| async { Ok(Response::new(Body::empty())) })
    ///     .get("/ok", |_| async { Ok(Response::new(Body::empty())) });
    ///
    /// assert_eq!(errors.lock().unwrap().len(), 1);
    /// assert_eq!(router.route_count(&hyper::Method::GET), 1);
    /// ```
    pub fn on_error(mut self, reporter: impl Fn(RouteError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(reporter));
        self
    }

    /// Enables automatic redirection if the current route can't be matched but a
    /// handler for the path with (without) the trailing slash exists.
    /// For example if `/foo/` is requested but a route only exists for `/foo`, the
    /// client is redirected to `/foo` with HTTP status code 301 for `GET` requests
    /// and 308 for all other request methods.
    pub fn redirect_trailing_slash(mut self) -> Self {
        self.redirect_trailing_slash = true;
        self
    }

    /// If enabled, the router checks if another method is allowed for the
    /// current route, if the current request can not be routed.
    /// If this is the case, the request is answered with `MethodNotAllowed`
    /// and HTTP status code 405.
    /// If no other Method is allowed, the request is delegated to the `NotFound`
    /// handler.
    pub fn handle_method_not_allowed(mut self) -> Self {
        self.handle_method_not_allowed = true;
        self
    }

    /// If enabled, the router automatically replies to `OPTIONS` requests.
    /// Custom `OPTIONS` handlers take priority over automatic replies.
    pub fn handle_options(mut self) -> Self {
        self.handle_options = true;
        self
    }

    /// An optional handler that is called on automatic `OPTIONS` requests.
    /// The handler is only called if `handle_options` is true and no `OPTIONS`
    /// handler for the specific path was set.
    pub fn global_options(mut self, handler: impl Handler + 'static) -> Self {
        self.global_options = Some(Box::new(handler));
        self
    }

    /// Configurable handler which is called when no matching route is
    /// found.
    pub fn not_found(mut self, handler: impl Handler + 'static) -> Self {
        self.not_found = Some(Box::new(handler));
        self
    }

    /// A configurable handler which is called when a request
    /// cannot be routed and `handle_method_not_allowed` is true.
    pub fn method_not_allowed(mut self, handler: impl Handler + 'static) -> Self {
        self.method_not_allowed = Some(Box::new(handler));
        self
    }

    /// Returns a list of the allowed methods for a specific path
    /// ```rust
    /// use rxrouter::Router;
    /// use hyper::{Response, Body};
    ///
    /// let router = Router::default()
    ///     .get("/home", |_| async {
    ///         Ok(Response::new(Body::from("Welcome!")))
    ///     })
    ///     .post("/home", |_| async {
    ///         Ok(Response::new(Body::from("Welcome!")))
    ///     });
    ///
    /// let allowed = router.allowed("/home");
    /// assert!(allowed.contains(&"GET".to_string()));
    /// assert!(allowed.contains(&"POST".to_string()));
    /// assert!(allowed.contains(&"OPTIONS".to_string()));
    /// # assert_eq!(allowed.len(), 3);
    /// ```
    pub fn allowed(&self, path: &str) -> Vec<String> {
        let trees = self.trees.read();

        let mut allowed = trees
            .iter()
            .filter(|(method, _)| **method != Method::OPTIONS)
            .filter(|(_, tree)| match path {
                "*" => !tree.is_empty(),
                _ => tree.contains_match(path),
            })
            .map(|(method, _)| method.to_string())
            .collect::<Vec<_>>();

        if !allowed.is_empty() {
            allowed.sort();
            allowed.push(Method::OPTIONS.to_string());
        }

        allowed
    }
}

/// The default router configuration
impl Default for Router {
    fn default() -> Self {
        Self {
            trees: RwLock::new(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            redirect_trailing_slash: true,
            handle_method_not_allowed: true,
            handle_options: true,
            global_options: None,
            not_found: None,
            method_not_allowed: None,
            on_error: None,
        }
    }
}

/// Represents a HTTP handler function.
/// This trait is implemented for asynchronous functions that take a `Request` and return a
/// `Result<Response<Body>, hyper::Error>`
/// ```rust
/// # use rxrouter::Handler;
/// # use hyper::{Request, Response, Body};
/// async fn hello(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
pub trait Handler: Send + Sync {
    fn handle(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>>;
}

impl<F, R> Handler for F
where
    F: Fn(Request<Body>) -> R + Send + Sync,
    R: Future<Output = Result<Response<Body>, hyper::Error>> + Send + Sync + 'static,
{
    fn handle(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>> {
        Box::pin(self(req))
    }
}

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl RouterService {
    fn new(router: Router) -> Self {
        RouterService(Arc::new(router))
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.0.serve(req)
    }
}

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// If you have an existing `Service` that you want to incorporate a `Router` into, see
    /// [`Router::serve`](crate::Router::serve).
    /// ```rust,no_run
    /// # use rxrouter::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// // Our router...
    /// let router = Router::default();
    ///
    /// // Convert it into a service...
    /// let service = router.into_service();
    ///
    /// // Serve with hyper
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService::new(self))
    }

    /// An asynchronous function from a `Request` to a `Response`. You will generally not need to use
    /// this function directly, and instead use
    /// [`Router::into_service`](crate::Router::into_service). However, it may be useful when
    /// incorporating the router into a larger service.
    /// ```rust,no_run
    /// # use rxrouter::Router;
    /// # use hyper::service::{make_service_fn, service_fn};
    /// # use hyper::{Request, Body, Server};
    /// # use std::convert::Infallible;
    /// # use std::sync::Arc;
    ///
    /// # async fn run() {
    /// let router = Arc::new(Router::default());
    ///
    /// let make_svc = make_service_fn(move |_| {
    ///     let router = router.clone();
    ///     async move {
    ///         Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
    ///             let router = router.clone();
    ///             async move { router.serve(req).await }
    ///         }))
    ///     }
    /// });
    ///
    /// let server = Server::bind(&([127, 0, 0, 1], 3000).into())
    ///     .serve(make_svc)
    ///     .await;
    /// # }
    /// ```
    pub fn serve(&self, mut req: Request<Body>) -> ResponseFut {
        let path = req.uri().path().to_owned();

        if let Some(tree) = self.tree(req.method()) {
            if let Some(found) = tree.get(&path) {
                req.extensions_mut().insert(found.params);
                return ResponseFutKind::Boxed(found.value.handle(req)).into();
            }

            if self.redirect_trailing_slash && req.method() != Method::CONNECT && path != "/" {
                let fixed = match path.strip_suffix('/') {
                    Some(trimmed) => trimmed.to_owned(),
                    None => [path.as_str(), "/"].concat(),
                };

                if tree.contains_match(&fixed) {
                    let code = match *req.method() {
                        // Moved Permanently, request with GET method
                        Method::GET => StatusCode::MOVED_PERMANENTLY,
                        // Permanent Redirect, request with same method
                        _ => StatusCode::PERMANENT_REDIRECT,
                    };
                    return ResponseFutKind::Redirect(fixed, code).into();
                }
            }
        }

        if req.method() == Method::OPTIONS && self.handle_options {
            let allow = self.allowed(&path);

            if !allow.is_empty() {
                return match self.global_options {
                    Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
                    None => ResponseFutKind::Options(allow.join(", ")).into(),
                };
            }
        } else if self.handle_method_not_allowed {
            let allow = self.allowed(&path);

            if !allow.is_empty() {
                return match self.method_not_allowed {
                    Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
                    None => ResponseFutKind::MethodNotAllowed(allow.join(", ")).into(),
                };
            }
        }

        match self.not_found {
            Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
            None => ResponseFutKind::NotFound.into(),
        }
    }
}

pub struct ResponseFut {
    kind: ResponseFutKind,
}

impl From<ResponseFutKind> for ResponseFut {
    fn from(kind: ResponseFutKind) -> Self {
        Self { kind }
    }
}

enum ResponseFutKind {
    Boxed(Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>>),
    Redirect(String, StatusCode),
    MethodNotAllowed(String),
    Options(String),
    NotFound,
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = status;
    res
}

fn with_header(mut res: Response<Body>, name: header::HeaderName, value: &str) -> Response<Body> {
    if let Ok(value) = HeaderValue::from_str(value) {
        res.headers_mut().insert(name, value);
    }
    res
}

impl Future for ResponseFut {
    type Output = hyper::Result<Response<Body>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let ready = match self.kind {
            ResponseFutKind::Boxed(ref mut fut) => ready!(fut.as_mut().poll(cx)),
            ResponseFutKind::Redirect(ref path, code) => {
                Ok(with_header(empty(code), header::LOCATION, path))
            }
            ResponseFutKind::NotFound => Ok(empty(StatusCode::NOT_FOUND)),
            ResponseFutKind::Options(ref allowed) => {
                Ok(with_header(empty(StatusCode::OK), header::ALLOW, allowed))
            }
            ResponseFutKind::MethodNotAllowed(ref allowed) => Ok(with_header(
                empty(StatusCode::METHOD_NOT_ALLOWED),
                header::ALLOW,
                allowed,
            )),
        };

        Poll::Ready(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn text(body: &'static str) -> impl Handler {
        move |_: Request<Body>| async move { Ok::<_, hyper::Error>(Response::new(Body::from(body))) }
    }

    async fn call(router: &Router, method: Method, path: &str) -> Response<Body> {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        router.serve(req).await.unwrap()
    }

    async fn body(res: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        std::str::from_utf8(&bytes).unwrap().to_owned()
    }

    #[tokio::test]
    async fn dispatches_by_method_and_path() {
        let router = Router::default()
            .get("/abc/def/", text("get def"))
            .get("/abc/123", text("get 123"))
            .post("/abc/123", text("post 123"));

        assert_eq!(body(call(&router, Method::GET, "/abc/def/").await).await, "get def");
        assert_eq!(body(call(&router, Method::GET, "/abc/123").await).await, "get 123");
        assert_eq!(body(call(&router, Method::POST, "/abc/123").await).await, "post 123");
    }

    #[tokio::test]
    async fn params_are_inserted_into_extensions() {
        let router = Router::default().get(
            "/123/{(?P<v1>hello[0-9]{1,3})}/pig",
            |req: Request<Body>| async move {
                let params = req.extensions().get::<crate::Params>().unwrap();
                Ok::<_, hyper::Error>(Response::new(Body::from(params.get("v1").unwrap().to_owned())))
            },
        );

        let res = call(&router, Method::GET, "/123/hello123/pig").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(res).await, "hello123");

        let res = call(&router, Method::GET, "/123/hello12345/pig").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn not_found() {
        let router = Router::default().get("/home", text("home"));
        let res = call(&router, Method::GET, "/nope").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let router = Router::default().not_found(|_| async {
            let mut res = Response::new(Body::from("custom"));
            *res.status_mut() = StatusCode::NOT_FOUND;
            Ok::<_, hyper::Error>(res)
        });
        let res = call(&router, Method::GET, "/nope").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(res).await, "custom");
    }

    #[tokio::test]
    async fn method_not_allowed() {
        let router = Router::default()
            .get("/home", text("home"))
            .put("/home", text("home"));

        let res = call(&router, Method::POST, "/home").await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, PUT, OPTIONS");
    }

    #[tokio::test]
    async fn rejected_requests_leave_other_caches_alone() {
        let router = Router::default()
            .cache_capacity(2)
            .get("/hot", text("hot"))
            .get("/x/{[a-z]+}", text("x"));
        assert_eq!(body(call(&router, Method::GET, "/hot").await).await, "hot");

        for path in ["/x/a", "/x/b"] {
            let res = call(&router, Method::POST, path).await;
            assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
        let res = call(&router, Method::OPTIONS, "/x/c").await;
        assert_eq!(res.headers()[header::ALLOW], "GET, OPTIONS");
        let res = call(&router, Method::GET, "/hot/").await;
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);

        let get = router.tree(&Method::GET).unwrap();
        assert!(get.is_cached("/hot"));
        assert_eq!(get.cache_len(), 1);
    }

    #[tokio::test]
    async fn automatic_options() {
        let router = Router::default().get("/home", text("home"));

        let res = call(&router, Method::OPTIONS, "/home").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ALLOW], "GET, OPTIONS");

        let router = Router::default()
            .get("/home", text("home"))
            .options("/home", text("custom options"));
        let res = call(&router, Method::OPTIONS, "/home").await;
        assert_eq!(body(res).await, "custom options");

        let router = Router::default()
            .get("/home", text("home"))
            .global_options(text("global options"));
        let res = call(&router, Method::OPTIONS, "/home").await;
        assert_eq!(body(res).await, "global options");
    }

    #[tokio::test]
    async fn trailing_slash_redirect() {
        let router = Router::default()
            .get("/foo", text("foo"))
            .post("/bar/", text("bar"));

        let res = call(&router, Method::GET, "/foo/").await;
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/foo");

        let res = call(&router, Method::POST, "/bar").await;
        assert_eq!(res.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/bar/");
    }

    #[test]
    fn update_and_remove() {
        let router = Router::default()
            .get("/a", text("a"))
            .get("/b", text("b"));

        assert_eq!(router.route_count(&Method::GET), 2);
        assert!(router.update(&Method::GET, "/a", text("a2")));
        assert!(!router.update(&Method::GET, "/c", text("c")));
        assert!(!router.update(&Method::POST, "/a", text("a")));

        assert!(router.remove(&Method::GET, "/a"));
        assert!(!router.remove(&Method::GET, "/a"));
        assert!(!router.remove(&Method::DELETE, "/a"));
        assert_eq!(router.route_count(&Method::GET), 1);
        assert!(router.lookup(&Method::GET, "/a").is_none());
        assert!(router.lookup(&Method::GET, "/b").is_some());
    }

    #[tokio::test]
    async fn update_is_served() {
        let router = Router::default().get("/a", text("old"));
        assert_eq!(body(call(&router, Method::GET, "/a").await).await, "old");

        assert!(router.update(&Method::GET, "/a", text("new")));
        assert_eq!(body(call(&router, Method::GET, "/a").await).await, "new");
    }

    #[test]
    #[should_panic(expected = "a handler is already registered for path '/a'")]
    fn duplicate_registration_panics_without_reporter() {
        let _ = Router::default().get("/a", text("a")).get("/a", text("b"));
    }

    #[test]
    #[should_panic(expected = "expect path beginning with '/'")]
    fn missing_slash_panics_without_reporter() {
        let _ = Router::default().get("a", text("a"));
    }

    #[test]
    fn reporter_receives_errors() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);

        let router = Router::default()
            .on_error(move |err| sink.lock().unwrap().push(err))
            .get("/a", text("a"))
            .get("/a", text("b"))
            .get("/{}", text("c"))
            .get("/b/{[0-9]+", text("d"));

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], RouteError::DuplicatePath(_)));
        assert!(matches!(errors[1], RouteError::EmptyPattern { .. }));
        assert!(matches!(errors[2], RouteError::UnbalancedBraces(_)));
        assert_eq!(router.route_count(&Method::GET), 1);
    }

    #[test]
    fn rejected_first_registration_creates_no_tree() {
        let router = Router::default()
            .on_error(|_| {})
            .get("/a", text("a"))
            .post("/b/{[0-9]+", text("b"))
            .put("no-slash", text("c"))
            .delete("/d/{(}", text("d"));

        assert_eq!(router.trees.read().len(), 1);
        assert!(router.tree(&Method::POST).is_none());
        assert_eq!(router.allowed("*"), vec!["GET", "OPTIONS"]);
    }

    #[test]
    fn trees_are_created_per_method() {
        let router = Router::default().cache_capacity(0).get("/a", text("a"));

        assert_eq!(router.route_count(&Method::GET), 1);
        assert_eq!(router.route_count(&Method::POST), 0);
        assert!(router.lookup(&Method::POST, "/a").is_none());

        let trees = router.trees.read();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[&Method::GET].cache_len(), 0);
    }

    #[test]
    fn concurrent_first_registration() {
        use std::thread;

        let router = Arc::new(Router::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let router = Arc::clone(&router);
                thread::spawn(move || {
                    router
                        .insert(Method::PATCH, &format!("/r/{}", i), text("r"))
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(router.route_count(&Method::PATCH), 8);
        assert_eq!(router.trees.read().len(), 1);
    }

    #[test]
    fn allowed_lists_registered_methods() {
        let router = Router::default()
            .get("/a", text("a"))
            .post("/b", text("b"));

        assert_eq!(router.allowed("/a"), vec!["GET", "OPTIONS"]);
        assert_eq!(router.allowed("*"), vec!["GET", "POST", "OPTIONS"]);
        assert!(router.allowed("/c").is_empty());
    }
}
