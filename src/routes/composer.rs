//! RouteComposer: turns a [`RouteNode`] tree into one `axum::Router`.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use axum::Router;
use tracing::debug;

use super::handler::RouteHandler;
use super::node::RouteNode;
use super::CompositionError;
use crate::providers::ProviderSet;

/// One mounted handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Absolute prefix, `/` for the root.
    pub prefix: String,
    pub handler: String,
}

/// The composed application: every mount, plus the router serving them.
#[derive(Debug)]
pub struct ComposedRoutes {
    mounts: Vec<Mount>,
    router: Router,
}

impl ComposedRoutes {
    /// Mounts in composition (depth-first) order.
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Depth-first walker over the route namespace.
pub struct RouteComposer<'a> {
    providers: &'a ProviderSet,
    mounted: HashSet<String>,
    mounts: Vec<Mount>,
    router: Router,
}

impl<'a> RouteComposer<'a> {
    /// Inject and mount every handler under `root`.
    ///
    /// The top-level group is unnamed; nested groups and leaves must carry a
    /// valid path segment. Any error aborts composition.
    pub fn compose(
        root: RouteNode,
        providers: &'a ProviderSet,
    ) -> Result<ComposedRoutes, CompositionError> {
        let mut composer = RouteComposer {
            providers,
            mounted: HashSet::new(),
            mounts: Vec::new(),
            router: Router::new(),
        };

        match root {
            RouteNode::Group { name, children } if name.is_empty() => {
                composer.visit_group("", children)?;
            }
            node => {
                composer.visit(node, "")?;
            }
        }

        Ok(ComposedRoutes {
            mounts: composer.mounts,
            router: composer.router,
        })
    }

    fn visit(&mut self, node: RouteNode, parent: &str) -> Result<(), CompositionError> {
        match node {
            RouteNode::Group { name, children } => {
                let prefix = join(parent, &name)?;
                self.visit_group(&prefix, children)
            }
            RouteNode::Index(handler) => self.mount(parent, handler),
            RouteNode::Leaf { name, handler } => {
                let prefix = join(parent, &name)?;
                self.mount(&prefix, handler)
            }
        }
    }

    fn visit_group(&mut self, prefix: &str, children: Vec<RouteNode>) -> Result<(), CompositionError> {
        let before = self.mounts.len();
        let mut segments = HashSet::new();

        for child in children {
            if let RouteNode::Group { name, .. } | RouteNode::Leaf { name, .. } = &child {
                if !segments.insert(name.clone()) {
                    return Err(CompositionError::DuplicatePrefix(format!("{prefix}/{name}")));
                }
            }
            self.visit(child, prefix)?;
        }

        if self.mounts.len() == before {
            return Err(CompositionError::EmptyGroup(display_prefix(prefix)));
        }
        Ok(())
    }

    fn mount(&mut self, prefix: &str, mut handler: Box<dyn RouteHandler>) -> Result<(), CompositionError> {
        let path = display_prefix(prefix);
        if !self.mounted.insert(path.clone()) {
            return Err(CompositionError::DuplicatePrefix(path));
        }

        handler.inject(self.providers)?;
        let routes = handler.router()?;

        // axum refuses to nest at the root path, and panics when two
        // handlers register the same method on the same full path.
        let base = self.router.clone();
        let merged = panic::catch_unwind(AssertUnwindSafe(|| {
            if path == "/" {
                base.merge(routes)
            } else {
                base.nest(&path, routes)
            }
        }))
        .map_err(|payload| CompositionError::RouteConflict {
            prefix: path.clone(),
            handler: handler.name().to_string(),
            reason: panic_message(payload.as_ref()),
        })?;
        self.router = merged;

        debug!("Mounted route handler '{}' at {}", handler.name(), path);
        self.mounts.push(Mount {
            prefix: path,
            handler: handler.name().to_string(),
        });
        Ok(())
    }
}

fn join(parent: &str, segment: &str) -> Result<String, CompositionError> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(CompositionError::InvalidSegment {
            segment: segment.to_string(),
            parent: display_prefix(parent),
        });
    }
    Ok(format!("{parent}/{segment}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "conflicting route registration".to_string()
    }
}

fn display_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::providers::CapabilityProvider;
    use crate::routes::Injected;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use std::any::Any;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Palette {
        favourite: &'static str,
    }

    #[async_trait]
    impl CapabilityProvider for Palette {
        fn name(&self) -> &str {
            "palette"
        }

        async fn initialize(&mut self) -> Result<(), RuntimeError> {
            Ok(())
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    /// Answers `GET /` with the palette's favourite colour.
    struct Colors {
        palette: Injected<Palette>,
    }

    impl Colors {
        fn new() -> Self {
            Self {
                palette: Injected::new("colors"),
            }
        }
    }

    impl RouteHandler for Colors {
        fn name(&self) -> &str {
            "colors"
        }

        fn inject(&mut self, providers: &ProviderSet) -> Result<(), CompositionError> {
            self.palette.inject(providers)
        }

        fn router(&self) -> Result<Router, CompositionError> {
            let palette = self.palette.get()?;
            Ok(Router::new().route("/", get(move || async move { palette.favourite })))
        }
    }

    /// Needs no provider.
    struct Static(&'static str);

    impl RouteHandler for Static {
        fn name(&self) -> &str {
            self.0
        }

        fn inject(&mut self, _providers: &ProviderSet) -> Result<(), CompositionError> {
            Ok(())
        }

        fn router(&self) -> Result<Router, CompositionError> {
            let body = self.0;
            Ok(Router::new().route("/", get(move || async move { body })))
        }
    }

    /// Serves a fixed sub-path below its mount prefix.
    struct SubPath {
        name: &'static str,
        path: &'static str,
    }

    impl RouteHandler for SubPath {
        fn name(&self) -> &str {
            self.name
        }

        fn inject(&mut self, _providers: &ProviderSet) -> Result<(), CompositionError> {
            Ok(())
        }

        fn router(&self) -> Result<Router, CompositionError> {
            let body = self.name;
            Ok(Router::new().route(self.path, get(move || async move { body })))
        }
    }

    fn providers() -> ProviderSet {
        ProviderSet::new(vec![Arc::new(Palette { favourite: "teal" })])
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_nested_group_index_mounts_at_group_prefix() {
        let providers = providers();
        let root = RouteNode::root(vec![RouteNode::group(
            "widgets",
            vec![RouteNode::group("colors", vec![RouteNode::index(Colors::new())])],
        )]);

        let composed = RouteComposer::compose(root, &providers).unwrap();
        assert_eq!(
            composed.mounts(),
            &[Mount {
                prefix: "/widgets/colors".to_string(),
                handler: "colors".to_string(),
            }]
        );

        let (status, body) = get_body(composed.into_router(), "/widgets/colors").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "teal");
    }

    #[tokio::test]
    async fn test_root_index_and_leaves() {
        let providers = providers();
        let root = RouteNode::root(vec![
            RouteNode::index(Static("index")),
            RouteNode::leaf("health", Static("health")),
            RouteNode::group("widgets", vec![RouteNode::leaf("colors", Colors::new())]),
        ]);

        let composed = RouteComposer::compose(root, &providers).unwrap();
        let prefixes: Vec<&str> = composed.mounts().iter().map(|m| m.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["/", "/health", "/widgets/colors"]);

        let router = composed.into_router();
        assert_eq!(get_body(router.clone(), "/").await.1, "index");
        assert_eq!(get_body(router.clone(), "/health").await.1, "health");
        assert_eq!(get_body(router.clone(), "/widgets/colors").await.1, "teal");
        assert_eq!(
            get_body(router, "/widgets").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_missing_capability_aborts_before_mount() {
        let root = RouteNode::root(vec![RouteNode::leaf("colors", Colors::new())]);

        let err = RouteComposer::compose(root, &ProviderSet::default()).unwrap_err();
        assert!(matches!(err, CompositionError::MissingCapability { ref handler, .. } if handler == "colors"));
    }

    #[test]
    fn test_router_before_injection_is_rejected() {
        let handler = Colors::new();
        assert_eq!(
            handler.router().err(),
            Some(CompositionError::NotInjected("colors".to_string()))
        );
    }

    #[test]
    fn test_duplicate_sibling_prefix() {
        let root = RouteNode::root(vec![
            RouteNode::leaf("health", Static("a")),
            RouteNode::leaf("health", Static("b")),
        ]);

        let err = RouteComposer::compose(root, &providers()).unwrap_err();
        assert_eq!(err, CompositionError::DuplicatePrefix("/health".to_string()));
    }

    #[test]
    fn test_two_indexes_in_one_group() {
        let root = RouteNode::root(vec![RouteNode::group(
            "widgets",
            vec![RouteNode::index(Static("a")), RouteNode::index(Static("b"))],
        )]);

        let err = RouteComposer::compose(root, &providers()).unwrap_err();
        assert_eq!(err, CompositionError::DuplicatePrefix("/widgets".to_string()));
    }

    #[test]
    fn test_empty_group() {
        let root = RouteNode::root(vec![
            RouteNode::leaf("health", Static("health")),
            RouteNode::group("widgets", vec![]),
        ]);

        let err = RouteComposer::compose(root, &providers()).unwrap_err();
        assert_eq!(err, CompositionError::EmptyGroup("/widgets".to_string()));
    }

    #[test]
    fn test_invalid_segments() {
        for segment in ["", "a/b", ":id", "*rest", "spa ce"] {
            let root = RouteNode::root(vec![RouteNode::leaf(segment, Static("x"))]);
            let err = RouteComposer::compose(root, &providers()).unwrap_err();
            assert!(
                matches!(err, CompositionError::InvalidSegment { .. }),
                "{segment:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_overlapping_routes_from_different_handlers() {
        let root = RouteNode::root(vec![RouteNode::group(
            "a",
            vec![
                RouteNode::index(SubPath {
                    name: "outer",
                    path: "/b",
                }),
                RouteNode::leaf(
                    "b",
                    SubPath {
                        name: "inner",
                        path: "/",
                    },
                ),
            ],
        )]);

        let err = RouteComposer::compose(root, &providers()).unwrap_err();
        match err {
            CompositionError::RouteConflict {
                prefix, handler, ..
            } => {
                assert_eq!(prefix, "/a/b");
                assert_eq!(handler, "inner");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
