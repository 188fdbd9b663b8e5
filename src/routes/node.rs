//! RouteNode: one entry of the route namespace tree.

use std::fmt;

use super::handler::RouteHandler;

pub enum RouteNode {
    /// Contributes `name` as a path segment to everything below it.
    Group {
        name: String,
        children: Vec<RouteNode>,
    },
    /// Entry point of the enclosing group, mounted at the group's prefix.
    Index(Box<dyn RouteHandler>),
    /// Mounted at `prefix/name`.
    Leaf {
        name: String,
        handler: Box<dyn RouteHandler>,
    },
}

impl RouteNode {
    /// The unnamed top-level group.
    pub fn root(children: Vec<RouteNode>) -> Self {
        RouteNode::Group {
            name: String::new(),
            children,
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<RouteNode>) -> Self {
        RouteNode::Group {
            name: name.into(),
            children,
        }
    }

    pub fn index(handler: impl RouteHandler + 'static) -> Self {
        RouteNode::Index(Box::new(handler))
    }

    pub fn leaf(name: impl Into<String>, handler: impl RouteHandler + 'static) -> Self {
        RouteNode::Leaf {
            name: name.into(),
            handler: Box::new(handler),
        }
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteNode::Group { name, children } => f
                .debug_struct("Group")
                .field("name", name)
                .field("children", children)
                .finish(),
            RouteNode::Index(handler) => f.debug_tuple("Index").field(&handler.name()).finish(),
            RouteNode::Leaf { name, handler } => f
                .debug_struct("Leaf")
                .field("name", name)
                .field("handler", &handler.name())
                .finish(),
        }
    }
}
