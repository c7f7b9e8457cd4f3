//! Command tree nodes and the recursive descent parser.
//!
//! A tree is built with [`literal`] and [`argument`], composed with
//! [`CommandNode::then`], gated with [`CommandNode::require`] and terminated
//! with [`CommandNode::execute`]:
//!
//! ```
//! use cmdtree::{decoder, node::{argument, literal}};
//!
//! let tp = literal("tp").then(
//!     argument("x", decoder::NUMBER).then(
//!         argument("y", decoder::NUMBER).execute(|source, args| {
//!             match (args.try_get::<f64>(0), args.try_get::<f64>(1)) {
//!                 (Ok(x), Ok(y)) => source.success(&format!("teleported to {x} {y}")),
//!                 (Err(e), _) | (_, Err(e)) => source.fail(&e.to_string()),
//!             }
//!         }),
//!     ),
//! );
//! assert_eq!(tp.usages(), vec!["tp <x> <y>".to_string()]);
//! ```

use std::any::Any;
use std::fmt;

use crate::decoder::DecodeError;
use crate::error::{ArgumentError, DispatchError};
use crate::source::CommandSource;

/// Terminal handler of a node.
pub type Handler = Box<dyn Fn(&mut dyn CommandSource, &Arguments) + Send + Sync>;

/// A decoded argument value with its type erased.
pub type ErasedValue = Box<dyn Any + Send + Sync>;
/// A decoder with its output type erased.
pub type ErasedDecoder = Box<dyn Fn(&str) -> Result<ErasedValue, DecodeError> + Send + Sync>;

/// Typed values decoded along a parse path, in left-to-right token order.
#[derive(Default)]
pub struct Arguments {
    values: Vec<ErasedValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value at `index` if it exists and was decoded as a `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Like [`get`](Self::get), but says why the value is unavailable.
    pub fn try_get<T: Any>(&self, index: usize) -> Result<&T, ArgumentError> {
        self.values
            .get(index)
            .ok_or(ArgumentError::Missing { index })?
            .downcast_ref::<T>()
            .ok_or(ArgumentError::TypeMismatch {
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push_erased(&mut self, value: ErasedValue) {
        self.values.push(value);
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}

/// What a node matches.
pub enum NodeKind {
    /// Container root of a namespace; never matched against a token.
    Namespace,
    /// Matches a token equal to `name`.
    Literal { name: String },
    /// Matches any token the decoder accepts.
    Argument { name: String, decoder: ErasedDecoder },
}

impl NodeKind {
    /// Literals sort before arguments; namespaces never appear as children.
    fn sort_rank(&self) -> u8 {
        match self {
            NodeKind::Literal { .. } => 0,
            NodeKind::Argument { .. } => 1,
            NodeKind::Namespace => 2,
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Namespace => f.write_str("Namespace"),
            NodeKind::Literal { name } => f.debug_struct("Literal").field("name", name).finish(),
            NodeKind::Argument { name, .. } => {
                f.debug_struct("Argument").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// A node in a command tree. Each node owns its children.
pub struct CommandNode {
    kind: NodeKind,
    children: Vec<CommandNode>,
    handler: Option<Handler>,
    permission: Option<String>,
}

/// A node matching exactly `name` (case-sensitive).
pub fn literal(name: impl Into<String>) -> CommandNode {
    CommandNode::new(NodeKind::Literal { name: name.into() })
}

/// A node matching any token `decoder` accepts; the decoded value is appended
/// to the handler's [`Arguments`].
pub fn argument<T, D>(name: impl Into<String>, decoder: D) -> CommandNode
where
    T: Any + Send + Sync,
    D: Fn(&str) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    let decoder: ErasedDecoder =
        Box::new(move |token| decoder(token).map(|value| Box::new(value) as ErasedValue));
    CommandNode::new(NodeKind::Argument {
        name: name.into(),
        decoder,
    })
}

impl CommandNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            handler: None,
            permission: None,
        }
    }

    /// An empty namespace container.
    pub fn namespace() -> Self {
        Self::new(NodeKind::Namespace)
    }

    /// Attach a child. Literal children are kept ahead of argument children;
    /// insertion order is otherwise preserved.
    pub fn then(mut self, child: CommandNode) -> Self {
        self.attach(child);
        self
    }

    pub(crate) fn attach(&mut self, child: CommandNode) {
        self.children.push(child);
        self.children.sort_by_key(|c| c.kind.sort_rank());
    }

    /// Set the handler that fires when the token stream ends at this node.
    pub fn execute<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut dyn CommandSource, &Arguments) + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Require `permission` before this node can be entered.
    pub fn require(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Literal or argument name; `None` for namespace roots.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Namespace => None,
            NodeKind::Literal { name } | NodeKind::Argument { name, .. } => Some(name),
        }
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Whether `source` may enter this node.
    pub fn can_use(&self, source: &dyn CommandSource) -> bool {
        self.permission
            .as_deref()
            .is_none_or(|permission| source.has_permission(permission))
    }

    /// Recursive descent over `tokens`, a reversed token list popped from the
    /// end.
    ///
    /// Returns `true` once a handler ran. Every failure is reported to
    /// `source` at the point it happens, except a token that no child
    /// matched, which is left for the caller to report.
    pub fn parse(
        &self,
        tokens: &mut Vec<&str>,
        source: &mut dyn CommandSource,
        mut args: Arguments,
    ) -> bool {
        if let Some(permission) = &self.permission
            && !source.has_permission(permission)
        {
            return report(
                source,
                DispatchError::PermissionDenied {
                    permission: permission.clone(),
                },
            );
        }

        let Some(token) = tokens.pop() else {
            return match &self.handler {
                Some(handler) => {
                    tracing::debug!(
                        source = source.name(),
                        node = self.name().unwrap_or("<root>"),
                        args = args.len(),
                        "invoking command handler"
                    );
                    handler(source, &args);
                    true
                }
                None => report(source, DispatchError::DeadEnd),
            };
        };

        if self.children.is_empty() {
            return report(source, DispatchError::DeadEnd);
        }

        for child in &self.children {
            match &child.kind {
                NodeKind::Literal { name } => {
                    if name == token {
                        tracing::trace!(token, "matched literal");
                        return child.parse(tokens, source, args);
                    }
                }
                NodeKind::Argument { name, decoder } => match decoder(token) {
                    Ok(value) => {
                        tracing::trace!(token, argument = %name, "decoded argument");
                        args.push_erased(value);
                        return child.parse(tokens, source, args);
                    }
                    Err(e) => return report(source, e.into()),
                },
                NodeKind::Namespace => {}
            }
        }

        tracing::trace!(token, "no child matched");
        false
    }

    /// Every executable path below this node, rendered as space separated
    /// segments. This node's own name is the first segment.
    pub fn usages(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_usages(&mut Vec::new(), &mut Vec::new(), &mut out);
        out.into_iter().map(|usage| usage.path).collect()
    }

    pub(crate) fn collect_usages(
        &self,
        path: &mut Vec<String>,
        permissions: &mut Vec<String>,
        out: &mut Vec<Usage>,
    ) {
        let segment = self.usage_segment();
        if let Some(segment) = &segment {
            path.push(segment.clone());
        }
        if let Some(permission) = &self.permission {
            permissions.push(permission.clone());
        }

        if self.handler.is_some() && !path.is_empty() {
            out.push(Usage {
                path: path.join(" "),
                permissions: permissions.clone(),
            });
        }
        for child in &self.children {
            child.collect_usages(path, permissions, out);
        }

        if self.permission.is_some() {
            permissions.pop();
        }
        if segment.is_some() {
            path.pop();
        }
    }

    /// How this node appears in usage and completion output.
    pub fn usage_segment(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Namespace => None,
            NodeKind::Literal { name } => Some(name.clone()),
            NodeKind::Argument { name, .. } => Some(format!("<{name}>")),
        }
    }

    /// Walk `consumed` without running handlers or reporting failures and
    /// append the candidates for `partial` at the node reached.
    pub(crate) fn complete(
        &self,
        consumed: &[&str],
        partial: &str,
        source: &dyn CommandSource,
        out: &mut Vec<String>,
    ) {
        if !self.can_use(source) {
            return;
        }

        let Some((token, rest)) = consumed.split_first() else {
            for child in self.children.iter().filter(|c| c.can_use(source)) {
                match &child.kind {
                    NodeKind::Literal { name } if name.starts_with(partial) => {
                        out.push(name.clone())
                    }
                    NodeKind::Argument { name, .. } => out.push(format!("<{name}>")),
                    _ => {}
                }
            }
            return;
        };

        for child in &self.children {
            match &child.kind {
                NodeKind::Literal { name } if name == token => {
                    return child.complete(rest, partial, source, out);
                }
                NodeKind::Argument { decoder, .. } => {
                    if decoder(token).is_ok() {
                        child.complete(rest, partial, source, out);
                    }
                    return;
                }
                _ => {}
            }
        }
    }
}

/// An executable path and the permissions needed to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub path: String,
    /// Every permission required along the path, outermost first.
    pub permissions: Vec<String>,
}

impl Usage {
    /// Whether `source` holds every permission on the path.
    pub fn visible_to(&self, source: &dyn CommandSource) -> bool {
        self.permissions.iter().all(|p| source.has_permission(p))
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("kind", &self.kind)
            .field("permission", &self.permission)
            .field("has_handler", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Report `error` to `source` and return `false`.
fn report(source: &mut dyn CommandSource, error: DispatchError) -> bool {
    tracing::debug!(source = source.name(), kind = error.kind(), "{error}");
    source.fail(&error.to_string());
    false
}
