//! Command manager: owns the namespace roots and dispatches command lines.

use std::any::Any;
use std::collections::HashSet;

use crate::config::{DEFAULT_PREFIX, DispatcherConfig};
use crate::decoder::DecodeError;
use crate::error::DispatchError;
use crate::node::{self, Arguments, CommandNode, NodeKind, Usage};
use crate::source::CommandSource;

/// A named root subtree.
#[derive(Debug)]
struct Namespace {
    name: String,
    root: CommandNode,
}

/// Dispatches `<prefix><token>( <token>)*` lines across namespaces.
///
/// Namespaces are tried in registration order; the first whose root consumes
/// the line wins.
#[derive(Debug)]
pub struct CommandManager {
    prefix: String,
    namespaces: Vec<Namespace>,
}

impl CommandManager {
    /// A manager using the default `/` prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespaces: Vec::new(),
        }
    }

    pub fn with_config(config: &DispatcherConfig) -> Self {
        Self::with_prefix(config.prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Shorthand for [`node::literal`].
    pub fn literal(name: impl Into<String>) -> CommandNode {
        node::literal(name)
    }

    /// Shorthand for [`node::argument`].
    pub fn argument<T, D>(name: impl Into<String>, decoder: D) -> CommandNode
    where
        T: Any + Send + Sync,
        D: Fn(&str) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        node::argument(name, decoder)
    }

    /// Attach `node` under `namespace`, creating the namespace on first use.
    pub fn register(&mut self, namespace: impl Into<String>, node: CommandNode) {
        let namespace = namespace.into();
        let index = match self.namespaces.iter().position(|ns| ns.name == namespace) {
            Some(index) => index,
            None => {
                tracing::debug!(namespace = %namespace, "creating namespace");
                self.namespaces.push(Namespace {
                    name: namespace.clone(),
                    root: CommandNode::namespace(),
                });
                self.namespaces.len() - 1
            }
        };
        let root = &mut self.namespaces[index].root;

        if let NodeKind::Literal { name } = node.kind()
            && root.children().iter().any(|c| c.name() == Some(name.as_str()))
        {
            tracing::warn!(
                namespace = %namespace,
                literal = %name,
                "literal already registered; the earlier registration shadows it"
            );
        }
        root.attach(node);
    }

    /// Drop a namespace and everything registered under it.
    ///
    /// Returns `false` if no such namespace existed.
    pub fn remove(&mut self, namespace: &str) -> bool {
        let before = self.namespaces.len();
        self.namespaces.retain(|ns| ns.name != namespace);
        let removed = self.namespaces.len() != before;
        if removed {
            tracing::debug!(namespace, "removed namespace");
        }
        removed
    }

    /// Namespace names in registration order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|ns| ns.name.as_str())
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.name == namespace)
    }

    /// The root container of `namespace`.
    pub fn root(&self, namespace: &str) -> Option<&CommandNode> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == namespace)
            .map(|ns| &ns.root)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Split the body of a prefixed line into tokens.
    fn tokenize<'a>(&self, line: &'a str) -> Option<Vec<&'a str>> {
        line.strip_prefix(self.prefix.as_str())
            .map(|body| body.split(' ').collect())
    }

    /// Run `line` on behalf of `source`.
    ///
    /// Every failure is reported through [`CommandSource::fail`]. Returns
    /// whether a handler ran.
    pub fn execute(&self, source: &mut dyn CommandSource, line: &str) -> bool {
        let Some(mut tokens) = self.tokenize(line) else {
            let error = DispatchError::PrefixMismatch {
                prefix: self.prefix.clone(),
            };
            tracing::debug!(source = source.name(), kind = error.kind(), line, "{error}");
            source.fail(&error.to_string());
            return false;
        };
        tokens.reverse();

        for ns in &self.namespaces {
            tracing::debug!(source = source.name(), namespace = %ns.name, line, "dispatching");
            let mut stack = tokens.clone();
            if ns.root.parse(&mut stack, source, Arguments::new()) {
                return true;
            }
        }

        let error = DispatchError::NoNamespaceMatched;
        tracing::debug!(source = source.name(), kind = error.kind(), line, "{error}");
        source.fail(&error.to_string());
        false
    }

    /// Every executable path across all namespaces, prefixed, with the
    /// permissions each one needs, in registration order.
    ///
    /// A path reachable from several namespaces is listed once per namespace,
    /// since each entry may be gated differently.
    pub fn usage_index(&self) -> Vec<Usage> {
        let mut usages = Vec::new();
        for ns in &self.namespaces {
            ns.root
                .collect_usages(&mut Vec::new(), &mut Vec::new(), &mut usages);
        }

        usages
            .into_iter()
            .map(|usage| Usage {
                path: format!("{}{}", self.prefix, usage.path),
                ..usage
            })
            .collect()
    }

    /// Every command `source` may run, as `<prefix><path>` strings.
    pub fn usages(&self, source: &dyn CommandSource) -> Vec<String> {
        visible_paths(&self.usage_index(), source)
    }

    /// Candidates for the last token of a partially typed line.
    ///
    /// Literal names starting with the last token are returned verbatim,
    /// argument slots as `<name>`. Nothing is executed or reported.
    pub fn complete(&self, source: &dyn CommandSource, partial: &str) -> Vec<String> {
        let Some(tokens) = self.tokenize(partial) else {
            return Vec::new();
        };
        let Some((last, consumed)) = tokens.split_last() else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for ns in &self.namespaces {
            ns.root.complete(consumed, last, source, &mut candidates);
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.clone()));
        candidates
    }
}

/// Paths in `usages` that `source` may run, first occurrence kept.
///
/// Permissions are checked before deduplicating: a path gated in one
/// namespace can still be runnable through a later one.
pub fn visible_paths(usages: &[Usage], source: &dyn CommandSource) -> Vec<String> {
    let mut seen = HashSet::new();
    usages
        .iter()
        .filter(|usage| usage.visible_to(source))
        .filter(|usage| seen.insert(usage.path.as_str()))
        .map(|usage| usage.path.clone())
        .collect()
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}
