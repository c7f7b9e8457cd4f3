//! The command source contract and a terminal implementation.

use std::collections::HashSet;
use std::io::Write;

use colored::Colorize;

/// The actor invoking a command.
///
/// The dispatcher reports every failure through [`fail`](Self::fail) and never
/// calls [`success`](Self::success) itself; that is left to handlers.
pub trait CommandSource {
    /// Positive feedback, sent by handlers.
    fn success(&mut self, message: &str);

    /// Negative feedback, sent by the dispatcher or by handlers.
    fn fail(&mut self, message: &str);

    /// Display name of the source.
    fn name(&self) -> &str;

    /// Whether the source holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}

/// Permission that grants every other permission to a [`ConsoleSource`].
pub const WILDCARD_PERMISSION: &str = "*";

/// A [`CommandSource`] writing feedback to a pair of streams.
///
/// Success goes to `out` in green, failures to `err` in red.
pub struct ConsoleSource<O: Write, E: Write> {
    name: String,
    permissions: HashSet<String>,
    out: O,
    err: E,
}

impl<O: Write, E: Write> ConsoleSource<O, E> {
    pub fn new(name: impl Into<String>, out: O, err: E) -> Self {
        Self {
            name: name.into(),
            permissions: HashSet::new(),
            out,
            err,
        }
    }

    /// Grant a permission. `*` grants everything.
    pub fn grant(&mut self, permission: impl Into<String>) -> &mut Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Grant every permission in `permissions`.
    pub fn grant_all<I, S>(&mut self, permissions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for permission in permissions {
            self.grant(permission);
        }
        self
    }

    /// Uncoloured diagnostic line on the output stream.
    pub fn note(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{message}") {
            tracing::warn!(error = %e, "failed to write note");
        }
    }

    /// Consume the source and hand back its streams.
    pub fn into_streams(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> CommandSource for ConsoleSource<O, E> {
    fn success(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{}", message.green()) {
            tracing::warn!(error = %e, "failed to write success message");
        }
    }

    fn fail(&mut self, message: &str) {
        if let Err(e) = writeln!(self.err, "{}", message.red()) {
            tracing::warn!(error = %e, "failed to write failure message");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(WILDCARD_PERMISSION) || self.permissions.contains(permission)
    }
}
