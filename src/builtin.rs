//! Built-in commands registered by the console front-end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::decoder;
use crate::error::ArgumentError;
use crate::manager::{CommandManager, visible_paths};
use crate::node::Usage;
use crate::source::CommandSource;

pub const BUILTIN_NAMESPACE: &str = "builtin";
pub const UTIL_NAMESPACE: &str = "util";
/// Required by `/stop`.
pub const ADMIN_PERMISSION: &str = "cmdtree.admin";

/// State shared between the console loop and the built-in handlers.
#[derive(Debug, Default)]
pub struct Session {
    stopped: AtomicBool,
    debug: AtomicBool,
    usages: OnceLock<Vec<Usage>>,
}

impl Session {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Set once `/stop` ran.
    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Set by `/debug true`; the console then echoes how each line was
    /// handled.
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Freeze the usage index listed by `/help`. Later calls are ignored.
    pub fn publish_usages(&self, usages: Vec<Usage>) {
        if self.usages.set(usages).is_err() {
            tracing::warn!("usage index already published");
        }
    }
}

/// Report a handler whose arguments do not match the decoders above it.
fn wiring_error(source: &mut dyn CommandSource, error: ArgumentError) {
    tracing::error!(error = %error, "command handler received unexpected arguments");
    source.fail(&error.to_string());
}

/// Register the `builtin` and `util` namespaces, in that order.
pub fn register(manager: &mut CommandManager, session: Arc<Session>) {
    let help_session = Arc::clone(&session);
    manager.register(
        BUILTIN_NAMESPACE,
        CommandManager::literal("help").execute(move |source, _| {
            let usages = help_session.usages.get().map(Vec::as_slice).unwrap_or_default();
            for path in visible_paths(usages, &*source) {
                source.success(&path);
            }
        }),
    );

    manager.register(
        BUILTIN_NAMESPACE,
        CommandManager::literal("echo").then(
            CommandManager::argument("text", decoder::STRING).execute(|source, args| {
                match args.try_get::<String>(0) {
                    Ok(text) => source.success(text),
                    Err(e) => wiring_error(source, e),
                }
            }),
        ),
    );

    manager.register(
        BUILTIN_NAMESPACE,
        CommandManager::literal("tp").then(
            CommandManager::argument("x", decoder::NUMBER).then(
                CommandManager::argument("y", decoder::NUMBER).execute(|source, args| {
                    let (x, y) = match (args.try_get::<f64>(0), args.try_get::<f64>(1)) {
                        (Ok(x), Ok(y)) => (*x, *y),
                        (Err(e), _) | (_, Err(e)) => return wiring_error(source, e),
                    };
                    let name = source.name().to_string();
                    source.success(&format!("Teleported {name} to {x} {y}"));
                }),
            ),
        ),
    );

    let debug_session = Arc::clone(&session);
    manager.register(
        BUILTIN_NAMESPACE,
        CommandManager::literal("debug").then(
            CommandManager::argument("enabled", decoder::BOOLEAN).execute(move |source, args| {
                let enabled = match args.try_get::<bool>(0) {
                    Ok(enabled) => *enabled,
                    Err(e) => return wiring_error(source, e),
                };
                debug_session.debug.store(enabled, Ordering::Relaxed);
                let state = if enabled { "enabled" } else { "disabled" };
                source.success(&format!("Debug mode {state}"));
            }),
        ),
    );

    manager.register(
        BUILTIN_NAMESPACE,
        CommandManager::literal("stop")
            .require(ADMIN_PERMISSION)
            .execute(move |source, _| {
                session.stopped.store(true, Ordering::Relaxed);
                source.success("Stopping");
            }),
    );

    manager.register(
        UTIL_NAMESPACE,
        CommandManager::literal("ping").execute(|source, _| source.success("Pong")),
    );
    manager.register(
        UTIL_NAMESPACE,
        CommandManager::literal("add").then(
            CommandManager::argument("a", decoder::NUMBER).then(
                CommandManager::argument("b", decoder::NUMBER).execute(|source, args| {
                    match (args.try_get::<f64>(0), args.try_get::<f64>(1)) {
                        (Ok(a), Ok(b)) => source.success(&(a + b).to_string()),
                        (Err(e), _) | (_, Err(e)) => wiring_error(source, e),
                    }
                }),
            ),
        ),
    );
}
