//! Command-tree dispatcher for `/command arg1 arg2` style command surfaces.
//!
//! Commands are registered as trees of [literal](node::literal) and typed
//! [argument](node::argument) nodes under named namespaces of a
//! [`CommandManager`]. A command line is split on single spaces and matched
//! by recursive descent; decoded arguments are handed to the handler at the
//! node where the tokens run out.
//!
//! ```
//! use cmdtree::{CommandManager, CommandSource, decoder};
//!
//! struct Player;
//!
//! impl CommandSource for Player {
//!     fn success(&mut self, message: &str) { println!("{message}"); }
//!     fn fail(&mut self, message: &str) { eprintln!("{message}"); }
//!     fn name(&self) -> &str { "player" }
//!     fn has_permission(&self, _permission: &str) -> bool { false }
//! }
//!
//! let mut manager = CommandManager::new();
//! manager.register(
//!     "game",
//!     CommandManager::literal("heal").then(
//!         CommandManager::argument("amount", decoder::NUMBER)
//!             .execute(|source, args| match args.try_get::<f64>(0) {
//!                 Ok(amount) => source.success(&format!("healed {amount}")),
//!                 Err(e) => source.fail(&e.to_string()),
//!             }),
//!     ),
//! );
//!
//! assert!(manager.execute(&mut Player, "/heal 5"));
//! assert!(!manager.execute(&mut Player, "/heal lots"));
//! ```

pub mod builtin;
pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod manager;
pub mod node;
pub mod source;

pub use config::DispatcherConfig;
pub use decoder::DecodeError;
pub use error::{ArgumentError, ConfigError, DispatchError};
pub use manager::CommandManager;
pub use node::{Arguments, CommandNode, NodeKind, Usage, argument, literal};
pub use source::{CommandSource, ConsoleSource};
