//! Integration test: end-to-end dispatch scenarios
//!
//! Drives a `CommandManager` through the public API with a recording source
//! and checks handler invocation, argument decoding and failure reporting.

use std::sync::{Arc, Mutex};

use cmdtree::{Arguments, CommandManager, CommandSource, DecodeError, decoder};

#[derive(Default)]
struct RecordingSource {
    permissions: Vec<String>,
    successes: Vec<String>,
    failures: Vec<String>,
}

impl RecordingSource {
    fn with_permission(permission: &str) -> Self {
        Self {
            permissions: vec![permission.to_string()],
            ..Default::default()
        }
    }
}

impl CommandSource for RecordingSource {
    fn success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }

    fn fail(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }

    fn name(&self) -> &str {
        "tester"
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

type Calls = Arc<Mutex<Vec<(String, Vec<f64>)>>>;

/// `tp <x:NUMBER> <y:NUMBER>` recording every invocation.
fn tp_manager() -> (CommandManager, Calls) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);

    let mut manager = CommandManager::new();
    manager.register(
        "game",
        CommandManager::literal("tp").then(
            CommandManager::argument("x", decoder::NUMBER).then(
                CommandManager::argument("y", decoder::NUMBER).execute(
                    move |source: &mut dyn CommandSource, args: &Arguments| {
                        let x = *args.get::<f64>(0).unwrap();
                        let y = *args.get::<f64>(1).unwrap();
                        sink.lock().unwrap().push((source.name().to_string(), vec![x, y]));
                    },
                ),
            ),
        ),
    );
    (manager, calls)
}

#[test]
fn test_tp_invokes_handler_with_decoded_numbers() {
    let (manager, calls) = tp_manager();
    let mut source = RecordingSource::default();

    assert!(manager.execute(&mut source, "/tp 10 20"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![("tester".to_string(), vec![10.0, 20.0])]
    );
    assert!(source.failures.is_empty());
    assert!(source.successes.is_empty());
}

#[test]
fn test_tp_rejects_malformed_number() {
    let (manager, calls) = tp_manager();
    let mut source = RecordingSource::default();

    assert!(!manager.execute(&mut source, "/tp foo 20"));
    assert_eq!(source.failures.first().map(String::as_str), Some("Invalid number foo"));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_tp_missing_argument_is_invalid_command() {
    let (manager, calls) = tp_manager();
    let mut source = RecordingSource::default();

    assert!(!manager.execute(&mut source, "/tp 10"));
    assert!(!source.failures.is_empty());
    assert!(source.failures.iter().all(|f| f == "Invalid command"));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_literal_without_arguments() {
    let mut manager = CommandManager::new();
    manager.register(
        "core",
        CommandManager::literal("foo").execute(|source, args| {
            assert!(args.is_empty());
            source.success("foo");
        }),
    );

    let mut source = RecordingSource::default();
    assert!(manager.execute(&mut source, "/foo"));
    assert_eq!(source.successes, vec!["foo"]);
}

#[test]
fn test_literal_sibling_beats_argument_in_any_registration_order() {
    for literal_first in [true, false] {
        let literal = CommandManager::literal("a").execute(|s, _| s.success("literal"));
        let any = CommandManager::argument("any", decoder::STRING).execute(|s, _| s.success("argument"));
        let root = if literal_first {
            CommandManager::literal("run").then(literal).then(any)
        } else {
            CommandManager::literal("run").then(any).then(literal)
        };

        let mut manager = CommandManager::new();
        manager.register("core", root);

        let mut source = RecordingSource::default();
        assert!(manager.execute(&mut source, "/run a"));
        assert!(manager.execute(&mut source, "/run b"));
        assert_eq!(source.successes, vec!["literal", "argument"]);
    }
}

#[test]
fn test_permission_gate_blocks_fully_matching_input() {
    let mut manager = CommandManager::new();
    manager.register(
        "core",
        CommandManager::literal("ban").require("admin").then(
            CommandManager::argument("player", decoder::STRING)
                .execute(|s, _| s.success("banned")),
        ),
    );

    let mut source = RecordingSource::default();
    assert!(!manager.execute(&mut source, "/ban steve"));
    assert_eq!(source.failures.first().map(String::as_str), Some("Permission denied"));
    assert!(source.successes.is_empty());

    let mut admin = RecordingSource::with_permission("admin");
    assert!(manager.execute(&mut admin, "/ban steve"));
    assert_eq!(admin.successes, vec!["banned"]);
}

#[test]
fn test_first_registered_namespace_wins_until_removed() {
    let mut manager = CommandManager::new();
    manager.register("a", CommandManager::literal("ping").execute(|s, _| s.success("a")));
    manager.register("b", CommandManager::literal("ping").execute(|s, _| s.success("b")));

    let mut source = RecordingSource::default();
    assert!(manager.execute(&mut source, "/ping"));
    assert_eq!(source.successes, vec!["a"]);

    assert!(manager.remove("a"));
    assert!(manager.execute(&mut source, "/ping"));
    assert_eq!(source.successes, vec!["a", "b"]);
}

#[test]
fn test_permission_denied_falls_through_to_next_namespace() {
    let mut manager = CommandManager::new();
    manager.register(
        "secure",
        CommandManager::literal("status")
            .require("ops")
            .execute(|s, _| s.success("secure")),
    );
    manager.register(
        "public",
        CommandManager::literal("status").execute(|s, _| s.success("public")),
    );

    let mut source = RecordingSource::default();
    assert!(manager.execute(&mut source, "/status"));
    assert_eq!(source.failures, vec!["Permission denied"]);
    assert_eq!(source.successes, vec!["public"]);
}

#[test]
fn test_custom_decoder() {
    #[derive(Debug, PartialEq)]
    enum Mode {
        Survival,
        Creative,
    }

    fn mode(token: &str) -> Result<Mode, DecodeError> {
        match token {
            "survival" => Ok(Mode::Survival),
            "creative" => Ok(Mode::Creative),
            _ => Err(DecodeError::new(format!("Unknown game mode {token}"), token)),
        }
    }

    let mut manager = CommandManager::new();
    manager.register(
        "core",
        CommandManager::literal("gamemode").then(CommandManager::argument("mode", mode).execute(
            |source, args| {
                let creative = args.get::<Mode>(0) == Some(&Mode::Creative);
                source.success(if creative { "creative" } else { "survival" });
            },
        )),
    );

    let mut source = RecordingSource::default();
    assert!(manager.execute(&mut source, "/gamemode creative"));
    assert!(!manager.execute(&mut source, "/gamemode hardcore"));
    assert_eq!(source.successes, vec!["creative"]);
    assert_eq!(
        source.failures.first().map(String::as_str),
        Some("Unknown game mode hardcore")
    );
}

#[test]
fn test_repeated_spaces_produce_empty_tokens() {
    let (manager, calls) = tp_manager();
    let mut source = RecordingSource::default();

    assert!(!manager.execute(&mut source, "/tp  10 20"));
    assert_eq!(source.failures.first().map(String::as_str), Some("Invalid number "));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_manager_is_shareable_behind_rwlock() {
    let (manager, calls) = tp_manager();
    let shared = Arc::new(std::sync::RwLock::new(manager));

    let worker = {
        let shared = Arc::clone(&shared);
        std::thread::spawn(move || {
            let mut source = RecordingSource::default();
            shared.read().unwrap().execute(&mut source, "/tp 1 2")
        })
    };
    assert!(worker.join().unwrap());

    shared.write().unwrap().remove("game");
    let mut source = RecordingSource::default();
    assert!(!shared.read().unwrap().execute(&mut source, "/tp 1 2"));
    assert_eq!(calls.lock().unwrap().len(), 1);
}
