//! Unit tests for event, request and console dispatch.

use crate::bus::{
    BusError, BusEvent, CommandError, CommandHandler, ConsoleCommand, ConsoleHandler,
    ConsoleMatcher, EventBus, RegistrationBatch,
};
use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[fixture]
fn bus() -> EventBus {
    EventBus::new()
}

struct Reply(&'static str);

#[async_trait]
impl CommandHandler for Reply {
    async fn handle(&self, _bus: &EventBus, _args: Value) -> Result<Value, CommandError> {
        Ok(Value::String(self.0.to_owned()))
    }
}

struct Echo;

#[async_trait]
impl CommandHandler for Echo {
    async fn handle(&self, _bus: &EventBus, args: Value) -> Result<Value, CommandError> {
        Ok(args)
    }
}

struct Failing;

#[async_trait]
impl CommandHandler for Failing {
    async fn handle(&self, _bus: &EventBus, _args: Value) -> Result<Value, CommandError> {
        Err(CommandError::new("nope"))
    }
}

struct Says(&'static str);

#[async_trait]
impl ConsoleHandler for Says {
    async fn process(&self, _bus: &EventBus, _input: &str) -> Result<String, CommandError> {
        Ok(self.0.to_owned())
    }
}

fn recorder(
    log: &Arc<Mutex<Vec<String>>>,
    label: &'static str,
) -> impl Fn(&BusEvent) -> Result<(), CommandError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |event| {
        log.lock()
            .expect("log lock")
            .push(format!("{label}:{}", event.name()));
        Ok(())
    }
}

#[rstest]
fn emit_runs_handlers_in_registration_order(bus: EventBus) {
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.on("ping", recorder(&log, "first")).expect("subscribe");
    bus.on("ping", recorder(&log, "second")).expect("subscribe");

    let delivered = bus.emit("ping", Value::Null);

    assert_eq!(delivered, 2);
    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["first:ping".to_owned(), "second:ping".to_owned()]
    );
}

#[rstest]
fn emit_isolates_failing_and_panicking_handlers(bus: EventBus) {
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.on("ping", |_| Err(CommandError::new("broken")))
        .expect("subscribe");
    bus.on("ping", |_| panic!("handler blew up")).expect("subscribe");
    bus.on("ping", recorder(&log, "last")).expect("subscribe");

    let delivered = bus.emit("ping", json!({"n": 1}));

    assert_eq!(delivered, 1);
    assert_eq!(log.lock().expect("log lock").len(), 1);
}

#[rstest]
fn emit_without_subscribers_delivers_nothing(bus: EventBus) {
    assert_eq!(bus.emit("nobody:listens", Value::Null), 0);
}

#[rstest]
#[tokio::test]
async fn request_reaches_registered_handler(bus: EventBus) {
    bus.set_command_handler("echo", Arc::new(Echo))
        .expect("register");

    let reply = bus.request("echo", json!({"k": "v"})).await;

    assert_eq!(reply, Ok(json!({"k": "v"})));
}

#[rstest]
#[tokio::test]
async fn duplicate_handler_keeps_first_registration(bus: EventBus) {
    bus.set_command_handler("logs:x:enable", Arc::new(Reply("first")))
        .expect("first registration");

    let duplicate = bus.set_command_handler("logs:x:enable", Arc::new(Reply("second")));

    assert_eq!(
        duplicate,
        Err(BusError::DuplicateCommandHandler("logs:x:enable".to_owned()))
    );
    assert_eq!(
        bus.request("logs:x:enable", Value::Null).await,
        Ok(Value::String("first".to_owned()))
    );
}

#[rstest]
#[tokio::test]
async fn request_to_unknown_command_fails(bus: EventBus) {
    let reply = bus.request("missing", Value::Null).await;

    assert_eq!(reply, Err(BusError::UnknownCommand("missing".to_owned())));
    assert!(!bus.has_command_handler("missing"));
}

#[rstest]
#[tokio::test]
async fn handler_failure_surfaces_as_bus_error(bus: EventBus) {
    bus.set_command_handler("fail", Arc::new(Failing))
        .expect("register");

    let reply = bus.request("fail", Value::Null).await;

    assert_eq!(reply, Err(BusError::Handler(CommandError::new("nope"))));
}

#[rstest]
#[tokio::test]
async fn console_uses_first_matching_command(bus: EventBus) {
    bus.register_console_command(ConsoleCommand::new(
        ConsoleMatcher::word("swarm"),
        Arc::new(Says("notice")),
    ))
    .expect("register");
    bus.register_console_command(ConsoleCommand::new(
        ConsoleMatcher::exact(["log swarm on"]),
        Arc::new(Says("toggle")),
    ))
    .expect("register");

    assert_eq!(
        bus.run_console_command("swarm status").await,
        Ok("notice".to_owned())
    );
    assert_eq!(
        bus.run_console_command("log swarm on").await,
        Ok("toggle".to_owned())
    );
}

#[rstest]
#[case("swarm", true)]
#[case("swarm upload", true)]
#[case("swarmy", false)]
#[case("log swarm on", false)]
fn word_matcher_claims_bare_word_and_arguments(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(ConsoleMatcher::word("swarm").matches(input), expected);
}

#[rstest]
#[tokio::test]
async fn console_without_match_reports_input(bus: EventBus) {
    let reply = bus.run_console_command("dance").await;

    assert_eq!(
        reply,
        Err(BusError::NoMatchingConsoleCommand("dance".to_owned()))
    );
}

fn toggle_batch(log: &Arc<Mutex<Vec<String>>>) -> RegistrationBatch {
    RegistrationBatch::new()
        .on("check:backOnline:Swarm", recorder(log, "batch"))
        .command("logs:swarm:enable", Arc::new(Reply("on")))
        .command("logs:swarm:disable", Arc::new(Reply("off")))
        .console(ConsoleCommand::new(
            ConsoleMatcher::exact(["log swarm on"]),
            Arc::new(Says("toggle")),
        ))
}

#[rstest]
#[tokio::test]
async fn committed_batch_is_visible_at_once(bus: EventBus) {
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.commit(toggle_batch(&log)).expect("commit");

    assert_eq!(bus.emit("check:backOnline:Swarm", Value::Null), 1);
    assert_eq!(
        bus.request("logs:swarm:disable", Value::Null).await,
        Ok(Value::String("off".to_owned()))
    );
    assert_eq!(
        bus.run_console_command("log swarm on").await,
        Ok("toggle".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn colliding_batch_leaves_no_partial_registration(bus: EventBus) {
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.set_command_handler("logs:swarm:disable", Arc::new(Reply("taken")))
        .expect("pre-register");

    let result = bus.commit(toggle_batch(&log));

    assert_eq!(
        result,
        Err(BusError::DuplicateCommandHandler(
            "logs:swarm:disable".to_owned()
        ))
    );
    assert!(!bus.has_command_handler("logs:swarm:enable"));
    assert_eq!(bus.emit("check:backOnline:Swarm", Value::Null), 0);
    assert_eq!(
        bus.run_console_command("log swarm on").await,
        Err(BusError::NoMatchingConsoleCommand("log swarm on".to_owned()))
    );
    assert_eq!(
        bus.request("logs:swarm:disable", Value::Null).await,
        Ok(Value::String("taken".to_owned()))
    );
}

#[rstest]
fn batch_naming_a_command_twice_is_refused(bus: EventBus) {
    let batch = RegistrationBatch::new()
        .command("echo", Arc::new(Echo))
        .command("echo", Arc::new(Reply("again")));

    let result = bus.commit(batch);

    assert_eq!(
        result,
        Err(BusError::DuplicateCommandHandler("echo".to_owned()))
    );
    assert!(!bus.has_command_handler("echo"));
}

#[rstest]
fn commit_after_shutdown_is_refused(bus: EventBus) {
    bus.shutdown();

    let result = bus.commit(RegistrationBatch::new().command("echo", Arc::new(Echo)));

    assert_eq!(result, Err(BusError::ShutDown));
}

#[rstest]
#[tokio::test]
async fn shutdown_clears_tables_and_rejects_use(bus: EventBus) {
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.on("ping", recorder(&log, "listener")).expect("subscribe");
    bus.set_command_handler("echo", Arc::new(Echo))
        .expect("register");

    bus.shutdown();
    bus.shutdown();

    assert!(bus.is_shut_down());
    assert_eq!(bus.emit("ping", Value::Null), 0);
    assert!(log.lock().expect("log lock").is_empty());
    assert_eq!(
        bus.request("echo", Value::Null).await,
        Err(BusError::ShutDown)
    );
    assert_eq!(bus.on("ping", |_| Ok(())), Err(BusError::ShutDown));
    assert_eq!(
        bus.run_console_command("anything").await,
        Err(BusError::ShutDown)
    );
}

#[rstest]
fn register_service_without_registrar_fails(bus: EventBus) {
    let check = Arc::new(crate::storage::services::ProbeServiceCheck::new(
        "Swarm".to_owned(),
        crate::storage::domain::GatewayUrl::explicit("http://localhost:8500")
            .expect("valid gateway"),
        Arc::new(crate::storage::adapters::memory::ScriptedProbe::new(true)),
    ));

    let result = bus.register_service("Swarm", check);

    assert!(matches!(result, Err(BusError::NoServiceRegistrar)));
}
