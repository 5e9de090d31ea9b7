//! Then steps for storage module BDD scenarios.

use super::world::{StorageWorld, run_async};
use rstest_bdd_macros::then;
use stowage::storage::domain::{ConfigWarning, ProcessStarted};

#[then(r#"process started reports started "{started}" without error"#)]
fn process_started_reports(world: &StorageWorld, started: String) -> Result<(), eyre::Report> {
    let expected = started
        .parse::<bool>()
        .map_err(|err| eyre::eyre!("invalid flag '{started}': {err}"))?;
    let announced: Vec<ProcessStarted> = world
        .events_named("swarm:process:started")?
        .iter()
        .filter_map(ProcessStarted::from_payload)
        .collect();
    if announced != vec![ProcessStarted::ok(expected)] {
        return Err(eyre::eyre!(
            "expected a single started={expected} announcement, got {announced:?}"
        ));
    }
    Ok(())
}

#[then("{count:usize} backend processes were launched")]
fn processes_launched(world: &StorageWorld, count: usize) -> Result<(), eyre::Report> {
    let launched = world.launcher.launches().len();
    if launched != count {
        return Err(eyre::eyre!("expected {count} launches, found {launched}"));
    }
    Ok(())
}

#[then("{count:usize} backend processes were terminated")]
fn processes_terminated(world: &StorageWorld, count: usize) -> Result<(), eyre::Report> {
    let terminated = world.launcher.terminated().len();
    if terminated != count {
        return Err(eyre::eyre!(
            "expected {count} terminations, found {terminated}"
        ));
    }
    Ok(())
}

#[then(r#"a configuration warning names "{key}""#)]
fn configuration_warning_names(world: &StorageWorld, key: String) -> Result<(), eyre::Report> {
    let warnings: Vec<ConfigWarning> = world
        .events_named("swarm:config:warning")?
        .iter()
        .filter_map(ConfigWarning::from_payload)
        .collect();
    if !warnings.iter().any(|warning| warning.keys.contains(&key)) {
        return Err(eyre::eyre!("no warning names '{key}': {warnings:?}"));
    }
    Ok(())
}

#[then(r#"the console reply to "{line}" mentions "{text}""#)]
fn console_reply_mentions(
    world: &StorageWorld,
    line: String,
    text: String,
) -> Result<(), eyre::Report> {
    let reply = run_async(world.bus.run_console_command(&line))
        .map_err(|err| eyre::eyre!("console command failed: {err}"))?;
    if !reply.contains(&text) {
        return Err(eyre::eyre!("reply '{reply}' does not mention '{text}'"));
    }
    Ok(())
}

#[then(r#"the console replies "{text}""#)]
fn console_replies(world: &StorageWorld, text: String) -> Result<(), eyre::Report> {
    match &world.console_reply {
        Some(Ok(reply)) if *reply == text => Ok(()),
        other => Err(eyre::eyre!("expected reply '{text}', got {other:?}")),
    }
}
