//! When steps for storage module BDD scenarios.

use super::world::{StorageWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the storage module starts")]
fn module_starts(world: &mut StorageWorld) -> Result<(), eyre::Report> {
    let module = world.module()?;
    world.handle = Some(run_async(module.start()));
    Ok(())
}

#[when("the storage module shuts down")]
fn module_shuts_down(world: &mut StorageWorld) -> Result<(), eyre::Report> {
    let handle = world
        .handle
        .as_ref()
        .ok_or_else(|| eyre::eyre!("storage module has not started"))?;
    run_async(handle.shutdown()).wrap_err("shutdown should succeed")
}

#[when(r#"the console runs "{line}""#)]
fn console_runs(world: &mut StorageWorld, line: String) {
    world.console_reply = Some(run_async(world.bus.run_console_command(&line)));
}
