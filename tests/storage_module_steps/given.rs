//! Given steps for storage module BDD scenarios.

use super::world::StorageWorld;
use rstest_bdd_macros::given;
use stowage::storage::domain::{BackendConfig, Protocol};

fn enabled_swarm() -> BackendConfig {
    BackendConfig::new("swarm")
        .with_enabled(true)
        .with_available_providers(["ipfs", "swarm"])
}

#[given("a swarm backend that is not enabled")]
fn backend_not_enabled(world: &mut StorageWorld) {
    world.config = Some(BackendConfig::new("swarm").with_available_providers(["swarm"]));
}

#[given("an enabled swarm backend")]
fn enabled_backend(world: &mut StorageWorld) {
    world.config = Some(enabled_swarm());
}

#[given("an enabled swarm backend without a gateway host")]
fn enabled_backend_without_host(world: &mut StorageWorld) {
    world.config = Some(enabled_swarm().with_endpoint(Protocol::Http, "", 8500));
}

#[given("the gateway is unreachable")]
fn gateway_unreachable(world: &mut StorageWorld) {
    world.probe.set_available(false);
}

#[given("the gateway is reachable")]
fn gateway_reachable(world: &mut StorageWorld) {
    world.probe.set_available(true);
}
