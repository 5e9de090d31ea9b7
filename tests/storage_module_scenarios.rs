//! Behaviour tests for storage backend startup, reuse and teardown.

mod storage_module_steps;

use rstest_bdd_macros::scenario;
use storage_module_steps::world::{StorageWorld, world};

#[scenario(
    path = "tests/features/storage_module.feature",
    name = "Disabled backend announces that it did not start"
)]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_backend_announces_not_started(world: StorageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/storage_module.feature",
    name = "Unreachable gateway launches a local node"
)]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_gateway_launches_node(world: StorageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/storage_module.feature",
    name = "Reachable gateway is reused"
)]
#[tokio::test(flavor = "multi_thread")]
async fn reachable_gateway_is_reused(world: StorageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/storage_module.feature",
    name = "Unresolvable gateway warns about configuration"
)]
#[tokio::test(flavor = "multi_thread")]
async fn unresolvable_gateway_warns(world: StorageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/storage_module.feature",
    name = "Console toggles backend logs"
)]
#[tokio::test(flavor = "multi_thread")]
async fn console_toggles_logs(world: StorageWorld) {
    let _ = world;
}
