//! Step definitions for storage module behaviour scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
