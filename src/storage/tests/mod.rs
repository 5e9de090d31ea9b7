//! Unit tests for storage backend supervision.

mod launcher_tests;
mod supervisor_tests;
