//! Unit tests for the event bus.

mod service_tests;
