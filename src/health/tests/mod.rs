//! Unit tests for availability monitoring.
