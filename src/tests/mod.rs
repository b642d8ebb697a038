//! Consolidated test modules.
//!
//! End-to-end tests that drive the executor through the real HTTP source
//! against a mock server.

mod purge_e2e;
