//! Load Test Runner
//!
//! This file makes the load tests discoverable by cargo test.
//!
//! To run the slow load tests:
//! ```bash
//! cargo test --test load_tests -- --ignored --test-threads=1
//! ```
//!
//! Slow tests are marked #[ignore] so they stay out of normal CI builds.

mod common;
mod load;
