//! Integration test crate for the beacon oracle.
//!
//! This crate has no library code; it only contains integration tests
//! that exercise end-to-end flows across the workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p beacon-integration-tests
//! ```
