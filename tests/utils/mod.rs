pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{CollectingHandler, FlakyStore};
#[allow(unused_imports)]
pub use setup::{completion, TestHarness, TestHarnessBuilder};
