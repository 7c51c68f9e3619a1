//! Cross-cutting test suite for the versioning core.
//!
//! Per-module unit tests live alongside their types (`line::tests`,
//! `block::tests`, etc.); this module holds the scenarios and invariants
//! that only make sense exercised through the full [`crate::session::Session`].

#[cfg(test)]
mod integration;

/// Route `log`/`debug!` output (e.g. `Store`'s timestamp/edit-batch
/// tracing) to the test harness instead of discarding it. Safe to call
/// from every test; `env_logger` only installs itself once per process.
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
