#![doc(test(attr(deny(warnings))))]

//! Budget Projection computes month-by-month balances for budgeting accounts that mix
//! real transactions with recurring templates, and reconciles user edits against the
//! virtual occurrences those templates generate.

pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Budget Projection tracing initialized.");
    });
}
