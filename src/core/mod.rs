//! The balance projection and reconciliation engine.
//!
//! Everything here works on immutable account snapshots: readers get computed views,
//! writers get a new account back. Nothing in this module touches the filesystem.

pub mod clock;
pub mod feed;
pub mod occurrences;
pub mod projection;
pub mod reconcile;
pub mod services;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use projection::{BalanceProjector, BalanceSummary, CarryOverMode, ProjectionSettings, Trend};
pub use reconcile::SlotState;
pub use state::{AppState, StateStore};
