//! dailies-core library.
//!
//! A per-user, per-day to-do ledger with carry-over of unfinished tasks and
//! weekly completion reports. Every operation takes the [`Ledger`] snapshot
//! explicitly; [`store::LedgerStore`] loads and saves it as one unit.
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`Result`] with [`DailiesError`];
//!   binaries wrap them in `anyhow`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Time**: pass `now` in; nothing here reads the system clock.

pub mod carry;
pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod lock;
pub mod model;
pub mod notify;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod tasks;
pub mod thread;
pub mod timing;

pub use clock::{DayClock, DayKey};
pub use error::{DailiesError, ErrorCode, Result};
pub use model::{DayRecord, Ledger, TaskId, TaskRecord};
