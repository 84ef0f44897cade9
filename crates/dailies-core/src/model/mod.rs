pub mod day;
pub mod ledger;
pub mod task;

pub use day::DayRecord;
pub use ledger::Ledger;
pub use task::{TaskId, TaskRecord};
