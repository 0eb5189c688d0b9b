//! Worker Lambda: queued mentions and scheduled auto-post cycles.

pub mod handler;
pub mod schedule;

pub use handler::{WorkerEvent, classify_event, handler, process_event, run_task};
pub use schedule::run_schedule;
