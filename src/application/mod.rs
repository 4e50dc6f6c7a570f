//! Application layer: wiring and orchestration.
//!
//! `Pipeline` walks one candidate through the stages, `Scheduler` drives
//! the poll loop and the paper books, `AlertDispatcher` owns delivery
//! retry. Everything here is glue over the domain and the ports.

pub mod dispatcher;
pub mod paper;
pub mod pipeline;
pub mod scheduler;

pub use dispatcher::AlertDispatcher;
pub use paper::{BookStats, PaperBook, TradeEvent};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use scheduler::{Scheduler, ShutdownHandle};
