//! # Manager
//!
//! Run orchestration.
//!
//! One run: read the source, create the bounded intake and failure queues, spawn the
//! workers and the error collector, then dispatch on the caller's task. `run`
//! returns when dispatch is done; the returned [`RunHandle`] resolves once every
//! worker has drained and every failure has been consumed.
//!
//! ## Usage Example
//!
//! ```ignore
//! use manager::Manager;
//! use worker_pool::MemorySink;
//!
//! let manager = Manager::new(MemorySink::new("mem"));
//! let report = manager.run("./data.csv", 5).await?.wait().await?;
//! println!("{report}");
//! ```

mod error;
mod handle;
mod manager;
mod report;

pub use error::RunError;
pub use handle::RunHandle;
pub use manager::Manager;
pub use report::RunReport;
