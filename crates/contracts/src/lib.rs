//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the ingestion workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Record Model
//! - A `Record` is one parsed data line of the source plus its 1-based line number
//!   (the header line is not counted)
//! - `FinancialData` is the fixed 14-field document handed to a sink
//! - A sink assigns the identity; a `Record` has none

mod config;
mod error;
mod failure;
mod record;
mod sink;

pub use config::*;
pub use error::*;
pub use failure::*;
pub use record::*;
pub use sink::*;
