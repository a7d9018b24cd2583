//! Core library for the actual-sheets command line application.
//!
//! The library exposes the pieces that power the binary as well as the
//! integration tests. The modules are structured to keep responsibilities
//! narrow and composable: the Actual server adapter lives in [`actual`], the
//! Google Sheets adapter in [`sheets`], pure aggregation logic in
//! [`aggregate`], configuration in [`config`], and the run orchestration in
//! [`sync`].

pub mod actual;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod sheets;
pub mod sync;

pub use config::Config;
pub use error::{Result, SyncError};
