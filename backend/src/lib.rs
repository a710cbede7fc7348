//! # Ecliptic Align
//!
//! Detection of planetary alignments over a window of calendar days.
//!
//! A date is aligned when the smallest arc of ecliptic longitude containing
//! every chosen body is within a threshold. Consecutive aligned days are
//! merged into intervals reported with their minimum spread.
//!
//! ## Strategies
//!
//! - **Exhaustive**: query the ephemeris service for every day in the window.
//! - **Analytic**: predict longitudes with a circular-orbit model, keep only
//!   the days whose predicted spread could be within the threshold, and query
//!   the service for those days alone.
//!
//! Predicted longitudes never decide an alignment. Every reported spread is
//! computed from observed longitudes.
//!
//! ## Architecture
//!
//! - [`models`]: bodies, planet catalog, Julian dates, scan records
//! - [`algorithms`]: angle math, orbital model, candidate generation, interval merging
//! - [`ephemeris`]: collaborator trait, retry layer, local and Horizons clients
//! - [`services`]: verification and scan orchestration
//! - [`config`]: TOML and environment configuration
//! - [`error`]: crate error type

// EphemerisError carries a structured context on every variant
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod config;
pub mod ephemeris;
pub mod error;
pub mod models;
pub mod services;

pub use config::AlignmentConfig;
pub use error::{AlignmentError, AlignmentResult};
pub use services::{ScanOrchestrator, ScanReport, ScanStrategy};
