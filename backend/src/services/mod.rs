//! Service layer: body loading, verification and scan orchestration.
//!
//! Services sit between the pure algorithms and the ephemeris collaborator.
//! They own concurrency and the skip-and-report handling of dates the
//! collaborator cannot answer.

pub mod bodies;
pub mod compare;
pub mod scan;
pub mod spans;
pub mod verifier;

pub use bodies::{load_bodies, load_configured_bodies};
pub use compare::{compare_strategies, OracleReport};
pub use scan::{ScanOrchestrator, ScanReport, ScanStrategy};
pub use spans::{span_series, SpanSample, SpanSeries};
pub use verifier::{AlignmentVerifier, Verification};
