//! Ephemeris collaborator: the only part of the crate that talks to the outside world.
//!
//! ```text
//!   ScanOrchestrator / AlignmentVerifier
//!                 │  Arc<dyn EphemerisClient>
//!   ┌─────────────▼─────────────┐
//!   │ RetryingClient            │  timeout, bounded retries, backoff, stats
//!   └─────────────┬─────────────┘
//!        ┌────────┴─────────┐
//!   HorizonsClient     LocalEphemeris
//!   (reqwest)          (fixture / synthetic / failure injection)
//! ```
//!
//! Use [`EphemerisFactory::create`] to build the configured stack.

pub mod client;
pub mod error;
pub mod factory;
pub mod horizons;
pub mod local;
pub mod retry;

pub use client::EphemerisClient;
pub use error::{EphemerisError, EphemerisResult, ErrorContext};
pub use factory::{EphemerisFactory, EphemerisType};
#[cfg(feature = "horizons-client")]
pub use horizons::HorizonsClient;
pub use horizons::DEFAULT_HORIZONS_URL;
pub use local::{EphemerisFixture, FixtureLongitude, InjectedFailure, LocalEphemeris};
pub use retry::{ClientStats, RetryPolicy, RetryingClient};
