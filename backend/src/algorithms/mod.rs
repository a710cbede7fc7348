//! Pure numeric core: circular spread, orbital propagation, candidate
//! prediction and interval merging. Nothing here touches the network.

pub mod angles;
pub mod candidates;
pub mod intervals;
pub mod orbital;

pub use angles::{circular_min_spread, normalize_degrees, signed_separation};
pub use candidates::{
    generate_candidates, CandidateGenerator, CandidateSet, CandidateSettings, CandidateStats,
    DEFAULT_MARGIN_FACTOR,
};
pub use intervals::merge_intervals;
pub use orbital::{
    body_mean_motion, mean_motion, mean_motion_from_period, predicted_longitude, MeanMotion,
    OrbitalModel, Projection, RateBounds,
};
