//! Domain models for the deterioration risk pipeline.

mod features;
mod prediction;
mod projection;
mod referral;

pub use features::*;
pub use prediction::*;
pub use projection::*;
pub use referral::*;
