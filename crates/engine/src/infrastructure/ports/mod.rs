//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Layout storage (could swap JSON files -> a database)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::*;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;
#[cfg(test)]
pub use testing::MockClockPort;

pub use error::RepoError;
