//! Domain types for flightsquad verification and harvesting.

pub mod build;
pub mod compliance;
pub mod error;
pub mod record;
pub mod simulation;
pub mod verdict;

pub use build::{BuildError, BuildOutcome};
pub use compliance::{ComplianceViolation, RuleId};
pub use error::{Result, SquadError};
pub use record::TrainingRecord;
pub use simulation::SimulationOutcome;
pub use verdict::{VerificationStage, VerificationVerdict};
