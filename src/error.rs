use bevy_autodrive_physics_integration_layer::perception::PerceptionUnavailable;

use crate::config::AutodriveConfigError;

/// Everything that can go wrong while building or stepping an autodrive vehicle.
///
/// None of these are retried automatically. A failed step has not actuated anything, so the
/// caller may simply try again on the next tick.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AutodriveError {
    #[error(transparent)]
    PerceptionUnavailable(#[from] PerceptionUnavailable),
    #[error(transparent)]
    InvalidConfiguration(#[from] AutodriveConfigError),
    #[cfg(feature = "serialize")]
    #[error("could not parse autodrive configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}
