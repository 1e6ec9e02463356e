//! Error types for Pricing Assist.

use crate::wizard::record::Modality;
use crate::wizard::step::Step;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

/// Errors surfaced by the wizard engine's step operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("The wizard is already at the final step")]
    AtTerminal,

    #[error("Submitted form does not belong to the current step ({step})")]
    FormMismatch { step: Step },

    #[error("Validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// A single violated step rule. `advance` reports every violation at once,
/// never just the first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Select at least one modality")]
    EmptyModalities,

    #[error("Modality {modality} is selected more than once")]
    DuplicateModality { modality: Modality },

    #[error("No volume profile provided for {modality}")]
    MissingVolume { modality: Modality },

    #[error("Volume profile for {modality} has the wrong shape for that modality")]
    ProfileMismatch { modality: Modality },

    #[error("Volume data provided for {modality}, which is not a selected modality")]
    UnselectedModality { modality: Modality },

    #[error("Percentages for {modality} sum to {sum}%, which exceeds 100%")]
    PercentSumExceeded { modality: Modality, sum: u32 },

    #[error("Operating hours for {modality} must not be empty")]
    EmptyOperatingHours { modality: Modality },

    #[error("Number of served units must be at least 1")]
    UnitCountTooLow,

    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("A mammography registry must be selected when Mamografia is in scope")]
    MissingMammographyRegistry,

    #[error("A postal code is required when the provider supplies the submission link")]
    MissingPostalCode,

    #[error("Postal code '{code}' is not an 8-digit code")]
    MalformedPostalCode { code: String },

    #[error("Postal code '{code}' could not be resolved to an address")]
    UnresolvedPostalCode { code: String },

    #[error("A 6-month average volume is required for {modality} under per-exam billing")]
    MissingHistory { modality: Modality },

    #[error("SLA target '{field}' is invalid: {reason}")]
    InvalidSla { field: &'static str, reason: String },
}

/// Postal-code resolver errors. The engine folds these into
/// [`ValidationError::UnresolvedPostalCode`]; they exist so transport
/// failures can be logged with their real cause first.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Postal code service request failed: {0}")]
    Request(String),

    #[error("Postal code service returned an unexpected payload: {0}")]
    Decode(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
