use crate::capability::{CapabilityId, DiscriminantValue, FieldKey};
use thiserror::Error;

/// Failures surfaced by registration and resolution.
///
/// None of these are retried; every one reaches the immediate caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("capability '{capability}' has no registered implementations")]
    UnregisteredCapability { capability: CapabilityId },

    #[error(
        "implementation not found for capability '{capability}' with discriminant {discriminant}"
    )]
    UnregisteredVariant {
        capability: CapabilityId,
        discriminant: DiscriminantValue,
    },

    #[error(
        "record has no string or integer discriminant at field {field} for capability '{capability}'"
    )]
    MissingDiscriminant {
        capability: CapabilityId,
        field: FieldKey,
    },

    #[error(
        "implementation descriptor for capability '{capability}' does not declare a discriminant value"
    )]
    MalformedDescriptor { capability: CapabilityId },

    #[error(
        "implementation for capability '{capability}' with discriminant {discriminant} was registered as {registered}, requested as {requested}"
    )]
    FactoryTypeMismatch {
        capability: CapabilityId,
        discriminant: DiscriminantValue,
        registered: String,
        requested: String,
    },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
