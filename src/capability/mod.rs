//! Capability identity and definition-site types.
//!
//! `identity` holds the keys the registry is indexed by; `marker` holds the
//! typed handle a capability's author defines once and the compile-time bound
//! records opt into.

pub mod identity;
pub mod marker;

pub use identity::{CapabilityId, DiscriminantValue, FieldKey};
pub use marker::{Capability, ImplementationBase, Supports};
