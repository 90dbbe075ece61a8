//! Open single dispatch over tagged data records.
//!
//! Records stay plain data (usually `serde_json::Value` state trees) with one
//! field naming their variant. Behavior lives elsewhere: each capability is a
//! trait describing a set of operations, and each variant registers a factory
//! producing that trait object from a record. At call time the resolver reads
//! the record's tag, finds the factory registered for it and builds a fresh
//! implementation bound to the record.
//!
//! Public functions here form the contract capability authors and call sites
//! depend on: [`Capability`] for the typed definition-site handle,
//! [`make_registrar`]/[`Registrar`] for registration, and [`resolve`]/
//! [`dispatch`] for lookups. Every entry point has an `_in` or
//! `in_registry` twin taking an explicit [`Registry`], so tests can work
//! against isolated tables instead of the process-wide one.

pub mod capability;
pub mod error;
pub mod record;
pub mod registrar;
pub mod registry;
pub mod resolver;
pub mod runtime;

pub use capability::{
    Capability, CapabilityId, DiscriminantValue, FieldKey, ImplementationBase, Supports,
};
pub use error::{DispatchError, DispatchResult};
pub use record::Record;
pub use registrar::{ImplDescriptor, Implementation, Registrar, make_registrar};
pub use registry::{
    CapabilitySnapshot, Factory, RegisteredFactory, Registry, RegistrySnapshot, VariantSnapshot,
    factory,
};
pub use resolver::{dispatch, dispatch_in, resolve, resolve_in};
pub use runtime::{RegistryOptions, WARN_ON_OVERWRITE_ENV};
