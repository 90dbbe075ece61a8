//! Turns a capability plus a record into a ready implementation instance.
//!
//! Resolution reads the registry on every call and builds a fresh instance;
//! nothing is cached. The record is shared with the instance, never copied or
//! checked against the shape the implementation expects.

use crate::capability::{CapabilityId, FieldKey};
use crate::error::{DispatchError, DispatchResult};
use crate::record::Record;
use crate::registry::Registry;
use std::any::type_name;
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolve against the global registry.
pub fn resolve<R, Ops>(
    capability: CapabilityId,
    field: impl Into<FieldKey>,
    record: &Arc<R>,
) -> DispatchResult<Box<Ops>>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    resolve_in(Registry::global(), capability, field, record)
}

/// Build the implementation registered for the record's discriminant.
///
/// Failure order: the capability must have at least one implementation, the
/// record must carry a string or integer tag at `field`, and that tag must be
/// registered with matching record and operation types.
pub fn resolve_in<R, Ops>(
    registry: &Registry,
    capability: CapabilityId,
    field: impl Into<FieldKey>,
    record: &Arc<R>,
) -> DispatchResult<Box<Ops>>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    let field = field.into();
    let result = build_instance(registry, capability, &field, record);
    if let Err(err) = &result {
        debug!(capability = %capability, field = %field, error = %err, "resolution failed");
    }
    result
}

fn build_instance<R, Ops>(
    registry: &Registry,
    capability: CapabilityId,
    field: &FieldKey,
    record: &Arc<R>,
) -> DispatchResult<Box<Ops>>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    if !registry.has_capability(capability) {
        return Err(DispatchError::UnregisteredCapability { capability });
    }

    let discriminant =
        record
            .discriminant(field)
            .ok_or_else(|| DispatchError::MissingDiscriminant {
                capability,
                field: field.clone(),
            })?;

    let entry = registry.lookup(capability, &discriminant).ok_or_else(|| {
        DispatchError::UnregisteredVariant {
            capability,
            discriminant: discriminant.clone(),
        }
    })?;

    let Some(factory) = entry.downcast::<R, Ops>() else {
        return Err(DispatchError::FactoryTypeMismatch {
            capability,
            discriminant,
            registered: entry.signature(),
            requested: format!("{} -> {}", type_name::<R>(), type_name::<Ops>()),
        });
    };

    trace!(capability = %capability, discriminant = %discriminant, "resolved implementation");
    Ok(factory(Arc::clone(record)))
}

/// Resolve against the global registry, then run `op` on the instance.
pub fn dispatch<R, Ops, T>(
    capability: CapabilityId,
    field: impl Into<FieldKey>,
    record: &Arc<R>,
    op: impl FnOnce(&Ops) -> T,
) -> DispatchResult<T>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    dispatch_in(Registry::global(), capability, field, record, op)
}

/// Resolve against `registry`, then run `op` on the instance.
pub fn dispatch_in<R, Ops, T>(
    registry: &Registry,
    capability: CapabilityId,
    field: impl Into<FieldKey>,
    record: &Arc<R>,
    op: impl FnOnce(&Ops) -> T,
) -> DispatchResult<T>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    let instance = resolve_in::<R, Ops>(registry, capability, field, record)?;
    Ok(op(&*instance))
}
