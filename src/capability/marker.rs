use crate::capability::{CapabilityId, FieldKey};
use crate::error::DispatchResult;
use crate::record::Record;
use crate::registrar::Registrar;
use crate::registry::Registry;
use crate::resolver::{dispatch_in, resolve_in};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Declares that records of this type may be dispatched through capabilities
/// exposing `Ops`.
///
/// Purely a compile-time bound; nothing reads it at runtime. JSON records
/// carry their shape dynamically, so they support every operation set.
pub trait Supports<Ops: ?Sized> {}

impl<Ops: ?Sized> Supports<Ops> for Value {}

impl<Ops: ?Sized> Supports<Ops> for Map<String, Value> {}

/// Read-only handle on the record an implementation was built from.
///
/// Implementations compose this rather than storing the record themselves.
pub struct ImplementationBase<R> {
    record: Arc<R>,
}

impl<R> ImplementationBase<R> {
    pub fn new(record: Arc<R>) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    /// Another shared handle on the same record.
    pub fn shared(&self) -> Arc<R> {
        Arc::clone(&self.record)
    }
}

impl<R> Clone for ImplementationBase<R> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for ImplementationBase<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImplementationBase").field(&self.record).finish()
    }
}

/// Definition-site handle for one capability.
///
/// Pairs the capability's id with the discriminant field every variant agrees
/// on, and fixes the record and operation types so registration and
/// resolution through the handle are checked by the compiler.
pub struct Capability<R, Ops: ?Sized> {
    id: CapabilityId,
    field: FieldKey,
    _types: PhantomData<fn(Arc<R>) -> Box<Ops>>,
}

impl<R, Ops> Capability<R, Ops>
where
    R: Record,
    Ops: ?Sized + 'static,
{
    /// Create a new capability with a fresh id.
    pub fn define(label: &'static str, field: impl Into<FieldKey>) -> Self {
        Self {
            id: CapabilityId::new(label),
            field: field.into(),
            _types: PhantomData,
        }
    }

    /// Registry key for this capability.
    pub fn id(&self) -> CapabilityId {
        self.id
    }

    /// Record field every variant of this capability is tagged by.
    pub fn field(&self) -> &FieldKey {
        &self.field
    }

    /// Registration entry point writing to the global registry.
    pub fn registrar(&self) -> Registrar<R, Ops> {
        Registrar::new(self.id)
    }

    /// Registration entry point writing to `registry`.
    pub fn registrar_in(&self, registry: &Arc<Registry>) -> Registrar<R, Ops> {
        Registrar::in_registry(registry, self.id)
    }

    /// Resolve against the global registry.
    pub fn resolve(&self, record: &Arc<R>) -> DispatchResult<Box<Ops>>
    where
        R: Supports<Ops>,
    {
        self.resolve_in(Registry::global(), record)
    }

    /// Resolve against an explicit registry.
    pub fn resolve_in(&self, registry: &Registry, record: &Arc<R>) -> DispatchResult<Box<Ops>>
    where
        R: Supports<Ops>,
    {
        resolve_in(registry, self.id, &self.field, record)
    }

    /// Resolve against the global registry and run `op` on the instance.
    pub fn dispatch<T>(&self, record: &Arc<R>, op: impl FnOnce(&Ops) -> T) -> DispatchResult<T>
    where
        R: Supports<Ops>,
    {
        self.dispatch_in(Registry::global(), record, op)
    }

    /// Resolve against `registry` and run `op` on the instance.
    pub fn dispatch_in<T>(
        &self,
        registry: &Registry,
        record: &Arc<R>,
        op: impl FnOnce(&Ops) -> T,
    ) -> DispatchResult<T>
    where
        R: Supports<Ops>,
    {
        dispatch_in(registry, self.id, &self.field, record, op)
    }
}

impl<R, Ops: ?Sized> Clone for Capability<R, Ops> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            field: self.field.clone(),
            _types: PhantomData,
        }
    }
}

impl<R, Ops: ?Sized> fmt::Debug for Capability<R, Ops> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("field", &self.field)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implementation_base_shares_the_record() {
        let record = Arc::new(json!({"type": "array-obj"}));
        let base = ImplementationBase::new(Arc::clone(&record));
        assert_eq!(base.record()["type"], json!("array-obj"));
        assert!(Arc::ptr_eq(&base.shared(), &record));
        assert!(Arc::ptr_eq(&base.clone().shared(), &record));
    }

    #[test]
    fn cloned_handles_name_the_same_capability() {
        trait Noop {}
        let cap: Capability<Value, dyn Noop> = Capability::define("noop", "kind");
        let copy = cap.clone();
        assert_eq!(cap.id(), copy.id());
        assert_eq!(copy.field(), &FieldKey::from("kind"));
    }
}
