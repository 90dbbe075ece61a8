//! Per-capability registration entry points.
//!
//! A [`Registrar`] is bound to one capability and one registry. It refuses
//! descriptors that do not declare a discriminant, so a broken entry fails at
//! startup instead of at first dispatch.

use crate::capability::{CapabilityId, DiscriminantValue, ImplementationBase};
use crate::error::{DispatchError, DispatchResult};
use crate::registry::{Factory, Registry, factory};
use std::marker::PhantomData;
use std::sync::Arc;

/// A variant implementation described by its type.
///
/// `discriminant` plays the role of a type-level tag. Leaving it at the default
/// is a configuration mistake that registration reports.
pub trait Implementation<R, Ops: ?Sized>: 'static {
    fn discriminant() -> Option<DiscriminantValue> {
        None
    }

    fn build(base: ImplementationBase<R>) -> Box<Ops>;
}

/// Factory plus the discriminant it answers to.
pub struct ImplDescriptor<R, Ops: ?Sized> {
    discriminant: Option<DiscriminantValue>,
    factory: Factory<R, Ops>,
}

impl<R, Ops> ImplDescriptor<R, Ops>
where
    R: 'static,
    Ops: ?Sized + 'static,
{
    /// Untagged descriptor; call [`ImplDescriptor::tagged`] before registering.
    pub fn new(factory: Factory<R, Ops>) -> Self {
        Self {
            discriminant: None,
            factory,
        }
    }

    /// Untagged descriptor around a closure.
    pub fn from_fn<F>(build: F) -> Self
    where
        F: Fn(Arc<R>) -> Box<Ops> + Send + Sync + 'static,
    {
        Self::new(factory(build))
    }

    /// Descriptor for an [`Implementation`], tagged with its declared value.
    pub fn of<I: Implementation<R, Ops>>() -> Self {
        Self {
            discriminant: I::discriminant(),
            factory: factory(|record: Arc<R>| I::build(ImplementationBase::new(record))),
        }
    }

    /// Set or replace the declared discriminant.
    pub fn tagged(mut self, discriminant: impl Into<DiscriminantValue>) -> Self {
        self.discriminant = Some(discriminant.into());
        self
    }

    /// Declared discriminant, if any.
    pub fn discriminant(&self) -> Option<&DiscriminantValue> {
        self.discriminant.as_ref()
    }
}

impl<R, Ops: ?Sized> Clone for ImplDescriptor<R, Ops> {
    fn clone(&self) -> Self {
        Self {
            discriminant: self.discriminant.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

/// Registration entry point for one capability.
pub struct Registrar<R, Ops: ?Sized> {
    capability: CapabilityId,
    registry: Arc<Registry>,
    _types: PhantomData<fn(Arc<R>) -> Box<Ops>>,
}

/// Registrar writing to the global registry.
pub fn make_registrar<R, Ops>(capability: CapabilityId) -> Registrar<R, Ops>
where
    R: 'static,
    Ops: ?Sized + 'static,
{
    Registrar::new(capability)
}

impl<R, Ops> Registrar<R, Ops>
where
    R: 'static,
    Ops: ?Sized + 'static,
{
    /// Registrar for `capability` in the global registry.
    pub fn new(capability: CapabilityId) -> Self {
        Self::in_registry(Registry::global(), capability)
    }

    /// Registrar for `capability` in an explicit registry.
    pub fn in_registry(registry: &Arc<Registry>, capability: CapabilityId) -> Self {
        Self {
            capability,
            registry: Arc::clone(registry),
            _types: PhantomData,
        }
    }

    /// Capability this registrar writes to.
    pub fn capability(&self) -> CapabilityId {
        self.capability
    }

    /// Validate and store one implementation.
    ///
    /// A registration replaces any earlier one for the same discriminant.
    pub fn register(&self, descriptor: ImplDescriptor<R, Ops>) -> DispatchResult<()> {
        let discriminant = match descriptor.discriminant {
            Some(value) if !value.is_blank() => value,
            _ => {
                return Err(DispatchError::MalformedDescriptor {
                    capability: self.capability,
                });
            }
        };
        self.registry
            .register(self.capability, discriminant, descriptor.factory);
        Ok(())
    }

    /// Register a type through its [`Implementation`] impl.
    pub fn register_impl<I: Implementation<R, Ops>>(&self) -> DispatchResult<()> {
        self.register(ImplDescriptor::of::<I>())
    }

    /// Register a closure under an explicit discriminant.
    pub fn register_fn<F>(
        &self,
        discriminant: impl Into<DiscriminantValue>,
        build: F,
    ) -> DispatchResult<()>
    where
        F: Fn(Arc<R>) -> Box<Ops> + Send + Sync + 'static,
    {
        self.register(ImplDescriptor::from_fn(build).tagged(discriminant))
    }
}

impl<R, Ops: ?Sized> Clone for Registrar<R, Ops> {
    fn clone(&self) -> Self {
        Self {
            capability: self.capability,
            registry: Arc::clone(&self.registry),
            _types: PhantomData,
        }
    }
}
