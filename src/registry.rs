//! Two-level table from capability to discriminant to implementation factory.
//!
//! The registry only stores and serves factories. Validation of descriptors
//! lives in the registrar; extraction of discriminants and construction of
//! instances live in the resolver. Tables only grow: there is no removal.

use crate::capability::{CapabilityId, DiscriminantValue};
use crate::runtime::RegistryOptions;
use serde::Serialize;
use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Builds an implementation instance bound to one record.
pub type Factory<R, Ops> = Arc<dyn Fn(Arc<R>) -> Box<Ops> + Send + Sync>;

/// Wrap a closure as a [`Factory`].
///
/// Spelling the bound here lets closures coerce their boxed result to the
/// capability's trait object without annotations.
pub fn factory<R, Ops, F>(build: F) -> Factory<R, Ops>
where
    R: 'static,
    Ops: ?Sized + 'static,
    F: Fn(Arc<R>) -> Box<Ops> + Send + Sync + 'static,
{
    Arc::new(build)
}

type VariantTable = BTreeMap<DiscriminantValue, RegisteredFactory>;

/// A factory as stored in the registry, with its types erased.
#[derive(Clone)]
pub struct RegisteredFactory {
    factory: Arc<dyn Any + Send + Sync>,
    record_type: &'static str,
    ops_type: &'static str,
}

impl RegisteredFactory {
    fn new<R, Ops>(factory: Factory<R, Ops>) -> Self
    where
        R: 'static,
        Ops: ?Sized + 'static,
    {
        Self {
            factory: Arc::new(factory),
            record_type: type_name::<R>(),
            ops_type: type_name::<Ops>(),
        }
    }

    /// Recover the typed factory; `None` when registered with other types.
    pub fn downcast<R, Ops>(&self) -> Option<Factory<R, Ops>>
    where
        R: 'static,
        Ops: ?Sized + 'static,
    {
        self.factory.downcast_ref::<Factory<R, Ops>>().cloned()
    }

    pub fn record_type(&self) -> &'static str {
        self.record_type
    }

    pub fn ops_type(&self) -> &'static str {
        self.ops_type
    }

    /// `"<record> -> <ops>"`, as printed in diagnostics.
    pub fn signature(&self) -> String {
        format!("{} -> {}", self.record_type, self.ops_type)
    }
}

impl std::fmt::Debug for RegisteredFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFactory")
            .field("record_type", &self.record_type)
            .field("ops_type", &self.ops_type)
            .finish()
    }
}

/// Process-wide or isolated store of implementation factories.
#[derive(Default)]
pub struct Registry {
    options: RegistryOptions,
    capabilities: RwLock<BTreeMap<CapabilityId, VariantTable>>,
}

impl Registry {
    /// An empty registry with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with explicit options.
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            capabilities: RwLock::new(BTreeMap::new()),
        }
    }

    /// The lazily-created registry shared by the whole process.
    ///
    /// Options are read from the environment on first access only.
    pub fn global() -> &'static Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::with_options(RegistryOptions::from_env())))
    }

    /// Options this registry was built with.
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Insert or replace the factory for `(capability, discriminant)`.
    ///
    /// The capability's table is created on first use. The last registration
    /// for a pair wins.
    pub fn register<R, Ops>(
        &self,
        capability: CapabilityId,
        discriminant: DiscriminantValue,
        factory: Factory<R, Ops>,
    ) where
        R: 'static,
        Ops: ?Sized + 'static,
    {
        let entry = RegisteredFactory::new(factory);
        debug!(
            capability = %capability,
            discriminant = %discriminant,
            signature = %entry.signature(),
            "registering implementation"
        );
        let mut tables = self.write();
        let previous = tables
            .entry(capability)
            .or_default()
            .insert(discriminant.clone(), entry);
        if previous.is_some() && self.options.warn_on_overwrite {
            warn!(
                capability = %capability,
                discriminant = %discriminant,
                "replaced an existing implementation"
            );
        }
    }

    /// Fetch the factory for `(capability, discriminant)`, if any.
    pub fn lookup(
        &self,
        capability: CapabilityId,
        discriminant: &DiscriminantValue,
    ) -> Option<RegisteredFactory> {
        self.read().get(&capability)?.get(discriminant).cloned()
    }

    /// True once at least one implementation exists for `capability`.
    pub fn has_capability(&self, capability: CapabilityId) -> bool {
        self.read().contains_key(&capability)
    }

    /// Capabilities with at least one implementation, in creation order.
    pub fn capabilities(&self) -> Vec<CapabilityId> {
        self.read().keys().copied().collect()
    }

    /// Discriminants registered for `capability`, sorted.
    pub fn variants(&self, capability: CapabilityId) -> Vec<DiscriminantValue> {
        self.read()
            .get(&capability)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of registered `(capability, discriminant)` pairs.
    pub fn len(&self) -> usize {
        self.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Serializable view of every table, for debugging output.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let capabilities = self
            .read()
            .iter()
            .map(|(id, table)| CapabilitySnapshot {
                label: id.label().to_string(),
                serial: id.serial(),
                variants: table
                    .iter()
                    .map(|(discriminant, entry)| VariantSnapshot {
                        discriminant: discriminant.clone(),
                        record_type: entry.record_type.to_string(),
                        ops_type: entry.ops_type.to_string(),
                    })
                    .collect(),
            })
            .collect();
        RegistrySnapshot { capabilities }
    }

    // Writers only insert; a poisoned table is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<CapabilityId, VariantTable>> {
        self.capabilities
            .read()
            .unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<CapabilityId, VariantTable>> {
        self.capabilities
            .write()
            .unwrap_or_else(|err| err.into_inner())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("options", &self.options)
            .field("capabilities", &*self.read())
            .finish()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RegistrySnapshot {
    pub capabilities: Vec<CapabilitySnapshot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CapabilitySnapshot {
    pub label: String,
    pub serial: u64,
    pub variants: Vec<VariantSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VariantSnapshot {
    pub discriminant: DiscriminantValue,
    pub record_type: String,
    pub ops_type: String,
}
