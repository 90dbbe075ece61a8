//! Keyed field access on dispatchable records.
//!
//! The resolver never knows a record's schema; it only asks for the value at
//! the field name a capability agreed on. JSON-shaped records get this for
//! free. Typed records implement [`Record::discriminant`] by hand, usually by
//! matching on the key and returning their tag field.

use crate::capability::{DiscriminantValue, FieldKey};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// A record the resolver can read a discriminant from.
pub trait Record: Send + Sync + 'static {
    /// Value at `field`, when present and usable as a tag.
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue>;
}

impl Record for Value {
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue> {
        let slot = match self {
            Value::Object(map) => map.get(&field.as_name()),
            Value::Array(items) => items.get(field.as_index()?),
            _ => None,
        }?;
        DiscriminantValue::from_json(slot)
    }
}

impl Record for Map<String, Value> {
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue> {
        DiscriminantValue::from_json(self.get(&field.as_name())?)
    }
}

impl Record for BTreeMap<String, Value> {
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue> {
        DiscriminantValue::from_json(self.get(&field.as_name())?)
    }
}

impl Record for HashMap<String, Value> {
    fn discriminant(&self, field: &FieldKey) -> Option<DiscriminantValue> {
        DiscriminantValue::from_json(self.get(&field.as_name())?)
    }
}
