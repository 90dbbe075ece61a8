use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Process-unique token naming one capability.
///
/// Equality, ordering and hashing use only the serial drawn at creation; the
/// label exists for log lines and error messages. Two ids created with the same
/// label are still distinct capabilities.
#[derive(Clone, Copy)]
pub struct CapabilityId {
    serial: u64,
    label: &'static str,
}

impl CapabilityId {
    /// Fresh id; never equal to any other id in the process.
    pub fn new(label: &'static str) -> Self {
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for CapabilityId {}

impl PartialOrd for CapabilityId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CapabilityId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.serial.cmp(&other.serial)
    }
}

impl std::hash::Hash for CapabilityId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.serial.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityId({}#{})", self.label, self.serial)
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.serial)
    }
}

/// Name of the record field carrying the variant tag.
///
/// Agreed once per capability; every record passed through that capability's
/// resolver is read at the same key.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKey {
    Index(usize),
    Name(String),
}

impl FieldKey {
    /// Textual form used when the record is keyed by strings.
    pub fn as_name(&self) -> String {
        match self {
            FieldKey::Name(name) => name.clone(),
            FieldKey::Index(index) => index.to_string(),
        }
    }

    /// Positional form used when the record is a sequence.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            FieldKey::Index(index) => Some(*index),
            FieldKey::Name(name) => name.parse().ok(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{name:?}"),
            FieldKey::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        FieldKey::Name(value.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        FieldKey::Name(value)
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

impl From<usize> for FieldKey {
    fn from(value: usize) -> Self {
        FieldKey::Index(value)
    }
}

/// Variant tag read from a record, used purely as a lookup key.
///
/// Strings and numbers are distinct: `"1"` never matches `1`. Numbers compare
/// by value, so `1` and `1.0` are the same tag. `UInt` only holds values above
/// `i64::MAX`; smaller unsigned values are stored as `Int`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscriminantValue {
    Int(i64),
    UInt(u64),
    Str(String),
}

impl DiscriminantValue {
    /// Interpret a JSON value as a tag.
    ///
    /// Strings and whole numbers qualify, including floats with no fractional
    /// part; everything else yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(DiscriminantValue::Str(text.clone())),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Some(DiscriminantValue::Int(int))
                } else if let Some(uint) = number.as_u64() {
                    Some(DiscriminantValue::UInt(uint))
                } else {
                    number.as_f64().and_then(Self::from_whole_float)
                }
            }
            _ => None,
        }
    }

    // 2^63 and 2^64 are exact in f64; `as` casts below stay in range.
    fn from_whole_float(number: f64) -> Option<Self> {
        const I64_END: f64 = 9_223_372_036_854_775_808.0;
        const U64_END: f64 = 18_446_744_073_709_551_616.0;
        if !number.is_finite() || number.fract() != 0.0 {
            return None;
        }
        if (-I64_END..I64_END).contains(&number) {
            Some(DiscriminantValue::Int(number as i64))
        } else if (I64_END..U64_END).contains(&number) {
            Some(DiscriminantValue::UInt(number as u64))
        } else {
            None
        }
    }

    /// Whether the tag is usable for registration.
    pub fn is_blank(&self) -> bool {
        match self {
            DiscriminantValue::Str(text) => text.trim().is_empty(),
            DiscriminantValue::Int(_) | DiscriminantValue::UInt(_) => false,
        }
    }
}

impl fmt::Display for DiscriminantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscriminantValue::Str(text) => write!(f, "{text:?}"),
            DiscriminantValue::Int(number) => write!(f, "{number}"),
            DiscriminantValue::UInt(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for DiscriminantValue {
    fn from(value: &str) -> Self {
        DiscriminantValue::Str(value.to_string())
    }
}

impl From<String> for DiscriminantValue {
    fn from(value: String) -> Self {
        DiscriminantValue::Str(value)
    }
}

impl From<i64> for DiscriminantValue {
    fn from(value: i64) -> Self {
        DiscriminantValue::Int(value)
    }
}

impl From<u64> for DiscriminantValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(int) => DiscriminantValue::Int(int),
            Err(_) => DiscriminantValue::UInt(value),
        }
    }
}

impl From<i32> for DiscriminantValue {
    fn from(value: i32) -> Self {
        DiscriminantValue::Int(value.into())
    }
}
