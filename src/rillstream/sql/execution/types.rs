//! Core streaming data types.
//!
//! This module contains the fundamental data types used throughout the
//! engine:
//! - [`FieldValue`] - the runtime-typed value variant
//! - [`FieldMap`] - the ordered string-keyed mapping used for records
//! - [`Tuple`] - the immutable input unit pushed by sources
//! - [`RowBinding`] - the row view handed to the expression evaluator

use crate::rillstream::sql::ast::TypeName;
use crate::rillstream::sql::error::SqlError;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Ordered-insertion mapping from field name to value.
///
/// Records keep the order fields were assigned in, so projected output
/// reads in projection order and wildcard merges stay deterministic.
pub type FieldMap = IndexMap<String, FieldValue>;

/// A value in a record field
///
/// This enum represents all runtime value kinds the engine evaluates over.
/// Values are deeply comparable and deeply hashable; the hash is
/// deterministic across runs for a given value content.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// NULL
    Null,
    /// Boolean value (true/false)
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Opaque byte sequence
    Blob(Vec<u8>),
    /// UTC wall-clock time, microsecond resolution
    Timestamp(DateTime<Utc>),
    /// Ordered sequence of values
    Array(Vec<FieldValue>),
    /// Ordered-insertion mapping with unique string keys
    Map(FieldMap),
}

/// Display implementation for FieldValue for clean string formatting
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Blob(b) => {
                write!(f, "{}", base64::engine::general_purpose::STANDARD.encode(b))
            }
            FieldValue::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            FieldValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Hash tags, one per value shape. Integer and integral Float share the
// NUMBER tag so that values the evaluator treats as equal hash equally.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NUMBER: u8 = 2;
const TAG_FLOAT_BITS: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_BLOB: u8 = 5;
const TAG_TIMESTAMP: u8 = 6;
const TAG_ARRAY: u8 = 7;
const TAG_MAP: u8 = 8;

impl FieldValue {
    /// Get the type name for error messages and debugging
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "NULL",
            FieldValue::Boolean(_) => "BOOLEAN",
            FieldValue::Integer(_) => "INTEGER",
            FieldValue::Float(_) => "FLOAT",
            FieldValue::String(_) => "STRING",
            FieldValue::Blob(_) => "BLOB",
            FieldValue::Timestamp(_) => "TIMESTAMP",
            FieldValue::Array(_) => "ARRAY",
            FieldValue::Map(_) => "MAP",
        }
    }

    /// Check if this value is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Float(_))
    }

    /// Deterministic 64-bit content hash.
    ///
    /// Agrees with [`FieldValue::deep_equal`]: values that compare equal
    /// hash equally. Map entries are hashed over lexicographically sorted
    /// keys, and a Float carrying an integral value hashes as that integer.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_content(&mut hasher);
        hasher.finish()
    }

    fn hash_content<H: Hasher>(&self, state: &mut H) {
        match self {
            FieldValue::Null => state.write_u8(TAG_NULL),
            FieldValue::Boolean(b) => {
                state.write_u8(TAG_BOOL);
                b.hash(state);
            }
            FieldValue::Integer(i) => {
                state.write_u8(TAG_NUMBER);
                i.hash(state);
            }
            FieldValue::Float(f) => {
                // An integral float must hash like the equal integer
                if f.fract() == 0.0
                    && f.is_finite()
                    && *f >= i64::MIN as f64
                    && *f <= i64::MAX as f64
                {
                    state.write_u8(TAG_NUMBER);
                    (*f as i64).hash(state);
                } else {
                    state.write_u8(TAG_FLOAT_BITS);
                    f.to_bits().hash(state);
                }
            }
            FieldValue::String(s) => {
                state.write_u8(TAG_STRING);
                s.hash(state);
            }
            FieldValue::Blob(b) => {
                state.write_u8(TAG_BLOB);
                b.hash(state);
            }
            FieldValue::Timestamp(ts) => {
                state.write_u8(TAG_TIMESTAMP);
                ts.timestamp_micros().hash(state);
            }
            FieldValue::Array(arr) => {
                state.write_u8(TAG_ARRAY);
                arr.len().hash(state);
                for elem in arr {
                    elem.hash_content(state);
                }
            }
            // Keys are hashed sorted so the hash ignores insertion order,
            // like equality does
            FieldValue::Map(map) => hash_map_content(map, state),
        }
    }

    /// Deep content equality.
    ///
    /// Same-kind values compare structurally; Integer and Float compare
    /// numerically across kinds; every other cross-kind pair is unequal.
    pub fn deep_equal(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64) == *b,
            (FieldValue::Float(a), FieldValue::Integer(b)) => *a == (*b as f64),
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_equal(y))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => maps_deep_equal(a, b),
            (a, b) => a == b,
        }
    }
}

/// Content hash of a record, identical to hashing it wrapped in
/// [`FieldValue::Map`] but without cloning the map
pub fn map_content_hash(map: &FieldMap) -> u64 {
    let mut hasher = FxHasher::default();
    hash_map_content(map, &mut hasher);
    hasher.finish()
}

fn hash_map_content<H: Hasher>(map: &FieldMap, state: &mut H) {
    state.write_u8(TAG_MAP);
    let mut sorted_keys: Vec<&String> = map.keys().collect();
    sorted_keys.sort();
    sorted_keys.len().hash(state);
    for key in sorted_keys {
        key.hash(state);
        map[key.as_str()].hash_content(state);
    }
}

/// Order-insensitive deep equality of two records
pub fn maps_deep_equal(a: &FieldMap, b: &FieldMap) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.get(k).map(|w| v.deep_equal(w)).unwrap_or(false))
}

// Arithmetic. Integer operations wrap in two's complement; any Float
// operand promotes the result to Float; NULL propagates through every
// operator here.
impl FieldValue {
    pub fn add(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => {
                Ok(FieldValue::Integer(a.wrapping_add(*b)))
            }
            (FieldValue::Float(a), FieldValue::Float(b)) => Ok(FieldValue::Float(a + b)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => Ok(FieldValue::Float(*a as f64 + b)),
            (FieldValue::Float(a), FieldValue::Integer(b)) => Ok(FieldValue::Float(a + *b as f64)),
            (a, b) => Err(SqlError::type_mismatch(
                "numeric operands",
                format!("{} + {}", a.type_name(), b.type_name()),
            )),
        }
    }

    pub fn subtract(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => {
                Ok(FieldValue::Integer(a.wrapping_sub(*b)))
            }
            (FieldValue::Float(a), FieldValue::Float(b)) => Ok(FieldValue::Float(a - b)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => Ok(FieldValue::Float(*a as f64 - b)),
            (FieldValue::Float(a), FieldValue::Integer(b)) => Ok(FieldValue::Float(a - *b as f64)),
            (a, b) => Err(SqlError::type_mismatch(
                "numeric operands",
                format!("{} - {}", a.type_name(), b.type_name()),
            )),
        }
    }

    pub fn multiply(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => {
                Ok(FieldValue::Integer(a.wrapping_mul(*b)))
            }
            (FieldValue::Float(a), FieldValue::Float(b)) => Ok(FieldValue::Float(a * b)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => Ok(FieldValue::Float(*a as f64 * b)),
            (FieldValue::Float(a), FieldValue::Integer(b)) => Ok(FieldValue::Float(a * *b as f64)),
            (a, b) => Err(SqlError::type_mismatch(
                "numeric operands",
                format!("{} * {}", a.type_name(), b.type_name()),
            )),
        }
    }

    pub fn divide(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => {
                if *b == 0 {
                    Err(SqlError::DivisionByZero)
                } else {
                    Ok(FieldValue::Integer(a.wrapping_div(*b)))
                }
            }
            (FieldValue::Float(a), FieldValue::Float(b)) => Ok(FieldValue::Float(a / b)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => Ok(FieldValue::Float(*a as f64 / b)),
            (FieldValue::Float(a), FieldValue::Integer(b)) => Ok(FieldValue::Float(a / *b as f64)),
            (a, b) => Err(SqlError::type_mismatch(
                "numeric operands",
                format!("{} / {}", a.type_name(), b.type_name()),
            )),
        }
    }

    /// Modulo. Integer modulo uses truncated division; Float modulo is the
    /// IEEE-754 remainder (round-to-nearest-even quotient).
    pub fn modulo(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => {
                if *b == 0 {
                    Err(SqlError::DivisionByZero)
                } else {
                    Ok(FieldValue::Integer(a.wrapping_rem(*b)))
                }
            }
            (FieldValue::Float(a), FieldValue::Float(b)) => {
                Ok(FieldValue::Float(ieee_remainder(*a, *b)))
            }
            (FieldValue::Integer(a), FieldValue::Float(b)) => {
                Ok(FieldValue::Float(ieee_remainder(*a as f64, *b)))
            }
            (FieldValue::Float(a), FieldValue::Integer(b)) => {
                Ok(FieldValue::Float(ieee_remainder(*a, *b as f64)))
            }
            (a, b) => Err(SqlError::type_mismatch(
                "numeric operands",
                format!("{} % {}", a.type_name(), b.type_name()),
            )),
        }
    }

    /// Concatenation of strings or blobs
    pub fn concat(&self, other: &FieldValue) -> Result<FieldValue, SqlError> {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => Ok(FieldValue::Null),
            (FieldValue::String(a), FieldValue::String(b)) => {
                Ok(FieldValue::String(format!("{}{}", a, b)))
            }
            (FieldValue::Blob(a), FieldValue::Blob(b)) => {
                let mut joined = Vec::with_capacity(a.len() + b.len());
                joined.extend_from_slice(a);
                joined.extend_from_slice(b);
                Ok(FieldValue::Blob(joined))
            }
            (a, b) => Err(SqlError::type_mismatch(
                "two strings or two blobs",
                format!("{} || {}", a.type_name(), b.type_name()),
            )),
        }
    }

    /// Unary numeric negation
    pub fn neg(&self) -> Result<FieldValue, SqlError> {
        match self {
            FieldValue::Null => Ok(FieldValue::Null),
            FieldValue::Integer(i) => Ok(FieldValue::Integer(i.wrapping_neg())),
            FieldValue::Float(f) => Ok(FieldValue::Float(-f)),
            other => Err(SqlError::type_mismatch("numeric operand", other.type_name())),
        }
    }

    /// Cast this value to the given target type.
    ///
    /// NULL passes through every cast; a conversion that cannot be
    /// performed fails with `CastFailed`.
    pub fn cast_to(&self, target: TypeName) -> Result<FieldValue, SqlError> {
        if matches!(self, FieldValue::Null) {
            return Ok(FieldValue::Null);
        }
        match target {
            TypeName::Integer => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Integer(*i)),
                FieldValue::Float(f) => Ok(FieldValue::Integer(*f as i64)),
                FieldValue::Boolean(b) => Ok(FieldValue::Integer(if *b { 1 } else { 0 })),
                FieldValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .map_err(|_| SqlError::cast_failed(format!("'{}'", s), target.as_str())),
                FieldValue::Timestamp(ts) => Ok(FieldValue::Integer(ts.timestamp_micros())),
                other => Err(SqlError::cast_failed(other.type_name(), target.as_str())),
            },
            TypeName::Float => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Float(*i as f64)),
                FieldValue::Float(f) => Ok(FieldValue::Float(*f)),
                FieldValue::Boolean(b) => Ok(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
                FieldValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(FieldValue::Float)
                    .map_err(|_| SqlError::cast_failed(format!("'{}'", s), target.as_str())),
                other => Err(SqlError::cast_failed(other.type_name(), target.as_str())),
            },
            TypeName::String => match self {
                FieldValue::Blob(b) => String::from_utf8(b.clone())
                    .map(FieldValue::String)
                    .map_err(|_| SqlError::cast_failed("non-UTF-8 BLOB", target.as_str())),
                other => Ok(FieldValue::String(other.to_string())),
            },
            TypeName::Boolean => match self {
                FieldValue::Boolean(b) => Ok(FieldValue::Boolean(*b)),
                FieldValue::Integer(i) => Ok(FieldValue::Boolean(*i != 0)),
                FieldValue::Float(f) => Ok(FieldValue::Boolean(*f != 0.0)),
                FieldValue::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "t" | "1" => Ok(FieldValue::Boolean(true)),
                    "false" | "f" | "0" => Ok(FieldValue::Boolean(false)),
                    _ => Err(SqlError::cast_failed(format!("'{}'", s), target.as_str())),
                },
                other => Err(SqlError::cast_failed(other.type_name(), target.as_str())),
            },
            TypeName::Blob => match self {
                FieldValue::Blob(b) => Ok(FieldValue::Blob(b.clone())),
                FieldValue::String(s) => Ok(FieldValue::Blob(s.clone().into_bytes())),
                other => Err(SqlError::cast_failed(other.type_name(), target.as_str())),
            },
            TypeName::Timestamp => match self {
                FieldValue::Timestamp(ts) => Ok(FieldValue::Timestamp(*ts)),
                FieldValue::Integer(i) => DateTime::from_timestamp_micros(*i)
                    .map(FieldValue::Timestamp)
                    .ok_or_else(|| SqlError::cast_failed(i.to_string(), target.as_str())),
                FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
                    .map_err(|_| SqlError::cast_failed(format!("'{}'", s), target.as_str())),
                other => Err(SqlError::cast_failed(other.type_name(), target.as_str())),
            },
        }
    }
}

/// IEEE-754 remainder: `a - b * n` where `n` is `a / b` rounded to the
/// nearest integer, ties to even
fn ieee_remainder(a: f64, b: f64) -> f64 {
    a - b * (a / b).round_ties_even()
}

/// Custom Serialize implementation for FieldValue.
///
/// JSON mapping: Null/Boolean/Integer/Float/String map directly,
/// Timestamp serializes as an RFC 3339 string, Blob as base64 text, and
/// Array/Map nest. This matches how sink records leave the engine.
impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Blob(b) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            FieldValue::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for elem in arr {
                    seq.serialize_element(elem)?;
                }
                seq.end()
            }
            FieldValue::Map(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// Visitor for deserializing FieldValue from any self-describing format
struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a value (string, number, bool, null, array, or object)")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::Boolean(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if v <= i64::MAX as u64 {
            Ok(FieldValue::Integer(v as i64))
        } else {
            Ok(FieldValue::Float(v as f64))
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::String(v))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::Null)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(FieldValue::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut arr = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elem) = seq.next_element()? {
            arr.push(elem);
        }
        Ok(FieldValue::Array(arr))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = FieldMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry()? {
            fields.insert(key, value);
        }
        Ok(FieldValue::Map(fields))
    }
}

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(0);

/// One input record pushed by a source.
///
/// Tuples are immutable once ingested and are shared by reference between
/// the upstream source and the window buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    /// The field data for this tuple
    pub fields: FieldMap,
    /// Name of the stream this tuple arrived on
    pub input_name: String,
    /// Event timestamp; drives time-based windowing
    pub timestamp: DateTime<Utc>,
    /// Wall-clock time the engine accepted the tuple
    pub proc_timestamp: DateTime<Utc>,
    /// Monotonically assigned batch identifier
    pub batch_id: u64,
}

impl Tuple {
    /// Create a new Tuple with the given fields and event timestamp.
    ///
    /// The processing timestamp is stamped from the wall clock and the
    /// batch id is drawn from a process-wide monotonic counter.
    pub fn new(input_name: impl Into<String>, fields: FieldMap, timestamp: DateTime<Utc>) -> Self {
        Self {
            fields,
            input_name: input_name.into(),
            timestamp,
            proc_timestamp: Utc::now(),
            batch_id: NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a Tuple with every piece of metadata given explicitly.
    ///
    /// Used by replaying sources and tests that need fixed timestamps.
    pub fn with_metadata(
        input_name: impl Into<String>,
        fields: FieldMap,
        timestamp: DateTime<Utc>,
        proc_timestamp: DateTime<Utc>,
        batch_id: u64,
    ) -> Self {
        Self {
            fields,
            input_name: input_name.into(),
            timestamp,
            proc_timestamp,
            batch_id,
        }
    }
}

/// The row view presented to the expression evaluator for one tuple:
/// field values plus the event-timestamp accessor.
#[derive(Debug, Clone, Copy)]
pub struct RowBinding<'a> {
    pub fields: &'a FieldMap,
    pub timestamp: DateTime<Utc>,
}

impl<'a> RowBinding<'a> {
    pub fn from_tuple(tuple: &'a Tuple) -> Self {
        Self {
            fields: &tuple.fields,
            timestamp: tuple.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn map(entries: &[(&str, FieldValue)]) -> FieldMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        let v = FieldValue::Map(map(&[
            ("a", FieldValue::Integer(1)),
            ("b", FieldValue::String("x".to_string())),
        ]));
        assert_eq!(v.content_hash(), v.clone().content_hash());
    }

    #[test]
    fn test_content_hash_ignores_map_insertion_order() {
        let a = FieldValue::Map(map(&[
            ("x", FieldValue::Integer(1)),
            ("y", FieldValue::Integer(2)),
        ]));
        let b = FieldValue::Map(map(&[
            ("y", FieldValue::Integer(2)),
            ("x", FieldValue::Integer(1)),
        ]));
        assert!(a.deep_equal(&b));
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_map_content_hash_matches_wrapped_hash() {
        let m = map(&[
            ("a", FieldValue::Integer(1)),
            ("b", FieldValue::Float(2.5)),
        ]);
        assert_eq!(map_content_hash(&m), FieldValue::Map(m.clone()).content_hash());
    }

    #[test]
    fn test_integral_float_hashes_like_integer() {
        let i = FieldValue::Integer(42);
        let f = FieldValue::Float(42.0);
        assert!(i.deep_equal(&f));
        assert_eq!(i.content_hash(), f.content_hash());

        let frac = FieldValue::Float(42.5);
        assert!(!i.deep_equal(&frac));
    }

    #[test]
    fn test_discriminants_do_not_collide() {
        assert_ne!(
            FieldValue::Integer(1).content_hash(),
            FieldValue::Boolean(true).content_hash()
        );
        assert_ne!(
            FieldValue::String("1".to_string()).content_hash(),
            FieldValue::Integer(1).content_hash()
        );
    }

    #[test]
    fn test_integer_arithmetic_wraps() {
        let max = FieldValue::Integer(i64::MAX);
        let one = FieldValue::Integer(1);
        assert_eq!(max.add(&one).unwrap(), FieldValue::Integer(i64::MIN));

        let min = FieldValue::Integer(i64::MIN);
        assert_eq!(min.neg().unwrap(), FieldValue::Integer(i64::MIN));
    }

    #[test]
    fn test_float_operand_promotes() {
        let v = FieldValue::Integer(3).add(&FieldValue::Float(0.5)).unwrap();
        assert_eq!(v, FieldValue::Float(3.5));
    }

    #[test]
    fn test_null_propagates_through_arithmetic() {
        let null = FieldValue::Null;
        assert_eq!(
            FieldValue::Integer(1).add(&null).unwrap(),
            FieldValue::Null
        );
        assert_eq!(
            null.multiply(&FieldValue::Float(2.0)).unwrap(),
            FieldValue::Null
        );
        assert_eq!(
            null.concat(&FieldValue::String("x".to_string())).unwrap(),
            FieldValue::Null
        );
    }

    #[test]
    fn test_integer_division_by_zero() {
        let err = FieldValue::Integer(1)
            .divide(&FieldValue::Integer(0))
            .unwrap_err();
        assert_eq!(err, SqlError::DivisionByZero);
        let err = FieldValue::Integer(1)
            .modulo(&FieldValue::Integer(0))
            .unwrap_err();
        assert_eq!(err, SqlError::DivisionByZero);
    }

    #[test]
    fn test_integer_modulo_truncates() {
        assert_eq!(
            FieldValue::Integer(-7)
                .modulo(&FieldValue::Integer(2))
                .unwrap(),
            FieldValue::Integer(-1)
        );
    }

    #[test]
    fn test_float_modulo_is_ieee_remainder() {
        // 5.5 / 2.0 = 2.75, rounds to 3, remainder is -0.5
        let v = FieldValue::Float(5.5)
            .modulo(&FieldValue::Float(2.0))
            .unwrap();
        assert_eq!(v, FieldValue::Float(-0.5));
    }

    #[test]
    fn test_cast_string_to_integer() {
        let ok = FieldValue::String("12".to_string())
            .cast_to(TypeName::Integer)
            .unwrap();
        assert_eq!(ok, FieldValue::Integer(12));

        let err = FieldValue::String("twelve".to_string())
            .cast_to(TypeName::Integer)
            .unwrap_err();
        assert!(matches!(err, SqlError::CastFailed { .. }));
    }

    #[test]
    fn test_cast_null_passes_through() {
        assert_eq!(
            FieldValue::Null.cast_to(TypeName::Integer).unwrap(),
            FieldValue::Null
        );
    }

    #[test]
    fn test_blob_concat() {
        let joined = FieldValue::Blob(vec![1, 2])
            .concat(&FieldValue::Blob(vec![3]))
            .unwrap();
        assert_eq!(joined, FieldValue::Blob(vec![1, 2, 3]));
    }

    #[test]
    fn test_json_round_trip() {
        let record = FieldValue::Map(map(&[
            ("int", FieldValue::Integer(7)),
            ("float", FieldValue::Float(1.25)),
            ("str", FieldValue::String("abc".to_string())),
            ("flag", FieldValue::Boolean(true)),
            ("none", FieldValue::Null),
            (
                "nested",
                FieldValue::Array(vec![FieldValue::Integer(1), FieldValue::Integer(2)]),
            ),
        ]));
        let json = serde_json::to_string(&record).unwrap();
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert!(record.deep_equal(&back));
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2015, 4, 10, 10, 23, 0).unwrap();
        let json = serde_json::to_string(&FieldValue::Timestamp(ts)).unwrap();
        assert_eq!(json, "\"2015-04-10T10:23:00.000000Z\"");
    }

    #[test]
    fn test_blob_serializes_as_base64() {
        let json = serde_json::to_string(&FieldValue::Blob(vec![0xde, 0xad])).unwrap();
        assert_eq!(json, "\"3q0=\"");
    }

    #[test]
    fn test_batch_ids_are_monotonic() {
        let ts = Utc.with_ymd_and_hms(2015, 4, 10, 10, 23, 0).unwrap();
        let a = Tuple::new("s", FieldMap::new(), ts);
        let b = Tuple::new("s", FieldMap::new(), ts);
        assert!(b.batch_id > a.batch_id);
    }
}
