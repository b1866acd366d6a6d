//! Stable cache keys.
//!
//! A key is a BLAKE3 digest over the operation name and its arguments,
//! serialized to JSON with object keys sorted at every level. Two logically
//! identical requests always produce the same key regardless of field order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    operation: String,
    digest: String,
}

impl CacheKey {
    /// Key for `operation` called with `args`.
    pub fn new<A: Serialize + ?Sized>(operation: &str, args: &A) -> Result<Self, CacheError> {
        let value = serde_json::to_value(args)?;
        let mut canonical = String::new();
        write_canonical(&value, &mut canonical)?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(operation.as_bytes());
        hasher.update(&[0]);
        hasher.update(canonical.as_bytes());
        Ok(Self {
            operation: operation.to_owned(),
            digest: hex::encode(hasher.finalize().as_bytes()),
        })
    }

    /// Rebuild a key from stored parts.
    pub(crate) fn from_parts(operation: String, digest: String) -> Self {
        Self { operation, digest }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Hex digest (64 characters).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Approximate heap footprint, counted against tier byte budgets.
    pub(crate) fn size_bytes(&self) -> usize {
        self.operation.len() + self.digest.len()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operation, &self.digest[..16.min(self.digest.len())])
    }
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), CacheError> {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(k)?);
                out.push(':');
                write_canonical(v, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn field_order_does_not_matter() {
        let a = CacheKey::new("transit", &json!({"body": "mars", "target": 90.0})).unwrap();
        let b = CacheKey::new("transit", &json!({"target": 90.0, "body": "mars"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn operation_is_part_of_key() {
        let args = json!({"start": 2451545.0});
        let a = CacheKey::new("transit", &args).unwrap();
        let b = CacheKey::new("ingress", &args).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn nested_objects_are_canonical() {
        let a = CacheKey::new("op", &json!({"x": {"b": 1, "a": [2, {"d": 3, "c": 4}]}})).unwrap();
        let b = CacheKey::new("op", &json!({"x": {"a": [2, {"c": 4, "d": 3}], "b": 1}})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_args_differ() {
        let a = CacheKey::new("op", &(1.0, 2.0)).unwrap();
        let b = CacheKey::new("op", &(2.0, 1.0)).unwrap();
        assert_ne!(a, b);
    }
}
