//! Schema fingerprinting
//!
//! A fingerprint is a SHA-256 digest over the canonical JSON serialization
//! of one schema's IR. The IR's containers are `BTreeMap`s, so serde emits
//! keys in sorted order and the serialization is canonical without a
//! separate normalization pass. Any change the differ can detect changes
//! the digest; two IRs with equal fingerprints diff to nothing.

use crate::error::{Error, Result};
use crate::ir::{Ir, Schema};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest of one schema's contents
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub algorithm: String,
    pub hash: String,
}

impl Fingerprint {
    /// Compute the fingerprint of `target_schema` within the IR.
    ///
    /// A schema absent from the IR hashes its empty canonical form, so a
    /// plan against a not-yet-created schema still carries a stable digest.
    pub fn compute(ir: &Ir, target_schema: &str) -> Result<Self> {
        let empty;
        let schema = match ir.schema(target_schema) {
            Some(s) => s,
            None => {
                empty = Schema::new(target_schema);
                &empty
            }
        };
        let canonical = serde_json::to_vec(schema)?;
        let digest = Sha256::digest(&canonical);
        let hash = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(Self {
            algorithm: "sha256".to_string(),
            hash,
        })
    }

    /// Fail with a drift error when two fingerprints differ
    pub fn compare(expected: &Fingerprint, actual: &Fingerprint) -> Result<()> {
        if expected != actual {
            return Err(Error::FingerprintMismatch {
                expected: expected.hash.clone(),
                actual: actual.hash.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Table;

    fn ir_with_table(table: &str) -> Ir {
        let mut ir = Ir::default();
        let mut schema = Schema::new("public");
        schema.tables.insert(
            table.to_string(),
            Table {
                schema: "public".to_string(),
                name: table.to_string(),
                ..Default::default()
            },
        );
        ir.schemas.insert("public".to_string(), schema);
        ir
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let ir = ir_with_table("users");
        let a = Fingerprint::compute(&ir, "public").unwrap();
        let b = Fingerprint::compute(&ir, "public").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.algorithm, "sha256");
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_fingerprint_detects_changes() {
        let a = Fingerprint::compute(&ir_with_table("users"), "public").unwrap();
        let b = Fingerprint::compute(&ir_with_table("orders"), "public").unwrap();
        assert_ne!(a, b);
        assert!(Fingerprint::compare(&a, &b).is_err());
    }

    #[test]
    fn test_missing_schema_hashes_empty_form() {
        let ir = Ir::default();
        let a = Fingerprint::compute(&ir, "public").unwrap();
        let b = Fingerprint::compute(&ir, "public").unwrap();
        assert_eq!(a, b);
    }
}
