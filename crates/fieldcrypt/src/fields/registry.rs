//! Static field declarations, keyed by document type.

use std::collections::BTreeMap;

use crate::error::UnknownDocumentType;

use super::path::FieldPath;

/// Ordered, deduplicated field declarations per document type.
///
/// Declarations are compiled into the binary and change only via deployment;
/// nothing here is derived from the data being scanned.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    types: BTreeMap<String, Vec<FieldPath>>,
}

impl FieldRegistry {
    /// An empty registry; add types with [`declare`](Self::declare).
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// The built-in declarations for the account dashboard's collections.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.declare(
            "users",
            &[
                "kycData.fullName",
                "kycData.dateOfBirth",
                "kycData.nationality",
                "kycData.address",
                "kycData.idNumber",
            ],
        );
        reg.declare(
            "kycrequests",
            &[
                "fields.fullName",
                "fields.dateOfBirth",
                "fields.nationality",
                "fields.address",
                "fields.idNumber",
            ],
        );
        reg.declare("withdrawalrequests", &["toAddress"]);
        reg.declare("depositrequests", &["txHash"]);
        reg.declare(
            "transactions",
            &[
                "metadata.walletAddress",
                "metadata.toAddress",
                "metadata.txHash",
            ],
        );
        reg.declare("withdrawalcertificates", &["userName", "toAddress"]);
        reg
    }

    /// Declare the encrypted fields for a document type, replacing any
    /// earlier declaration. Order is preserved; repeated paths are dropped.
    pub fn declare(&mut self, doc_type: &str, paths: &[&str]) {
        let mut list: Vec<FieldPath> = Vec::with_capacity(paths.len());
        for raw in paths {
            if !list.iter().any(|p| p.as_str() == *raw) {
                list.push(FieldPath::parse(raw));
            }
        }
        self.types.insert(doc_type.to_owned(), list);
    }

    /// The declared paths for `doc_type`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownDocumentType`] for a type never declared — calling
    /// the engine for an unconfigured type is a programmer error.
    pub fn fields_for(&self, doc_type: &str) -> Result<&[FieldPath], UnknownDocumentType> {
        self.types
            .get(doc_type)
            .map(Vec::as_slice)
            .ok_or_else(|| UnknownDocumentType(doc_type.to_owned()))
    }

    /// All declared document types, in stable (sorted) order.
    pub fn document_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Number of declared document types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_all_dashboard_collections() {
        let reg = FieldRegistry::builtin();
        let types: Vec<&str> = reg.document_types().collect();
        assert_eq!(
            types,
            vec![
                "depositrequests",
                "kycrequests",
                "transactions",
                "users",
                "withdrawalcertificates",
                "withdrawalrequests",
            ]
        );
    }

    #[test]
    fn fields_are_returned_in_declaration_order() {
        let reg = FieldRegistry::builtin();
        let paths: Vec<&str> = reg
            .fields_for("users")
            .unwrap()
            .iter()
            .map(FieldPath::as_str)
            .collect();
        assert_eq!(paths[0], "kycData.fullName");
        assert_eq!(paths.last().copied(), Some("kycData.idNumber"));
    }

    #[test]
    fn unknown_type_is_a_loud_error() {
        let reg = FieldRegistry::builtin();
        let err = reg.fields_for("supporttickets").unwrap_err();
        assert!(err.to_string().contains("supporttickets"));
    }

    #[test]
    fn declare_deduplicates_preserving_first_position() {
        let mut reg = FieldRegistry::new();
        reg.declare("t", &["a.b", "c", "a.b", "d"]);
        let paths: Vec<&str> = reg
            .fields_for("t")
            .unwrap()
            .iter()
            .map(FieldPath::as_str)
            .collect();
        assert_eq!(paths, vec!["a.b", "c", "d"]);
    }

    #[test]
    fn declare_replaces_earlier_declaration() {
        let mut reg = FieldRegistry::new();
        reg.declare("t", &["a"]);
        reg.declare("t", &["b"]);
        let paths: Vec<&str> = reg
            .fields_for("t")
            .unwrap()
            .iter()
            .map(FieldPath::as_str)
            .collect();
        assert_eq!(paths, vec!["b"]);
        assert_eq!(reg.len(), 1);
    }
}
