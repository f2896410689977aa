//! ICD-10-CM description lookup.

mod clinical_tables;
mod code;

pub use clinical_tables::{ClinicalTablesClient, ClinicalTablesConfig};
pub use code::{lookup_candidates, normalize_code};

/// Resolves a diagnosis code to its official description.
#[async_trait::async_trait]
pub trait CodeLookup: Send + Sync {
    /// Returns the description for `code`, or `None` when nothing matched or
    /// the lookup failed.
    async fn describe(&self, code: &str) -> Option<String>;
}
