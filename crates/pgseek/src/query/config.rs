use serde::{Deserialize, Serialize};

/// Accumulated clause state of a [`Query`](super::Query).
///
/// Fragments are caller-supplied SQL and are rendered verbatim; empty strings
/// and zero limits/offsets are omitted from the statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// SELECT column expressions; empty renders `*`.
    pub select_fields: Vec<String>,
    /// WHERE predicate fragment.
    pub where_clause: String,
    /// ORDER BY fragment.
    pub order_by: String,
    pub limit: usize,
    pub offset: usize,
    /// JOIN fragments in call order.
    pub join_clauses: Vec<String>,
    pub group_by: String,
    pub having: String,
    /// Append `FOR UPDATE`.
    pub for_update: bool,
}
