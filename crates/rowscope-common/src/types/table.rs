//! Table descriptors.

use serde::{Deserialize, Serialize};

use super::id::TableId;

/// Identifies the table a count request targets.
///
/// The descriptor is supplied by the caller and never mutated. When
/// `schema` is `None` the table name is resolved through the connection's
/// default (its `search_path`, or a configured default schema).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Catalog identifier of the table.
    pub id: TableId,
    /// Table name, unquoted.
    pub name: String,
    /// Schema name, unquoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl TableDescriptor {
    /// Creates a descriptor without an explicit schema.
    #[must_use]
    pub fn new(id: impl Into<TableId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: None,
        }
    }

    /// Sets the schema name.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}
