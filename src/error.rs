// ⚠️ Fault taxonomy for the registry engine
// Every fault degrades to a message plus a safe fallback at the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Persisted value is missing its medium or is not well-formed JSON
    #[error("Storage fault on '{collection}': {reason}")]
    Storage { collection: String, reason: String },

    /// Required field missing or out of range
    #[error("Missing or invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Non-spreadsheet uploads were rejected at the boundary
    #[error("{rejected} file(s) rejected: only Excel files (.xlsx, .xls) are accepted")]
    FileType { rejected: usize },

    /// Any input failed to parse, or the merged output failed to serialize
    #[error("Merge failed on {input}: {reason}. Check the files and try again")]
    Merge { input: String, reason: String },

    /// Actor tried to touch a record outside its family/tribe
    #[error("Access denied: {0}")]
    Access(String),

    #[error("No {collection} record with id '{id}'")]
    NotFound { collection: String, id: String },
}

impl RegistryError {
    pub fn storage(collection: &str, reason: impl ToString) -> Self {
        RegistryError::Storage {
            collection: collection.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(field: &str, reason: impl ToString) -> Self {
        RegistryError::Validation {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn merge(input: impl ToString, reason: impl ToString) -> Self {
        RegistryError::Merge {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        RegistryError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Short title for a user-facing notice
    pub fn title(&self) -> &'static str {
        match self {
            RegistryError::Storage { .. } => "Storage error",
            RegistryError::Validation { .. } => "Missing information",
            RegistryError::FileType { .. } => "Some files were ignored",
            RegistryError::Merge { .. } => "Merge failed",
            RegistryError::Access(_) => "Not allowed",
            RegistryError::NotFound { .. } => "Not found",
        }
    }
}
