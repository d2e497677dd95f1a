use serde::{Deserialize, Serialize};

/// Lifecycle tag carried by every soft-deletable record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Deleted,
}

impl RecordStatus {
    /// Column value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(RecordStatus::Active),
            "deleted" => Some(RecordStatus::Deleted),
            _ => None,
        }
    }
}

/// Which records a list query returns.
///
/// Every list query states its visibility explicitly; there is no implicit
/// global filter on deleted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    ActiveOnly,
    IncludeDeleted,
    DeletedOnly,
}

impl Visibility {
    /// Returns `true` if a record with `status` is visible.
    pub fn admits(&self, status: RecordStatus) -> bool {
        match self {
            Visibility::ActiveOnly => status == RecordStatus::Active,
            Visibility::IncludeDeleted => true,
            Visibility::DeletedOnly => status == RecordStatus::Deleted,
        }
    }
}
