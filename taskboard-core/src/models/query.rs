//! Filtering and ordering for task lists.
//!
//! Raw query-string parameters are normalised into a [`TaskQuery`], never
//! rejected: an unknown sort field falls back to `created_at` descending, and
//! any sort order other than `asc` means descending.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::task::{Task, TaskStatus};

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl ListParams {
    /// Build from raw query pairs. The first occurrence of a key wins and
    /// unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "status" => &mut params.status,
                "sortBy" => &mut params.sort_by,
                "sortOrder" => &mut params.sort_order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    Any,
    Only(TaskStatus),
    /// A status no task can have. Matches nothing.
    Unmatched(String),
}

impl StatusFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("all") => Self::Any,
            Some(s) => match TaskStatus::from_str(s) {
                Some(status) => Self::Only(status),
                None => Self::Unmatched(s.to_string()),
            },
        }
    }

    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => *wanted == status,
            Self::Unmatched(_) => false,
        }
    }

    fn as_param(&self) -> Option<String> {
        match self {
            Self::Any => None,
            Self::Only(status) => Some(status.as_str().to_string()),
            Self::Unmatched(raw) => Some(raw.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Normalised list query. Also used as the client cache key, so two raw
/// parameter sets that mean the same thing share one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskQuery {
    pub status: StatusFilter,
    pub sort: TaskSort,
}

impl TaskQuery {
    pub fn from_params(params: &ListParams) -> Self {
        let direction = match params.sort_order.as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        let (field, direction) = match params.sort_by.as_deref() {
            None | Some("") => (SortField::CreatedAt, direction),
            Some(raw) => match SortField::from_str(raw) {
                Some(field) => (field, direction),
                // An unrecognised field also discards the requested order.
                None => (SortField::CreatedAt, SortDirection::Desc),
            },
        };

        Self {
            status: StatusFilter::parse(params.status.as_deref()),
            sort: TaskSort { field, direction },
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = TaskSort { field, direction };
        self
    }

    /// Render back into query-string parameters.
    pub fn to_params(&self) -> ListParams {
        ListParams {
            status: self.status.as_param(),
            sort_by: Some(self.sort.field.as_str().to_string()),
            sort_order: Some(self.sort.direction.as_str().to_string()),
        }
    }

    /// SQL `WHERE` body and its positional parameters.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        match self.status.as_param() {
            Some(status) => ("deleted_at IS NULL AND status = ?1".to_string(), vec![status]),
            None => ("deleted_at IS NULL".to_string(), Vec::new()),
        }
    }

    /// SQL `ORDER BY` body. Ties break on `id` in the same direction.
    pub fn order_clause(&self) -> String {
        let dir = self.sort.direction.sql();
        format!("{} {}, id {}", self.sort.field.as_str(), dir, dir)
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.is_live() && self.status.matches(task.status)
    }

    /// Ordering consistent with [`order_clause`](Self::order_clause).
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.sort.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.cmp(&b.title),
        }
        .then(a.id.cmp(&b.id));

        match self.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn sort_tasks(&self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}
