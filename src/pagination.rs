//! Common query parameters for paging list endpoints.

use serde::Deserialize;

/// The page size used when a request does not specify one.
const DEFAULT_LIMIT: u64 = 100;

/// Skip/limit paging parameters, deserialized from a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// How many items to skip from the start of the result.
    #[serde(default)]
    pub skip: u64,
    /// The maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Apply the paging window to an in-memory result set.
    ///
    /// Used by endpoints that merge rows from several sources and therefore
    /// cannot page in SQL.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}
