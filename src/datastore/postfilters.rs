//! Ways to filter posts based on their fields. Filter semantics work just like SQL:
//! If a field is unset, its filter won't be applied.
//! If set, filter out posts that don't match the filter.
use serde::Deserialize;
use uuid::Uuid;

/// Filters that can be applied to queries on the datastore.
/// A feed scope resolves into exactly one of these.
#[derive(Default, Clone, Deserialize, Debug, Eq, PartialEq)]
pub struct PostFilters {
    pub author_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    /// Matches posts whose author is any of these users. An empty vec matches nothing.
    pub author_in: Option<Vec<Uuid>>,
    pub text_contains: Option<String>,
}
