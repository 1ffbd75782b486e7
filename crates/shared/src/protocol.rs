use serde::{Deserialize, Serialize};

use crate::domain::Volunteer;

/// Roster query issued for every page; `cursor` is the number of volunteers
/// the caller already holds.
pub const VOLUNTEERS_QUERY: &str = "query Get($cursor: Int) { \
users(cursor: $cursor) { id firstName lastName email } \
userAggregates { totalCount } }";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: CursorVariables,
}

impl GraphqlRequest {
    pub fn volunteers(cursor: usize) -> Self {
        Self {
            query: VOLUNTEERS_QUERY.to_string(),
            variables: CursorVariables { cursor },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorVariables {
    pub cursor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteersPayload {
    pub users: Vec<Volunteer>,
    pub user_aggregates: UserAggregates,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregates {
    pub total_count: usize,
}
