use serde::{Deserialize, Serialize};

/// Scheduling identity, distinct from the authentication user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreateInput {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
