use serde::{Deserialize, Serialize};

use crate::newsletter::repo_types::SubscriberStats;

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: SubscriberStats,
}
