use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSession {
    pub hash: String,
    pub time: String,
    pub subject: String,
    pub room: Option<String>,
    pub join_url: Option<String>,
    pub instructor: Option<String>,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    pub start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinClassRequest {
    pub lecture_slot_hash: String,
}

#[derive(Debug, Serialize)]
pub struct JoinClassResponse {
    pub join_url: String,
    pub status: String,
}
