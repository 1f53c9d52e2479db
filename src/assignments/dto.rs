use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub course_hash: Option<String>,
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn limit(&self) -> Option<u32> {
        match self.limit {
            None => Some(DEFAULT_LIMIT),
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => Some(l as u32),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub course_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentListItem {
    pub hash: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub due_date: Option<String>,
    pub questions_total: i64,
    pub questions_solved: i64,
    pub xp: i64,
    pub difficulty: Option<String>,
    pub status: String,
    pub course_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub hash: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Option<BTreeMap<String, String>>,
    pub solved: bool,
    pub correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDetail {
    pub hash: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub questions: Vec<QuestionDetail>,
    pub due_date: Option<String>,
    pub xp: i64,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMode {
    /// Answers come back to the caller; nothing is sent to the platform.
    #[default]
    Learning,
    AutoSubmit,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolveRequest {
    #[serde(default)]
    pub mode: SolveMode,
    /// Restrict solving to these question hashes.
    #[serde(default)]
    pub questions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SolvedAnswer {
    Text(String),
    Frontend { html: String, css: String, js: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_hash: String,
    pub solved: bool,
    pub answer: Option<SolvedAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
}

impl QuestionResult {
    pub fn failed(question_hash: &str, error: &anyhow::Error) -> Self {
        Self {
            question_hash: question_hash.to_string(),
            solved: false,
            answer: None,
            confidence: None,
            explanation: Some(format!("Error: {error:#}")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SolveResponse {
    pub status: String,
    pub mode: String,
    pub results: Vec<QuestionResult>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentStatusResponse {
    pub solved: i64,
    pub total: i64,
    pub score: Option<f64>,
    pub submitted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limit_bounds() {
        let q = |limit| ListQuery {
            limit,
            ..Default::default()
        };
        assert_eq!(q(None).limit(), Some(100));
        assert_eq!(q(Some(1)).limit(), Some(1));
        assert_eq!(q(Some(500)).limit(), Some(500));
        assert_eq!(q(Some(0)).limit(), None);
        assert_eq!(q(Some(501)).limit(), None);
    }

    #[test]
    fn solve_request_defaults_to_learning() {
        let req: SolveRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.mode, SolveMode::Learning);
        assert!(req.questions.is_none());

        let req: SolveRequest =
            serde_json::from_value(json!({"mode": "auto_submit", "questions": ["q1"]})).unwrap();
        assert_eq!(req.mode, SolveMode::AutoSubmit);
    }

    #[test]
    fn answers_serialize_like_the_frontend_expects() {
        let text = serde_json::to_value(SolvedAnswer::Text("B".into())).unwrap();
        assert_eq!(text, json!("B"));
        let fe = serde_json::to_value(SolvedAnswer::Frontend {
            html: "<p></p>".into(),
            css: "".into(),
            js: "".into(),
        })
        .unwrap();
        assert_eq!(fe, json!({"html": "<p></p>", "css": "", "js": ""}));
    }

    #[test]
    fn failed_result_carries_error() {
        let r = QuestionResult::failed("q9", &anyhow::anyhow!("timeout"));
        assert!(!r.solved);
        assert_eq!(r.explanation.as_deref(), Some("Error: timeout"));
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("confidence").is_none());
    }
}
