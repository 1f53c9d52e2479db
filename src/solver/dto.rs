use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn python() -> String {
    "python".into()
}

#[derive(Debug, Deserialize)]
pub struct McqSolveRequest {
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct McqSolveResponse {
    pub answer: String,
    pub confidence: f64,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct CodingSolveRequest {
    pub problem: String,
    #[serde(default = "python")]
    pub language: String,
    pub test_cases: Option<String>,
    pub constraints: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct FrontendSolveRequest {
    pub requirements: String,
    pub reference_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FrontendSolveResponse {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

#[derive(Debug, Deserialize)]
pub struct FixCodeRequest {
    pub code: String,
    pub error: String,
    #[serde(default = "python")]
    pub language: String,
}
