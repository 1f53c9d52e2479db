//! Wire shapes of the platform's REST API.
//!
//! The upstream payloads are loosely typed: fields go missing or arrive as
//! `null` depending on the course. Everything here tolerates both and falls
//! back to the type's default.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HashRef {
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseDetails {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Assignment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions_solved: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub xp: i64,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub assessment: Option<HashRef>,
}

impl Assignment {
    pub fn assessment_hash(&self) -> Option<&str> {
        self.assessment.as_ref()?.hash.as_deref()
    }
}

/// The assignment listing is paginated on some deployments and a bare list on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssignmentPage {
    Paged {
        #[serde(default)]
        results: Vec<Assignment>,
    },
    List(Vec<Assignment>),
}

impl AssignmentPage {
    pub fn into_vec(self) -> Vec<Assignment> {
        match self {
            AssignmentPage::Paged { results } => results,
            AssignmentPage::List(items) => items,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_solved: bool,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub playground: Option<HashRef>,
}

impl Question {
    pub fn kind_or_default(&self) -> String {
        self.kind.as_deref().unwrap_or("mcq").to_lowercase()
    }

    pub fn playground_hash(&self) -> Option<&str> {
        self.playground.as_ref()?.hash.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Assessment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LectureSlot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_timestamp: i64,
    #[serde(default)]
    pub lecture: Option<Named>,
    #[serde(default)]
    pub room: Option<Named>,
    #[serde(default)]
    pub instructor: Option<Named>,
    #[serde(default)]
    pub join_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playground {
    #[serde(default)]
    pub problem_statement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Performance {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attendance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignments_completed: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_xp: i64,
    #[serde(default)]
    pub quizzes_completed: Option<f64>,
}
