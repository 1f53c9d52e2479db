use anyhow::anyhow;
use tracing::{error, info, instrument};

use super::dto::{
    AssignmentDetail, AssignmentListItem, AssignmentStatusResponse, QuestionDetail, QuestionResult,
    SolvedAnswer,
};
use crate::{
    error::ApiError,
    platform::{Assignment, CookieJar, PlatformApi, Question},
    solver::Solver,
};

pub struct ListFilter<'a> {
    pub course_hash: Option<&'a str>,
    pub status: Option<&'a str>,
    pub difficulty: Option<&'a str>,
    pub limit: u32,
}

fn list_item(a: Assignment, course_hash: &str) -> AssignmentListItem {
    AssignmentListItem {
        status: if a.is_completed { "completed" } else { "pending" }.into(),
        hash: a.hash,
        title: a.title,
        kind: a.kind.unwrap_or_else(|| "mixed".into()),
        due_date: a.due_date,
        questions_total: a.questions_count,
        questions_solved: a.questions_solved,
        xp: a.xp,
        difficulty: a.difficulty,
        course_hash: course_hash.to_string(),
    }
}

fn keep(item: &AssignmentListItem, filter: &ListFilter<'_>) -> bool {
    if let Some(status) = filter.status {
        if item.status != status {
            return false;
        }
    }
    if let Some(difficulty) = filter.difficulty {
        if item.difficulty.as_deref() != Some(difficulty) {
            return false;
        }
    }
    true
}

/// Walks every selected course in turn; a course that fails is logged and skipped.
#[instrument(skip(platform, cookies, filter), fields(course = ?filter.course_hash, limit = filter.limit))]
pub async fn list_assignments(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    filter: &ListFilter<'_>,
) -> Result<Vec<AssignmentListItem>, ApiError> {
    let course_hashes: Vec<String> = match filter.course_hash {
        Some(h) => vec![h.to_string()],
        None => platform
            .courses(cookies)
            .await?
            .into_iter()
            .filter_map(|c| c.hash)
            .collect(),
    };

    let mut items = Vec::new();
    for course in &course_hashes {
        match platform.assignments(cookies, course, filter.limit, 0).await {
            Ok(assignments) => items.extend(
                assignments
                    .into_iter()
                    .map(|a| list_item(a, course))
                    .filter(|item| keep(item, filter)),
            ),
            Err(e) => {
                error!(course = %course, error = %e, "fetching assignments failed; skipping course");
            }
        }
    }

    items.truncate(filter.limit as usize);
    Ok(items)
}

fn question_detail(q: &Question) -> QuestionDetail {
    QuestionDetail {
        hash: q.hash.clone(),
        text: q.text.clone(),
        kind: q.kind.clone().unwrap_or_else(|| "mcq".into()),
        options: Some(q.options.clone()),
        solved: q.is_solved,
        correct: q.is_correct,
    }
}

#[instrument(skip(platform, cookies))]
pub async fn assignment_detail(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    course: &str,
    assignment: &str,
) -> Result<AssignmentDetail, ApiError> {
    let details = platform.assignment_details(cookies, course, assignment).await?;

    let questions = match details.assessment_hash() {
        Some(assessment) => platform
            .assessment_questions(cookies, course, assessment)
            .await?
            .questions
            .iter()
            .map(question_detail)
            .collect(),
        None => Vec::new(),
    };

    Ok(AssignmentDetail {
        hash: details.hash,
        title: details.title,
        description: details.description,
        kind: details.kind.unwrap_or_else(|| "mixed".into()),
        questions,
        due_date: details.due_date,
        xp: details.xp,
        difficulty: details.difficulty,
    })
}

#[instrument(skip(platform, cookies))]
pub async fn assignment_status(
    platform: &dyn PlatformApi,
    cookies: &CookieJar,
    course: &str,
    assignment: &str,
) -> Result<AssignmentStatusResponse, ApiError> {
    let a = platform.assignment_details(cookies, course, assignment).await?;
    Ok(AssignmentStatusResponse {
        solved: a.questions_solved,
        total: a.questions_count,
        score: a.score,
        submitted: a.is_completed,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Mcq,
    Coding,
    Frontend,
}

/// Front-end checks come before coding so `front_end_playground` is not
/// mistaken for a coding playground.
pub fn classify(kind: &str) -> Option<QuestionKind> {
    let kind = kind.to_lowercase();
    if kind == "mcq" || kind == "single_choice" {
        Some(QuestionKind::Mcq)
    } else if kind.contains("frontend") || kind.contains("front_end") || kind.contains("html") {
        Some(QuestionKind::Frontend)
    } else if kind.contains("coding") || kind.contains("playground") {
        Some(QuestionKind::Coding)
    } else {
        None
    }
}

pub struct SolveOutcome {
    pub assessment_hash: String,
    pub xp: i64,
    pub results: Vec<QuestionResult>,
}

/// Generates answers for an assignment's questions one at a time. A question
/// that fails becomes a failed entry and the loop moves on.
#[instrument(skip(platform, solver, cookies, only))]
pub async fn solve_assignment(
    platform: &dyn PlatformApi,
    solver: &Solver,
    cookies: &CookieJar,
    course: &str,
    assignment: &str,
    only: Option<&[String]>,
) -> Result<SolveOutcome, ApiError> {
    let details = platform.assignment_details(cookies, course, assignment).await?;
    let assessment_hash = details
        .assessment_hash()
        .ok_or_else(|| ApiError::BadRequest("Assignment has no assessment".into()))?
        .to_string();

    let mut questions = platform
        .assessment_questions(cookies, course, &assessment_hash)
        .await?
        .questions;
    // an empty selection means every question
    if let Some(only) = only.filter(|o| !o.is_empty()) {
        questions.retain(|q| only.contains(&q.hash));
    }

    let mut results = Vec::with_capacity(questions.len());
    for question in &questions {
        match solve_question(platform, solver, cookies, course, question).await {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {
                info!(question = %question.hash, kind = %question.kind_or_default(), "question skipped");
            }
            Err(e) => {
                error!(question = %question.hash, error = %e, "solving question failed");
                results.push(QuestionResult::failed(&question.hash, &e));
            }
        }
    }

    Ok(SolveOutcome {
        assessment_hash,
        xp: details.xp,
        results,
    })
}

/// `Ok(None)` for question types the solver does not handle or playgrounds
/// without a hash.
async fn solve_question(
    platform: &dyn PlatformApi,
    solver: &Solver,
    cookies: &CookieJar,
    course: &str,
    question: &Question,
) -> anyhow::Result<Option<QuestionResult>> {
    let Some(kind) = classify(&question.kind_or_default()) else {
        return Ok(None);
    };

    let result = match kind {
        QuestionKind::Mcq => {
            let ans = solver.mcq(&question.text, &question.options, None).await?;
            QuestionResult {
                question_hash: question.hash.clone(),
                solved: true,
                answer: Some(SolvedAnswer::Text(ans.answer)),
                confidence: Some(ans.confidence),
                explanation: Some(ans.explanation),
            }
        }
        QuestionKind::Coding => {
            let Some(pg) = question.playground_hash() else {
                return Ok(None);
            };
            let playground = platform.coding_playground(cookies, course, pg).await?;
            let problem = statement(playground.problem_statement, &question.text)?;
            let code = solver.coding(&problem, None, None, "python").await?;
            QuestionResult {
                question_hash: question.hash.clone(),
                solved: true,
                answer: Some(SolvedAnswer::Text(code)),
                confidence: None,
                explanation: Some("Code solution generated".into()),
            }
        }
        QuestionKind::Frontend => {
            let Some(pg) = question.playground_hash() else {
                return Ok(None);
            };
            let playground = platform.frontend_playground(cookies, course, pg).await?;
            let requirements = statement(playground.problem_statement, &question.text)?;
            let fe = solver.frontend(&requirements, None).await?;
            QuestionResult {
                question_hash: question.hash.clone(),
                solved: true,
                answer: Some(SolvedAnswer::Frontend {
                    html: fe.html,
                    css: fe.css,
                    js: fe.javascript,
                }),
                confidence: None,
                explanation: Some("Frontend solution generated".into()),
            }
        }
    };
    Ok(Some(result))
}

fn statement(problem: Option<String>, fallback: &str) -> anyhow::Result<String> {
    match problem.filter(|p| !p.trim().is_empty()) {
        Some(p) => Ok(p),
        None if !fallback.trim().is_empty() => Ok(fallback.to_string()),
        None => Err(anyhow!("playground has no problem statement")),
    }
}
