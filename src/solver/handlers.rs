use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    error::ApiError,
    solver::dto::{
        CodeResponse, CodingSolveRequest, FixCodeRequest, FrontendSolveRequest, FrontendSolveResponse,
        McqSolveRequest, McqSolveResponse,
    },
    state::AppState,
};

pub fn solver_routes() -> Router<AppState> {
    Router::new()
        .route("/mcq", post(solve_mcq))
        .route("/coding", post(solve_coding))
        .route("/frontend", post(solve_frontend))
        .route("/fix", post(fix_code))
}

fn failed(what: &str) -> impl FnOnce(anyhow::Error) -> ApiError + '_ {
    move |e| ApiError::Internal(format!("Failed to {what}: {e:#}"))
}

#[instrument(skip(state, payload), fields(options = payload.options.len()))]
pub async fn solve_mcq(
    State(state): State<AppState>,
    Json(payload): Json<McqSolveRequest>,
) -> Result<Json<McqSolveResponse>, ApiError> {
    let solver = state.solver()?;
    if payload.options.is_empty() {
        return Err(ApiError::BadRequest("options must not be empty".into()));
    }
    let ans = solver
        .mcq(&payload.question, &payload.options, payload.context.as_deref())
        .await
        .map_err(failed("solve MCQ"))?;
    Ok(Json(McqSolveResponse {
        answer: ans.answer,
        confidence: ans.confidence,
        explanation: ans.explanation,
    }))
}

#[instrument(skip(state, payload), fields(language = %payload.language))]
pub async fn solve_coding(
    State(state): State<AppState>,
    Json(payload): Json<CodingSolveRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    let solver = state.solver()?;
    let code = solver
        .coding(
            &payload.problem,
            payload.test_cases.as_deref(),
            payload.constraints.as_deref(),
            &payload.language,
        )
        .await
        .map_err(failed("solve coding problem"))?;
    Ok(Json(CodeResponse {
        code,
        language: payload.language,
    }))
}

#[instrument(skip(state, payload))]
pub async fn solve_frontend(
    State(state): State<AppState>,
    Json(payload): Json<FrontendSolveRequest>,
) -> Result<Json<FrontendSolveResponse>, ApiError> {
    let solver = state.solver()?;
    let fe = solver
        .frontend(&payload.requirements, payload.reference_image.as_deref())
        .await
        .map_err(failed("solve frontend problem"))?;
    Ok(Json(FrontendSolveResponse {
        html: fe.html,
        css: fe.css,
        javascript: fe.javascript,
    }))
}

#[instrument(skip(state, payload), fields(language = %payload.language))]
pub async fn fix_code(
    State(state): State<AppState>,
    Json(payload): Json<FixCodeRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    let solver = state.solver()?;
    let code = solver
        .fix_code(&payload.code, &payload.error, &payload.language)
        .await
        .map_err(failed("fix code"))?;
    Ok(Json(CodeResponse {
        code,
        language: payload.language,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::solver::{fakes::ScriptedLlm, Solver};

    fn app(llm: Option<ScriptedLlm>) -> Router {
        let state = match llm {
            Some(llm) => AppState::fake().with_solver(Solver::new(Arc::new(llm))),
            None => AppState::fake(),
        };
        solver_routes().with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn mcq_round_trip() {
        let llm = ScriptedLlm::replying("Reasoning: 4 is even\nAnswer: b\nConfidence: 1.7");
        let (status, body) = post_json(
            app(Some(llm)),
            "/mcq",
            json!({"question": "Which is even?", "options": {"A": "3", "B": "4"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "B");
        assert_eq!(body["confidence"], 1.0);
        assert_eq!(body["explanation"], "4 is even");
    }

    #[tokio::test]
    async fn mcq_without_options_is_rejected() {
        let (status, _) = post_json(
            app(Some(ScriptedLlm::default())),
            "/mcq",
            json!({"question": "?", "options": {}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_solver_is_500() {
        let (status, body) = post_json(app(None), "/coding", json!({"problem": "sum"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "AI solver not configured");
    }

    #[tokio::test]
    async fn coding_defaults_to_python() {
        let llm = ScriptedLlm::replying("```python\nprint(42)\n```");
        let (status, body) = post_json(app(Some(llm)), "/coding", json!({"problem": "answer"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": "print(42)", "language": "python"}));
    }

    #[tokio::test]
    async fn frontend_sections() {
        let llm = ScriptedLlm::replying(
            "HTML:\n```html\n<button>Go</button>\n```\nCSS:\nbutton { color: red; }\nJAVASCRIPT:\n```js\nconsole.log(1)\n```",
        );
        let (status, body) =
            post_json(app(Some(llm)), "/frontend", json!({"requirements": "a button"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["html"], "<button>Go</button>");
        assert_eq!(body["css"], "button { color: red; }");
        assert_eq!(body["javascript"], "console.log(1)");
    }

    #[tokio::test]
    async fn llm_failure_is_reported() {
        let llm = ScriptedLlm::new(vec![Err(anyhow!("rate limited"))]);
        let (status, body) = post_json(
            app(Some(llm)),
            "/fix",
            json!({"code": "print(", "error": "SyntaxError", "language": "python"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Failed to fix code"));
        assert!(detail.contains("rate limited"));
    }
}
