use std::{collections::BTreeMap, sync::Arc};

use anyhow::anyhow;
use tracing::{debug, instrument};

use super::{
    llm::LlmClient,
    parse::{self, FrontendAnswer, McqAnswer},
    prompts,
};

const MCQ_MAX_TOKENS: u32 = 1000;
const CODING_MAX_TOKENS: u32 = 3000;
const FRONTEND_MAX_TOKENS: u32 = 4000;
const FIX_MAX_TOKENS: u32 = 2000;

/// Prompt templates plus answer extraction on top of an [`LlmClient`].
#[derive(Clone)]
pub struct Solver {
    llm: Arc<dyn LlmClient>,
}

impl Solver {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    #[instrument(skip_all, fields(options = options.len()))]
    pub async fn mcq(
        &self,
        question: &str,
        options: &BTreeMap<String, String>,
        context: Option<&str>,
    ) -> anyhow::Result<McqAnswer> {
        if options.is_empty() {
            return Err(anyhow!("question has no options"));
        }
        let reply = self
            .llm
            .complete(&prompts::mcq(question, options, context), MCQ_MAX_TOKENS)
            .await?;
        let parsed = parse::parse_mcq(&reply, options).ok_or_else(|| anyhow!("question has no options"))?;
        debug!(answer = %parsed.answer, confidence = parsed.confidence, "mcq solved");
        Ok(parsed)
    }

    #[instrument(skip_all, fields(language = %language))]
    pub async fn coding(
        &self,
        problem: &str,
        test_cases: Option<&str>,
        constraints: Option<&str>,
        language: &str,
    ) -> anyhow::Result<String> {
        let reply = self
            .llm
            .complete(
                &prompts::coding(problem, test_cases, constraints, language),
                CODING_MAX_TOKENS,
            )
            .await?;
        Ok(parse::strip_code_fences(&reply))
    }

    #[instrument(skip_all)]
    pub async fn frontend(
        &self,
        requirements: &str,
        reference_image: Option<&str>,
    ) -> anyhow::Result<FrontendAnswer> {
        let reply = self
            .llm
            .complete(
                &prompts::frontend(requirements, reference_image),
                FRONTEND_MAX_TOKENS,
            )
            .await?;
        Ok(parse::parse_frontend(&reply))
    }

    #[instrument(skip_all, fields(language = %language))]
    pub async fn fix_code(&self, code: &str, error: &str, language: &str) -> anyhow::Result<String> {
        let reply = self
            .llm
            .complete(&prompts::fix_code(code, error, language), FIX_MAX_TOKENS)
            .await?;
        Ok(parse::strip_code_fences(&reply))
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::ScriptedLlm;
    use super::*;

    fn options() -> BTreeMap<String, String> {
        [("A", "1"), ("B", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn mcq_uses_its_token_budget() {
        let llm = Arc::new(ScriptedLlm::replying(
            "Reasoning: 1+1\nAnswer: B\nConfidence: 0.9",
        ));
        let solver = Solver::new(llm.clone());
        let ans = solver.mcq("1+1?", &options(), None).await.unwrap();
        assert_eq!(ans.answer, "B");
        assert_eq!(llm.prompts.lock().unwrap()[0].1, MCQ_MAX_TOKENS);
    }

    #[tokio::test]
    async fn mcq_without_options_never_calls_llm() {
        let llm = Arc::new(ScriptedLlm::default());
        let solver = Solver::new(llm.clone());
        assert!(solver.mcq("?", &BTreeMap::new(), None).await.is_err());
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn coding_and_fix_strip_fences() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("```python\nprint(1)\n```".into()),
            Ok("```\nprint(2)\n```".into()),
        ]));
        let solver = Solver::new(llm.clone());
        assert_eq!(solver.coding("p", None, None, "python").await.unwrap(), "print(1)");
        assert_eq!(
            solver.fix_code("print(", "SyntaxError", "python").await.unwrap(),
            "print(2)"
        );
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts[0].1, CODING_MAX_TOKENS);
        assert_eq!(prompts[1].1, FIX_MAX_TOKENS);
    }

    #[tokio::test]
    async fn llm_errors_propagate() {
        let solver = Solver::new(Arc::new(ScriptedLlm::new(vec![Err(anyhow!("overloaded"))])));
        let err = solver.frontend("a page", None).await.unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }
}
