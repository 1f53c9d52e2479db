//! Turns free-text model replies into structured answers.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_CONFIDENCE: f64 = 0.7;
const NO_REASONING: &str = "Unable to extract reasoning";

lazy_static! {
    static ref ANSWER_RE: Regex = Regex::new(r"(?i)Answer:\s*([A-Z])").unwrap();
    static ref REASONING_RE: Regex =
        Regex::new(r"(?s)Reasoning:\s*(.+?)(?:Answer:|Confidence:|$)").unwrap();
    static ref CONFIDENCE_RE: Regex = Regex::new(r"Confidence:\s*([0-9.]+)").unwrap();
    static ref OPEN_FENCE_RE: Regex = Regex::new(r"(?m)^```[a-z]*\n").unwrap();
    static ref CLOSE_FENCE_RE: Regex = Regex::new(r"\n```$").unwrap();
    static ref HTML_RE: Regex = Regex::new(r"(?is)HTML:\s*(.+?)(?:CSS:|$)").unwrap();
    static ref CSS_RE: Regex = Regex::new(r"(?is)CSS:\s*(.+?)(?:JAVASCRIPT:|$)").unwrap();
    static ref JS_RE: Regex = Regex::new(r"(?is)JAVASCRIPT:\s*(.+)$").unwrap();
    static ref HTML_FENCE_RE: Regex = Regex::new(r"(?m)^```html\n|^```\n|```$").unwrap();
    static ref CSS_FENCE_RE: Regex = Regex::new(r"(?m)^```css\n|^```\n|```$").unwrap();
    static ref JS_FENCE_RE: Regex =
        Regex::new(r"(?m)^```javascript\n|^```js\n|^```\n|```$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct McqAnswer {
    pub answer: String,
    pub explanation: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendAnswer {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

/// `None` only when there are no options to fall back on.
pub fn parse_mcq(text: &str, options: &BTreeMap<String, String>) -> Option<McqAnswer> {
    let fallback = options.keys().next()?.clone();
    let answer = ANSWER_RE
        .captures(text)
        .map(|c| c[1].to_uppercase())
        .filter(|a| options.contains_key(a))
        .unwrap_or(fallback);

    let explanation = REASONING_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| NO_REASONING.to_string());

    let confidence = CONFIDENCE_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(McqAnswer {
        answer,
        explanation,
        confidence: clamp_confidence(confidence),
    })
}

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_CONFIDENCE;
    }
    value.clamp(0.0, 1.0)
}

pub fn strip_code_fences(text: &str) -> String {
    let code = text.trim();
    let code = OPEN_FENCE_RE.replace_all(code, "");
    let code = CLOSE_FENCE_RE.replace(&code, "");
    code.trim().to_string()
}

pub fn parse_frontend(text: &str) -> FrontendAnswer {
    FrontendAnswer {
        html: section(&HTML_RE, &HTML_FENCE_RE, text),
        css: section(&CSS_RE, &CSS_FENCE_RE, text),
        javascript: section(&JS_RE, &JS_FENCE_RE, text),
    }
}

fn section(re: &Regex, fences: &Regex, text: &str) -> String {
    let raw = re
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    fences.replace_all(&raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> BTreeMap<String, String> {
        ["A", "B", "C", "D"]
            .iter()
            .map(|k| (k.to_string(), format!("option {k}")))
            .collect()
    }

    #[test]
    fn mcq_well_formed_reply() {
        let reply = "Reasoning: Paris is the capital.\nIt has been since 508.\nAnswer: c\nConfidence: 0.92";
        let parsed = parse_mcq(reply, &abcd()).unwrap();
        assert_eq!(parsed.answer, "C");
        assert_eq!(parsed.explanation, "Paris is the capital.\nIt has been since 508.");
        assert!((parsed.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn mcq_answer_outside_options_falls_back_to_first() {
        let parsed = parse_mcq("Answer: Z\nConfidence: 0.5", &abcd()).unwrap();
        assert_eq!(parsed.answer, "A");
        assert_eq!(parsed.explanation, "Unable to extract reasoning");
    }

    #[test]
    fn mcq_missing_fields_use_defaults() {
        let parsed = parse_mcq("I think it's B.", &abcd()).unwrap();
        assert_eq!(parsed.answer, "A");
        assert_eq!(parsed.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn mcq_confidence_is_clamped() {
        let parsed = parse_mcq("Answer: B\nConfidence: 7.5", &abcd()).unwrap();
        assert_eq!(parsed.confidence, 1.0);
        let parsed = parse_mcq("Answer: B\nConfidence: 85", &abcd()).unwrap();
        assert_eq!(parsed.confidence, 1.0);
        let parsed = parse_mcq("Answer: B\nConfidence: ...", &abcd()).unwrap();
        assert_eq!(parsed.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(clamp_confidence(-0.3), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn mcq_reasoning_stops_at_confidence_when_answer_missing() {
        let parsed = parse_mcq("Reasoning: unsure\nConfidence: 0.1", &abcd()).unwrap();
        assert_eq!(parsed.explanation, "unsure");
        assert_eq!(parsed.confidence, 0.1);
    }

    #[test]
    fn mcq_without_options_is_none() {
        assert!(parse_mcq("Answer: A", &BTreeMap::new()).is_none());
    }

    #[test]
    fn fences_are_stripped_from_code() {
        let reply = "```python\ndef add(a, b):\n    return a + b\n```\n";
        assert_eq!(strip_code_fences(reply), "def add(a, b):\n    return a + b");
        assert_eq!(strip_code_fences("  print(1)  "), "print(1)");
    }

    #[test]
    fn frontend_sections_are_split() {
        let reply = "HTML:\n```html\n<div class=\"card\"></div>\n```\n\nCSS:\n```css\n.card { display: grid; }\n```\n\nJAVASCRIPT:\n```js\nconsole.log(1);\n```";
        let parsed = parse_frontend(reply);
        assert_eq!(parsed.html, "<div class=\"card\"></div>");
        assert_eq!(parsed.css, ".card { display: grid; }");
        assert_eq!(parsed.javascript, "console.log(1);");
    }

    #[test]
    fn frontend_missing_sections_are_empty() {
        let parsed = parse_frontend("html:\n<p>hi</p>");
        assert_eq!(parsed.html, "<p>hi</p>");
        assert_eq!(parsed.css, "");
        assert_eq!(parsed.javascript, "");
    }
}
