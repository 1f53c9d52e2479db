use std::collections::BTreeMap;

pub fn mcq(question: &str, options: &BTreeMap<String, String>, context: Option<&str>) -> String {
    let options_text = options
        .iter()
        .map(|(k, v)| format!("{k}) {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let letters = options.keys().cloned().collect::<Vec<_>>().join(", ");
    let context = context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("Additional Context:\n{c}\n"))
        .unwrap_or_default();

    format!(
        "Question: {question}

Options:
{options_text}

{context}
Analyze this question step by step and provide:
1. Your reasoning (brief and clear)
2. The correct answer (ONLY the letter: {letters})
3. Your confidence level (0.0 to 1.0)

Format your response exactly as:
Reasoning: <your detailed analysis>
Answer: <letter>
Confidence: <0.0-1.0>
"
    )
}

pub fn coding(
    problem: &str,
    test_cases: Option<&str>,
    constraints: Option<&str>,
    language: &str,
) -> String {
    let test_cases = test_cases
        .map(|t| format!("Test Cases:\n{t}\n"))
        .unwrap_or_default();
    let constraints = constraints
        .map(|c| format!("Constraints:\n{c}\n"))
        .unwrap_or_default();

    format!(
        "Problem: {problem}

{test_cases}
{constraints}

Write a complete, working solution in {language}.

Requirements:
- Handle all edge cases
- Optimize for time and space complexity
- Use clean, readable code with proper variable names
- Include proper input/output handling
- Add comments for complex logic
- ONLY output the code, no explanations before or after

Code:"
    )
}

/// Only a short prefix of the reference image is echoed into the prompt.
const IMAGE_PREVIEW_CHARS: usize = 100;

pub fn frontend(requirements: &str, reference_image: Option<&str>) -> String {
    let image = reference_image
        .map(|img| {
            let preview: String = img.chars().take(IMAGE_PREVIEW_CHARS).collect();
            format!("Reference Image: {preview}...")
        })
        .unwrap_or_default();

    format!(
        "Create a complete front-end solution for:

{requirements}

{image}

Provide three separate code sections:
1. HTML code (semantic, accessible)
2. CSS code (modern, responsive)
3. JavaScript code (vanilla JS, if needed)

Requirements:
- Use modern CSS (flexbox/grid)
- Make it responsive
- Add smooth animations/transitions
- Ensure cross-browser compatibility
- Use semantic HTML

Format your response exactly as:
HTML:
<your complete html>

CSS:
<your complete css>

JAVASCRIPT:
<your complete javascript or leave empty if not needed>
"
    )
}

pub fn fix_code(code: &str, error: &str, language: &str) -> String {
    format!(
        "Fix this {language} code that has an error:

Code:
{code}

Error:
{error}

Provide the corrected code. ONLY output the fixed code, no explanations.

Fixed Code:"
    )
}
