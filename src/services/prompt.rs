// src/services/prompt.rs
use crate::models::{AnalysisType, CodeAnalysis, DesignTokens};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DESIGN_SYSTEM_PROMPT: &str = r#"Analyze this UI and extract:
1. Color palette (hex codes)
2. Typography (font families, sizes)
3. Spacing values
4. Border radius values
5. Shadow styles

Return as JSON format."#;

const FIGMA_TO_CODE_PROMPT: &str = r#"Convert this Figma design to a React component.
Please provide complete, production-ready React code with proper styling."#;

const CODE_ONLY_SUFFIX: &str = "\n\nRespond with the complete code in a single ```jsx block and no explanation.";

// Tried in order; the first pattern with any match wins.
static CODE_BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?s)```jsx\n(.*?)```",
        r"(?s)```javascript\n(.*?)```",
        r"(?s)```react\n(.*?)```",
        r"(?s)```\n(.*?)```",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static JSON_OBJECT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").ok());

pub fn build_prompt(
    react_code: &str,
    analysis: &CodeAnalysis,
    analysis_type: AnalysisType,
    include_explanation: bool,
) -> String {
    let mut prompt = match analysis_type {
        AnalysisType::UiFix => format!(
            r#"I have a React component and a screenshot of its current UI. Please analyze the visual issues and provide the fixed code.

Current React Code:
```jsx
{code}
```

Code Analysis Summary:
{summary}

Please:
1. Identify all visual issues in the screenshot
2. Provide the complete fixed React code
3. Explain what changes were made and why
4. Include any necessary CSS fixes

Focus on fixing layout issues, spacing problems, alignment, colors, and any UI inconsistencies."#,
            code = react_code,
            summary = render_summary(analysis),
        ),
        AnalysisType::CodeReview => format!(
            r#"Review this React component and its rendered UI for best practices and potential improvements.

React Code:
```jsx
{code}
```

Please provide:
1. Code quality assessment
2. Performance suggestions
3. Accessibility improvements
4. Best practice recommendations"#,
            code = react_code,
        ),
        AnalysisType::FigmaToCode => FIGMA_TO_CODE_PROMPT.to_string(),
    };

    if !include_explanation {
        prompt.push_str(CODE_ONLY_SUFFIX);
    }
    prompt
}

fn render_summary(analysis: &CodeAnalysis) -> String {
    let components: Vec<&str> = analysis.components.iter().map(String::as_str).collect();
    format!(
        "- Components found: {}\n- Has useState: {}\n- Has useEffect: {}\n- CSS approach: {}",
        components.join(", "),
        analysis.has_state,
        analysis.has_effects,
        analysis.styling_approach.as_str(),
    )
}

/// First fenced block by tag priority (jsx, javascript, react, untagged),
/// trimmed. Falls back to the whole response.
pub fn extract_code_from_response(response_text: &str) -> String {
    CODE_BLOCK_PATTERNS
        .iter()
        .find_map(|re| re.captures(response_text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| response_text.to_string())
}

/// Greedy first-`{` to last-`}` slice parsed as design tokens; anything that
/// does not parse yields the empty token set.
pub fn extract_design_tokens(response_text: &str) -> DesignTokens {
    JSON_OBJECT
        .as_ref()
        .and_then(|re| re.find(response_text))
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StylingApproach;

    #[test]
    fn prefers_jsx_block_over_untagged() {
        let response = "Here you go:\n```\nnot this\n```\nand\n```jsx\n  <App />\n```\n";
        assert_eq!(extract_code_from_response(response), "<App />");
    }

    #[test]
    fn falls_through_tag_priority() {
        let response = "```react\nconst A = 1;\n```\n```javascript\nconst B = 2;\n```";
        assert_eq!(extract_code_from_response(response), "const B = 2;");

        let untagged = "```\nline one\nline two\n```";
        assert_eq!(extract_code_from_response(untagged), "line one\nline two");
    }

    #[test]
    fn returns_raw_text_without_blocks() {
        let response = "No code needed, the UI looks fine.";
        assert_eq!(extract_code_from_response(response), response);
    }

    #[test]
    fn ui_fix_prompt_interpolates_summary() {
        let analysis = CodeAnalysis {
            components: ["Card".to_string(), "App".to_string()].into_iter().collect(),
            has_state: true,
            styling_approach: StylingApproach::Tailwind,
            ..CodeAnalysis::default()
        };
        let prompt = build_prompt("<Card />", &analysis, AnalysisType::UiFix, true);

        assert!(prompt.contains("```jsx\n<Card />\n```"));
        assert!(prompt.contains("- Components found: App, Card"));
        assert!(prompt.contains("- Has useState: true"));
        assert!(prompt.contains("- Has useEffect: false"));
        assert!(prompt.contains("- CSS approach: tailwind"));
        assert!(!prompt.contains("no explanation"));
    }

    #[test]
    fn other_templates() {
        let analysis = CodeAnalysis::default();
        let review = build_prompt("let x;", &analysis, AnalysisType::CodeReview, true);
        assert!(review.contains("let x;"));
        assert!(!review.contains("Code Analysis Summary"));

        let figma = build_prompt("ignored", &analysis, AnalysisType::FigmaToCode, true);
        assert_eq!(figma, FIGMA_TO_CODE_PROMPT);

        let terse = build_prompt("let x;", &analysis, AnalysisType::UiFix, false);
        assert!(terse.ends_with(CODE_ONLY_SUFFIX));
    }

    #[test]
    fn design_tokens_parse_or_default() {
        let tokens = extract_design_tokens(
            "Sure!\n{\"colors\": [\"#112233\"], \"spacing\": [4, 8]}\nHope this helps",
        );
        assert_eq!(tokens.colors, serde_json::json!(["#112233"]));
        assert_eq!(tokens.spacing, serde_json::json!([4, 8]));
        assert_eq!(tokens.shadows, serde_json::json!([]));

        assert_eq!(extract_design_tokens("{not json}"), DesignTokens::default());
        assert_eq!(extract_design_tokens("nothing here"), DesignTokens::default());
    }
}
