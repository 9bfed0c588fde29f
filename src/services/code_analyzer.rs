// src/services/code_analyzer.rs
//! Pattern-based analysis of UI component source. Nothing here parses the
//! code; every signal is a regex or substring heuristic and must tolerate
//! arbitrary, even syntactically broken, input.
use crate::models::{
    CodeAnalysis, Complexity, ComponentNode, ComponentTree, StylingApproach,
};
use once_cell::sync::Lazy;
use regex::Regex;

const STANDARD_LIBS: &[&str] = &[
    "react", "react-dom", "path", "fs", "http", "https", "url", "util",
];

struct Patterns {
    component: Regex,
    props_destructuring: Regex,
    import: Regex,
    jsx_open_tag: Regex,
    jsx_self_closing: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            component: Regex::new(r"(?:function|const|class)\s+([A-Z][a-zA-Z0-9]*)")?,
            props_destructuring: Regex::new(r"\(\s*\{.*?\}\s*\)")?,
            import: Regex::new(r#"import\s+.*?\s+from\s+['"]([^'"]+)['"]"#)?,
            jsx_open_tag: Regex::new(r"<([A-Z][a-zA-Z0-9]*)[^>]*>")?,
            jsx_self_closing: Regex::new(r"<([A-Z][a-zA-Z0-9]*)[^>]*/>")?,
        })
    }
}

static PATTERNS: Lazy<Result<Patterns, regex::Error>> = Lazy::new(Patterns::compile);

pub struct CodeAnalyzer;

impl CodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: problems are recorded in `CodeAnalysis::error`.
    pub fn analyze(&self, code: &str) -> CodeAnalysis {
        let mut analysis = CodeAnalysis::default();

        let patterns = match PATTERNS.as_ref() {
            Ok(p) => p,
            Err(e) => {
                analysis.error = Some(e.to_string());
                return analysis;
            }
        };

        analysis.components = patterns
            .component
            .captures_iter(code)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();

        analysis.has_state = code.contains("useState");
        analysis.has_effects = code.contains("useEffect");
        analysis.has_props =
            code.contains("props") || patterns.props_destructuring.is_match(code);

        analysis.imports = patterns
            .import
            .captures_iter(code)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();

        analysis.styling_approach = detect_styling(code, &analysis.imports);
        analysis.dependencies = extract_dependencies(&analysis.imports);
        analysis.complexity = complexity_for(code);

        analysis
    }

    /// Loose JSX sanity checks. Results are warnings, not errors.
    pub fn validate_jsx_syntax(&self, code: &str) -> Vec<String> {
        let mut warnings = Vec::new();
        let Ok(patterns) = PATTERNS.as_ref() else {
            return warnings;
        };

        let mut checked: Vec<&str> = Vec::new();
        for caps in patterns.jsx_open_tag.captures_iter(code) {
            let Some(tag) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if checked.contains(&tag) {
                continue;
            }
            checked.push(tag);

            if !code.contains(&format!("</{}>", tag)) && !has_self_closing(patterns, code, tag) {
                warnings.push(format!("Possibly unclosed tag: {}", tag));
            }
        }

        if let Some(idx) = code.find("() =>") {
            if !code[..idx].contains("const") {
                warnings.push("Arrow function might be missing variable declaration".to_string());
            }
        }

        if code.matches('{').count() != code.matches('}').count() {
            warnings.push("Unbalanced curly braces".to_string());
        }
        if code.matches('(').count() != code.matches(')').count() {
            warnings.push("Unbalanced parentheses".to_string());
        }

        warnings
    }

    /// Counts capitalised JSX elements that are either self-closing or have a
    /// matching close tag later in the text.
    /// Counts every closed usage of a capitalised tag, nested ones included.
    pub fn extract_component_tree(&self, code: &str) -> ComponentTree {
        let mut tree = ComponentTree::new();
        let Ok(patterns) = PATTERNS.as_ref() else {
            return tree;
        };

        for caps in patterns.jsx_open_tag.captures_iter(code) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let self_closing = whole.as_str().ends_with("/>");
            let closed_later = code[whole.end()..].contains(&format!("</{}>", name.as_str()));
            if self_closing || closed_later {
                tree.entry(name.as_str().to_string())
                    .or_insert_with(|| ComponentNode {
                        count: 0,
                        children: Vec::new(),
                    })
                    .count += 1;
            }
        }

        tree
    }

    pub fn suggest_improvements(&self, analysis: &CodeAnalysis) -> Vec<String> {
        let mut suggestions = Vec::new();

        if !analysis.has_state && analysis.complexity == Complexity::Complex {
            suggestions
                .push("Consider breaking down this component into smaller pieces".to_string());
        }
        if analysis.styling_approach == StylingApproach::InlineStyles {
            suggestions.push(
                "Consider using CSS modules or styled-components for better maintainability"
                    .to_string(),
            );
        }
        if analysis.components.len() > 5 {
            suggestions.push("Consider splitting components into separate files".to_string());
        }
        if !analysis.has_props && analysis.components.len() > 1 {
            suggestions.push("Consider using props for component communication".to_string());
        }

        suggestions
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn has_self_closing(patterns: &Patterns, code: &str, tag: &str) -> bool {
    patterns
        .jsx_self_closing
        .captures_iter(code)
        .any(|c| c.get(1).is_some_and(|m| m.as_str() == tag))
}

// Order matters: the first matching approach wins.
fn detect_styling(code: &str, imports: &[String]) -> StylingApproach {
    let joined = imports.join(" ");

    if joined.contains("styled-components") {
        StylingApproach::StyledComponents
    } else if joined.contains("css") || code.contains(".module.css") {
        StylingApproach::CssModules
    } else if code.contains("makeStyles") || joined.contains("@mui") {
        StylingApproach::MaterialUi
    } else if code.to_lowercase().contains("tailwind") || code.contains("className=") {
        if code.contains("tw-") || code.contains("text-") || code.contains("bg-") {
            StylingApproach::Tailwind
        } else {
            StylingApproach::InlineClasses
        }
    } else if code.contains("style={") {
        StylingApproach::InlineStyles
    } else {
        StylingApproach::Unknown
    }
}

/// Third-party packages from an import list: relative paths and standard
/// modules are dropped, the rest reduced to their first path segment.
pub fn extract_dependencies(imports: &[String]) -> Vec<String> {
    let mut dependencies: Vec<String> = Vec::new();

    for path in imports {
        if path.starts_with('.') {
            continue;
        }
        let package = path.split('/').next().unwrap_or(path.as_str());
        if !STANDARD_LIBS.contains(&package) && !dependencies.iter().any(|d| d == package) {
            dependencies.push(package.to_string());
        }
    }

    dependencies
}

fn complexity_for(code: &str) -> Complexity {
    match code.split('\n').count() {
        n if n < 50 => Complexity::Simple,
        n if n < 150 => Complexity::Moderate,
        _ => Complexity::Complex,
    }
}
