// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    UiFix,
    CodeReview,
    FigmaToCode,
}

impl AnalysisType {
    /// Unknown or missing names fall back to `ui_fix`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("code_review") => AnalysisType::CodeReview,
            Some("figma_to_code") => AnalysisType::FigmaToCode,
            _ => AnalysisType::UiFix,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Kept loose so a non-string value falls back instead of failing the body.
    pub analysis_type: Option<Value>,
    pub include_explanation: Option<bool>,
}

impl AnalysisOptions {
    pub fn resolved_type(&self) -> AnalysisType {
        AnalysisType::from_name(self.analysis_type.as_ref().and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image: Option<String>,
    pub react_code: Option<String>,
    #[serde(default)]
    pub options: Option<AnalysisOptions>,
    pub image_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StylingApproach {
    #[serde(rename = "styled-components")]
    StyledComponents,
    #[serde(rename = "css-modules")]
    CssModules,
    #[serde(rename = "material-ui")]
    MaterialUi,
    #[serde(rename = "tailwind")]
    Tailwind,
    #[serde(rename = "inline-classes")]
    InlineClasses,
    #[serde(rename = "inline-styles")]
    InlineStyles,
    #[serde(rename = "unknown")]
    Unknown,
}

impl StylingApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            StylingApproach::StyledComponents => "styled-components",
            StylingApproach::CssModules => "css-modules",
            StylingApproach::MaterialUi => "material-ui",
            StylingApproach::Tailwind => "tailwind",
            StylingApproach::InlineClasses => "inline-classes",
            StylingApproach::InlineStyles => "inline-styles",
            StylingApproach::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Structural facts pulled out of a component's source by pattern matching.
/// Heuristic only: the source is never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub components: BTreeSet<String>,
    pub has_state: bool,
    pub has_effects: bool,
    pub has_props: bool,
    pub imports: Vec<String>,
    pub styling_approach: StylingApproach,
    pub dependencies: Vec<String>,
    pub complexity: Complexity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for CodeAnalysis {
    fn default() -> Self {
        Self {
            components: BTreeSet::new(),
            has_state: false,
            has_effects: false,
            has_props: false,
            imports: Vec::new(),
            styling_approach: StylingApproach::Unknown,
            dependencies: Vec::new(),
            complexity: Complexity::Simple,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentNode {
    pub count: usize,
    pub children: Vec<String>,
}

pub type ComponentTree = BTreeMap<String, ComponentNode>;

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Vec<u8>,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub original_format: String,
    pub original_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageValidation {
    pub valid: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub fixed_code: Option<String>,
    pub full_response: String,
    pub analysis: CodeAnalysis,
    pub analysis_type: AnalysisType,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    pub component_tree: ComponentTree,
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignTokens {
    #[serde(default = "empty_array")]
    pub colors: Value,
    #[serde(default = "empty_object")]
    pub typography: Value,
    #[serde(default = "empty_array")]
    pub spacing: Value,
    #[serde(default = "empty_array")]
    pub border_radius: Value,
    #[serde(default = "empty_array")]
    pub shadows: Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for DesignTokens {
    fn default() -> Self {
        Self {
            colors: empty_array(),
            typography: empty_object(),
            spacing: empty_array(),
            border_radius: empty_array(),
            shadows: empty_array(),
            extra: serde_json::Map::new(),
        }
    }
}
