//! Survey Configuration Module
//! Holds the question label -> field name table and display labels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(String),
}

/// Semantic identifier for a survey question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    pub const AGE: &'static str = "Age";
    pub const OCCUPATION: &'static str = "Occupation";
    pub const SOCCER_INTEREST: &'static str = "SoccerInterest";
    pub const TECH_AFFINITY: &'static str = "TechAffinity";
    pub const DIGITAL_PREFERENCE: &'static str = "DigitalPreference";
    pub const DIGITAL_SATISFACTION: &'static str = "DigitalSatisfaction";
    pub const TRADITIONAL_SATISFACTION: &'static str = "TraditionalSatisfaction";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One row of the label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Raw question label as it appears in the export.
    pub label: String,
    pub field: FieldName,
    /// Human readable label used in charts and summaries.
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default = "default_numeric")]
    pub numeric: bool,
}

fn default_numeric() -> bool {
    true
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Complete survey configuration, loaded once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    pub fields: Vec<FieldSpec>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        let spec = |label: &str, field: &str, display: &str, numeric: bool| FieldSpec {
            label: label.to_string(),
            field: FieldName::new(field),
            display: Some(display.to_string()),
            numeric,
        };

        Self {
            delimiter: default_delimiter(),
            fields: vec![
                spec("[1]ご年齢", FieldName::AGE, "Age", true),
                spec("[2]ご職種", FieldName::OCCUPATION, "Occupation", false),
                spec(
                    "[3]サッカーは好きだ",
                    FieldName::SOCCER_INTEREST,
                    "Interest in Soccer",
                    true,
                ),
                spec(
                    "[4]ARやVRなどデジタルテクノロジーに親しみがある",
                    FieldName::TECH_AFFINITY,
                    "Technology Affinity",
                    true,
                ),
                spec(
                    "[5]デジタル・テクノロジー展示は好きだ",
                    FieldName::DIGITAL_PREFERENCE,
                    "Digital Exhibition Preference",
                    true,
                ),
                spec(
                    "[2]DIGITAL COLLECTION展示の満足度について教えて下さい。",
                    FieldName::DIGITAL_SATISFACTION,
                    "Digital Exhibition Satisfaction",
                    true,
                ),
                spec(
                    "[3]ROAD TO 2050などの実物展示を使った展示の満足度について教えて下さい。",
                    FieldName::TRADITIONAL_SATISFACTION,
                    "Traditional Exhibition Satisfaction",
                    true,
                ),
            ],
        }
    }
}

impl SurveyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SurveyConfig = serde_json::from_str(text)?;
        config.delimiter_byte()?;
        Ok(config)
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ConfigError::InvalidDelimiter(self.delimiter.clone())),
        }
    }

    pub fn mapping(&self) -> FieldMapping {
        FieldMapping::new(&self.fields)
    }
}

/// Static label -> field lookup built from [`SurveyConfig`].
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    by_label: HashMap<String, FieldSpec>,
    by_field: HashMap<FieldName, FieldSpec>,
}

impl FieldMapping {
    pub fn new(specs: &[FieldSpec]) -> Self {
        let mut by_label = HashMap::new();
        let mut by_field = HashMap::new();
        for spec in specs {
            by_label.insert(spec.label.trim().to_string(), spec.clone());
            by_field.insert(spec.field.clone(), spec.clone());
        }
        Self { by_label, by_field }
    }

    /// Map a raw label to its field. Unknown labels pass through trimmed.
    pub fn field_for_label(&self, label: &str) -> FieldName {
        let label = label.trim();
        self.by_label
            .get(label)
            .map(|spec| spec.field.clone())
            .unwrap_or_else(|| FieldName::new(label))
    }

    /// Raw label configured for a field, if any.
    pub fn label_for_field(&self, field: &FieldName) -> Option<&str> {
        self.by_field.get(field).map(|spec| spec.label.trim())
    }

    /// Unmapped fields are treated as text.
    pub fn is_numeric(&self, field: &FieldName) -> bool {
        self.by_field.get(field).map(|spec| spec.numeric).unwrap_or(false)
    }

    pub fn display_label(&self, field: &FieldName) -> String {
        self.by_field
            .get(field)
            .and_then(|spec| spec.display.clone())
            .unwrap_or_else(|| field.to_string())
    }

    pub fn is_mapped(&self, label: &str) -> bool {
        self.by_label.contains_key(label.trim())
    }
}
