//! Structured error types shared across ROI crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`RoiError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (atlas, subject, region id, path).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the operator resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for atlas resolution and database assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum RoiError {
    /// Structurally invalid atlas or analysis specification.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// A required initialisation step (paradigm, subject, analysis) was skipped.
    #[error("init error: {0}")]
    Init(ErrorInfo),
    /// A prerequisite artifact is absent from disk.
    #[error("preprocess error: {0}")]
    Preprocess(ErrorInfo),
    /// A stats table disagrees with the region catalog.
    #[error("extraction error: {0}")]
    Extraction(ErrorInfo),
    /// Filesystem failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Encoding and decoding failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl RoiError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            RoiError::Config(info)
            | RoiError::Init(info)
            | RoiError::Preprocess(info)
            | RoiError::Extraction(info)
            | RoiError::Io(info)
            | RoiError::Serde(info) => info,
        }
    }

    /// Attaches a context entry to whichever family the error belongs to.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            RoiError::Config(info) => RoiError::Config(info.with_context(key, value)),
            RoiError::Init(info) => RoiError::Init(info.with_context(key, value)),
            RoiError::Preprocess(info) => RoiError::Preprocess(info.with_context(key, value)),
            RoiError::Extraction(info) => RoiError::Extraction(info.with_context(key, value)),
            RoiError::Io(info) => RoiError::Io(info.with_context(key, value)),
            RoiError::Serde(info) => RoiError::Serde(info.with_context(key, value)),
        }
    }

    /// A field required by the atlas or analysis variant is absent.
    pub fn missing_field(field: &str) -> Self {
        RoiError::Config(ErrorInfo::new("missing_field", "missing field").with_context("field", field))
    }

    /// A field not declared by the atlas or analysis variant is present.
    pub fn unexpected_field(field: &str) -> Self {
        RoiError::Config(
            ErrorInfo::new("unexpected_field", "unexpected field").with_context("field", field),
        )
    }

    /// An initialisation step was skipped before an operation that needs it.
    pub fn init_required(step: &str) -> Self {
        RoiError::Init(
            ErrorInfo::new("init_required", format!("{step} is not initialized"))
                .with_context("step", step),
        )
    }

    /// Wraps a filesystem failure together with the offending path.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        RoiError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
