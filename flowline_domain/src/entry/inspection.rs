// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inspection Model
//!
//! Pre-flight inspection verifies that a pipeline's external inputs are
//! present, parseable, and deserializable *before* any node runs. This
//! module defines the vocabulary of that check:
//!
//! - [`InspectionLevel`] — how hard to look (`None < Shallow < Deep`).
//! - [`ValidationError`] — one defect found on one entry, with a
//!   machine-readable kind and a human-readable message.
//! - [`ValidationResult`] — the ordered aggregate over all inspected
//!   entries; a pre-flight pass collects *every* defect it can find
//!   instead of stopping at the first one.
//!
//! Inspection never mutates an entry. Data problems (missing file, bad
//! header, undeserializable row) are reported as [`ValidationError`]s;
//! only unexpected failures — panic-adjacent conditions inside a backend —
//! are wrapped as [`ValidationErrorKind::InspectionFailure`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// How deeply an entry is inspected during pre-flight validation.
///
/// Levels are ordered: `None < Shallow < Deep`. `Deep` is never applied
/// implicitly; an entry or a pipeline override must ask for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionLevel {
    /// Skip the entry entirely.
    #[default]
    None,
    /// Verify existence, format, schema, and a bounded sample of items.
    Shallow,
    /// Run the shallow checks, then deserialize every item.
    Deep,
}

impl fmt::Display for InspectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionLevel::None => write!(f, "none"),
            InspectionLevel::Shallow => write!(f, "shallow"),
            InspectionLevel::Deep => write!(f, "deep"),
        }
    }
}

impl std::str::FromStr for InspectionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(InspectionLevel::None),
            "shallow" => Ok(InspectionLevel::Shallow),
            "deep" => Ok(InspectionLevel::Deep),
            other => Err(format!("unknown inspection level '{}'", other)),
        }
    }
}

/// Classification of a single pre-flight defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// The underlying storage location does not exist.
    NotFound,
    /// The stored bytes are not parseable in the entry's format.
    InvalidFormat,
    /// The stored schema (headers, columns) does not match the declared type.
    SchemaMismatch,
    /// The stored value has the wrong logical type for the entry.
    TypeMismatch,
    /// An individual item failed to deserialize into the declared type.
    DeserializationError,
    /// Items were expected but the dataset is empty.
    EmptyDataset,
    /// The inspection itself failed unexpectedly.
    InspectionFailure,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::NotFound => "not found",
            ValidationErrorKind::InvalidFormat => "invalid format",
            ValidationErrorKind::SchemaMismatch => "schema mismatch",
            ValidationErrorKind::TypeMismatch => "type mismatch",
            ValidationErrorKind::DeserializationError => "deserialization error",
            ValidationErrorKind::EmptyDataset => "empty dataset",
            ValidationErrorKind::InspectionFailure => "inspection failure",
        };
        write!(f, "{}", name)
    }
}

/// One defect found on one entry during pre-flight inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    entry_key: String,
    kind: ValidationErrorKind,
    message: String,
    details: Option<String>,
}

impl ValidationError {
    pub fn new(entry_key: impl Into<String>, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            entry_key: entry_key.into(),
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches backend-specific diagnostic detail (row numbers, parser
    /// output) without polluting the primary message.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn entry_key(&self) -> &str {
        &self.entry_key
    }

    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.entry_key, self.kind, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Ordered aggregate of every defect a pre-flight pass found.
///
/// Error order follows entry iteration order, not inspection completion
/// order, so reports are stable across runs even though inspection itself
/// is concurrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result is valid exactly when it holds no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    /// One-line summary suitable for log output and error payloads.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            "all inspected inputs are valid".to_string()
        } else {
            format!("{} validation error(s) across external inputs", self.errors.len())
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for error in &self.errors {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}
