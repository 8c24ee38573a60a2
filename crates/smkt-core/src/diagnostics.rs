//! Typed diagnostics collected during a clearing run.
//!
//! Market submissions are frequently malformed in small ways: a price matrix
//! with one column too few, a bid quantity larger than the load can consume,
//! an offer from a unit that cannot produce. None of these stop the run. They
//! are recorded here, in the order they were found, and the caller decides
//! what to do with them.
//!
//! - Severity levels (Warning, Error)
//! - A closed set of [`DiagnosticKind`]s instead of free-form categories
//! - Optional unit reference (0-based row in the generator table)
//! - Serialization for JSON reports
//!
//! # Example
//!
//! ```
//! use smkt_core::diagnostics::{DiagnosticKind, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_error(DiagnosticKind::SubmissionCount, "3 active power offers for 5 units");
//! diag.add_warning_for_unit(DiagnosticKind::BoundViolation, "offer 120 above PMAX 100", 2);
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.for_unit(2).count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the value was used as-is
    Warning,
    /// Part of the input was discarded (e.g., a whole offer schedule)
    Error,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Quantity and price matrices of one schedule differ in shape
    ShapeMismatch,
    /// Schedule row count is neither 0, the eligible subset size, nor the record count
    SubmissionCount,
    /// Negative block quantity in a submission row
    NegativeQuantity,
    /// Offer from a unit that cannot produce, or bid from one that cannot consume
    DisallowedSubmission,
    /// Cleared quantity outside the unit's declared limits
    BoundViolation,
    /// Bid and offer halves do not meet at (0, 0)
    CurveContinuity,
    /// Cost table layout adjusted (e.g. reactive rows discarded)
    CostTable,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ShapeMismatch => "shape_mismatch",
            DiagnosticKind::SubmissionCount => "submission_count",
            DiagnosticKind::NegativeQuantity => "negative_quantity",
            DiagnosticKind::DisallowedSubmission => "disallowed_submission",
            DiagnosticKind::BoundViolation => "bound_violation",
            DiagnosticKind::CurveContinuity => "curve_continuity",
            DiagnosticKind::CostTable => "cost_table",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic issue encountered during clearing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    /// Severity of the issue
    pub severity: Severity,
    /// Typed category
    pub kind: DiagnosticKind,
    /// Human-readable description of the issue
    pub message: String,
    /// Generator-table row the issue belongs to (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<usize>,
}

impl DiagnosticIssue {
    /// Create a new diagnostic issue
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            unit: None,
        }
    }

    /// Attach the generator-table row
    pub fn with_unit(mut self, unit: usize) -> Self {
        self.unit = Some(unit);
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.kind, self.message)?;

        if let Some(unit) = self.unit {
            write!(f, " (gen {})", unit)?;
        }

        Ok(())
    }
}

/// Ordered collection of diagnostic issues for a clearing run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// All collected issues, in discovery order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    /// Create new empty diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    /// Add a warning with kind and message
    pub fn add_warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, kind, message));
    }

    /// Add a warning attached to a generator-table row
    pub fn add_warning_for_unit(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        unit: usize,
    ) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, kind, message).with_unit(unit));
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    /// Add an error with kind and message
    pub fn add_error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, kind, message));
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Count warning issues
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Count error issues
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Check if there are any issues
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Get issues of one kind
    pub fn by_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Get issues attached to one generator-table row
    pub fn for_unit(&self, unit: usize) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.unit == Some(unit))
    }

    // =========================================================================
    // Utility Methods
    // =========================================================================

    /// Append another collection, preserving order
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning(DiagnosticKind::NegativeQuantity, "test warning");
        diag.add_error(DiagnosticKind::ShapeMismatch, "test error");
        diag.add_warning_for_unit(DiagnosticKind::BoundViolation, "unit warning", 4);

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_issues());
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning_for_unit(DiagnosticKind::CurveContinuity, "halves do not meet", 7);
        diag.add_error(DiagnosticKind::SubmissionCount, "bad row count");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"curve_continuity\""));
        assert!(json.contains("\"unit\": 7"));
        assert!(json.contains("\"submission_count\""));
    }

    #[test]
    fn test_empty_diagnostics_serialize_to_empty_object() {
        let json = serde_json::to_string(&Diagnostics::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(
            Severity::Error,
            DiagnosticKind::ShapeMismatch,
            "offers.P qty is 2x3, prc is 2x2",
        )
        .with_unit(3);

        let display = format!("{}", issue);
        assert!(display.starts_with("[error:shape_mismatch]"));
        assert!(display.contains("2x3"));
        assert!(display.ends_with("(gen 3)"));
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning(DiagnosticKind::BoundViolation, "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error(DiagnosticKind::ShapeMismatch, "error");
        assert_eq!(diag.summary(), "1 warning, 1 error");

        diag.add_warning(DiagnosticKind::BoundViolation, "another warning");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_by_kind_and_unit() {
        let mut diag = Diagnostics::new();
        diag.add_warning_for_unit(DiagnosticKind::BoundViolation, "a", 0);
        diag.add_warning_for_unit(DiagnosticKind::DisallowedSubmission, "b", 0);
        diag.add_warning_for_unit(DiagnosticKind::BoundViolation, "c", 1);

        assert_eq!(diag.by_kind(DiagnosticKind::BoundViolation).count(), 2);
        assert_eq!(diag.for_unit(0).count(), 2);
        assert_eq!(diag.for_unit(2).count(), 0);
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first = Diagnostics::new();
        first.add_warning(DiagnosticKind::NegativeQuantity, "first");

        let mut second = Diagnostics::new();
        second.add_error(DiagnosticKind::ShapeMismatch, "second");

        first.merge(second);
        let messages: Vec<_> = first.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }
}
