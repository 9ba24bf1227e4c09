//! Diagnostics collected over a pipeline run.
//!
//! Data-coverage gaps (a zone without an outline, buses outside every modelled
//! authority, override ids that match no bus) are recovered locally and recorded
//! here, then reported as one summary at the end of the run. Issues carry:
//!
//! - a severity (Warning, Error)
//! - a category used for grouping (`coverage`, `orphan`, `parse`, ...)
//! - an optional entity reference (e.g., "bus 37584", "line 12")
//! - an optional row number for table-based inputs
//!
//! # Example
//!
//! ```
//! use gridreduce_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_coverage_gap("SPP-WAUE", "no outline for balancing authority");
//! diag.add_orphan("line", "12", "bus 37584 was never assigned a zone");
//!
//! assert_eq!(diag.warning_count(), 2);
//! assert_eq!(diag.issues_by_category("orphan").count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recovered locally; the run continued
    Warning,
    /// Could not complete the element or operation
    Error,
}

/// A single diagnostic issue encountered during a run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    /// Row number (for table-based inputs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            row: None,
            entity: None,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(row) = self.row {
            write!(f, " at row {}", row)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for a run.
///
/// Each pipeline stage returns one of these; the CLI merges them and prints the
/// summary once the run has finished.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_at_row(&mut self, category: &str, message: &str, row: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_row(row));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    /// A zone (country, authority or offshore area) produced no region.
    pub fn add_coverage_gap(&mut self, zone: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, "coverage", message)
                .with_entity(format!("zone {zone}")),
        );
    }

    /// An element was pruned because the bus it references was removed.
    pub fn add_orphan(&mut self, kind: &str, id: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, "orphan", message)
                .with_entity(format!("{kind} {id}")),
        );
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// One-line summary, e.g. "3 warnings (2 coverage, 1 orphan)".
    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        let mut categories: Vec<(&str, usize)> = Vec::new();
        for issue in &self.issues {
            match categories.iter_mut().find(|(c, _)| *c == issue.category) {
                Some((_, n)) => *n += 1,
                None => categories.push((&issue.category, 1)),
            }
        }
        categories.sort();
        let breakdown = categories
            .iter()
            .map(|(c, n)| format!("{n} {c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{} ({})", w, plural(w), breakdown),
            (w, e) => format!(
                "{} warning{}, {} error{} ({})",
                w,
                plural(w),
                e,
                plural(e),
                breakdown
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
