//! Record of equipment that was passed over during an operation.
//!
//! Scaling treats "physically cannot do more" as a normal outcome, so an
//! injection that contributed nothing (missing, disconnected, islanded,
//! outside its limits) is noted here rather than raised as an error.
//!
//! ```
//! use gat_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("not-found", "generator missing from network", "G7");
//! diag.add_warning_with_entity("disconnected", "terminal is open", "L2");
//!
//! assert_eq!(diag.len(), 2);
//! assert_eq!(diag.entities_in_category("not-found"), vec!["G7"]);
//! ```

use serde::Serialize;
use std::fmt;

/// One skipped element and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    /// Short machine-readable reason, e.g. "not-found"
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        Ok(())
    }
}

/// Issues in the order they were met.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues.push(DiagnosticIssue {
            category: category.to_string(),
            message: message.to_string(),
            entity: Some(entity.to_string()),
        });
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        !self.is_empty()
    }

    pub fn issues_by_category<'a, 'c>(
        &'a self,
        category: &'c str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> + 'c
    where
        'a: 'c,
    {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Entities referenced by issues of one category, in insertion order.
    pub fn entities_in_category(&self, category: &str) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|i| i.category == category)
            .filter_map(|i| i.entity.as_deref())
            .collect()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.len() {
            0 => return writeln!(f, "no element skipped"),
            1 => writeln!(f, "1 element skipped")?,
            n => writeln!(f, "{n} elements skipped")?,
        }
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}
