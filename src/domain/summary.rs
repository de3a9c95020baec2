// ============================================================
// RUN SUMMARY
// ============================================================
// Incrementally built counters and sampled diagnostics for one run

use serde::Serialize;

/// Only the first N error/warning strings are kept, in source-line order,
/// which is why validation must report errors in field-declaration order.
pub const MAX_SAMPLED_ISSUES: usize = 20;

/// Why a record failed. Distinct kinds are distinct operator signals:
/// bad source data, missing setup data, or an external-store refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Structural,
    Validation,
    Referential,
    Persistence,
}

impl FailureKind {
    fn label(&self) -> &'static str {
        match self {
            FailureKind::Structural => "structural",
            FailureKind::Validation => "validation",
            FailureKind::Referential => "referential",
            FailureKind::Persistence => "persistence",
        }
    }
}

/// Outcome of one orchestrator run over a bounded line range.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub created: usize,
    /// Already present under the same natural key; not an error.
    pub skipped: usize,
    pub errors: usize,
    pub structural_errors: usize,
    pub validation_errors: usize,
    pub referential_errors: usize,
    pub persistence_errors: usize,
    pub warnings: usize,
    pub media_downloaded: usize,
    pub media_reused: usize,
    pub media_failed: usize,
    /// First `MAX_SAMPLED_ISSUES` errors, keyed by source line number.
    pub error_samples: Vec<String>,
    pub warning_samples: Vec<String>,
    /// 1-based data-line offset a follow-up run should start from.
    pub next_start_offset: usize,
    /// True when a deadline stopped the run before the batch end.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn record_error(&mut self, line_number: usize, kind: FailureKind, message: &str) {
        self.errors += 1;
        match kind {
            FailureKind::Structural => self.structural_errors += 1,
            FailureKind::Validation => self.validation_errors += 1,
            FailureKind::Referential => self.referential_errors += 1,
            FailureKind::Persistence => self.persistence_errors += 1,
        }
        if self.error_samples.len() < MAX_SAMPLED_ISSUES {
            self.error_samples
                .push(format!("line {}: [{}] {}", line_number, kind.label(), message));
        }
    }

    pub fn record_warning(&mut self, line_number: usize, message: &str) {
        self.warnings += 1;
        if self.warning_samples.len() < MAX_SAMPLED_ISSUES {
            self.warning_samples
                .push(format!("line {}: {}", line_number, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_is_bounded() {
        let mut summary = RunSummary::default();
        for i in 0..(MAX_SAMPLED_ISSUES + 10) {
            summary.record_error(i + 2, FailureKind::Validation, "bad");
        }
        assert_eq!(summary.errors, MAX_SAMPLED_ISSUES + 10);
        assert_eq!(summary.error_samples.len(), MAX_SAMPLED_ISSUES);
        assert!(summary.error_samples[0].starts_with("line 2:"));
    }

    #[test]
    fn test_kind_counters() {
        let mut summary = RunSummary::default();
        summary.record_error(2, FailureKind::Referential, "unknown category: zzz");
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.referential_errors, 1);
        assert_eq!(summary.validation_errors, 0);
    }
}
