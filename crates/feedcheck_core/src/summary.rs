use crate::{Status, ValidationResult};

/// Aggregate counts over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub valid: usize,
    pub invalid: usize,
    pub transient: usize,
    /// Valid results that carry an advisory message.
    pub warnings: usize,
    pub total: usize,
}

impl Summary {
    pub fn tally<'a>(results: impl IntoIterator<Item = &'a ValidationResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(result);
        }
        summary
    }

    pub fn record(&mut self, result: &ValidationResult) {
        match result.status() {
            Status::Valid => {
                self.valid += 1;
                if result.has_warning() {
                    self.warnings += 1;
                }
            }
            Status::Invalid => self.invalid += 1,
            Status::Transient => self.transient += 1,
        }
        self.total += 1;
    }
}
