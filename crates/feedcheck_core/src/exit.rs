use crate::Summary;

/// Maps a run summary to a process exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    pub ignore_invalid: bool,
    pub fail_on_transient: bool,
}

impl ExitPolicy {
    pub fn exit_code(&self, summary: &Summary) -> u8 {
        let invalid_fails = summary.invalid > 0 && !self.ignore_invalid;
        let transient_fails = summary.transient > 0 && self.fail_on_transient;
        if invalid_fails || transient_fails {
            1
        } else {
            0
        }
    }
}
