use log::{error, info, warn};
use pyrig_backend::{BackendError, StepOutcome};

/// Outcomes of the steps of one run, in execution order.
#[derive(Debug, Default)]
pub struct RunReport {
    entries: Vec<(&'static str, StepOutcome)>,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step's outcome and log it. Returns `false` when the outcome
    /// is fatal and the run must stop.
    pub fn record(&mut self, step: &'static str, outcome: StepOutcome) -> bool {
        match &outcome {
            StepOutcome::Success => info!("[ok] {step}"),
            StepOutcome::SkippedWarning(reason) => warn!("[skipped] {step}: {reason}"),
            StepOutcome::Fatal(reason) => error!("[failed] {step}: {reason}"),
        }
        let keep_going = !outcome.is_fatal();
        self.entries.push((step, outcome));
        keep_going
    }

    #[must_use]
    pub fn steps(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(step, _)| *step).collect()
    }

    #[must_use]
    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| *name == step)
            .map(|(_, outcome)| outcome)
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().filter_map(|(step, outcome)| match outcome {
            StepOutcome::SkippedWarning(reason) => Some((*step, reason.as_str())),
            _ => None,
        })
    }

    #[must_use]
    pub fn fatal(&self) -> Option<(&'static str, &BackendError)> {
        self.entries.iter().find_map(|(step, outcome)| match outcome {
            StepOutcome::Fatal(reason) => Some((*step, reason)),
            _ => None,
        })
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.fatal().is_some())
    }

    pub fn log_summary(&self) {
        let warnings: Vec<_> = self.warnings().collect();
        if !warnings.is_empty() {
            warn!("Completed with {} warning(s):", warnings.len());
            for (step, reason) in warnings {
                warn!("  {step}: {reason}");
            }
        }

        match self.fatal() {
            Some((step, reason)) => error!("Aborted during {step}: {reason}"),
            None => info!("All steps completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pyrig_backend::{BackendError, StepOutcome};

    use super::RunReport;

    #[test]
    fn record_signals_stop_on_fatal() {
        let mut report = RunReport::new();

        assert!(report.record("preflight", StepOutcome::Success));
        assert!(report.record(
            "optional packages",
            StepOutcome::SkippedWarning("tk-dev unavailable".to_string())
        ));
        assert!(!report.record("channel", StepOutcome::Fatal(BackendError::Privilege)));

        assert_eq!(
            report.steps(),
            vec!["preflight", "optional packages", "channel"]
        );
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn warnings_do_not_change_exit_code() {
        let mut report = RunReport::new();
        report.record(
            "optional packages",
            StepOutcome::SkippedWarning("libncursesw5-dev unavailable".to_string()),
        );

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.warnings().count(), 1);
        assert!(report.fatal().is_none());
    }
}
