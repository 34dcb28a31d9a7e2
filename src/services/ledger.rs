use serde::Serialize;

/// Response text the download queue returns for an accepted submission.
pub const ACCEPTED_RESPONSE: &str = "ok";

/// Append-only record of this run's submissions, one
/// `"<fixed title>: <response>"` line each.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SessionLedger {
    entries: Vec<String>,
}

impl SessionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, fixed_title: &str, response: &str) {
        self.entries.push(format!("{fixed_title}: {}", response.trim()));
    }

    /// True when `fixed_title` was accepted earlier in this run.
    #[must_use]
    pub fn has_submitted(&self, fixed_title: &str) -> bool {
        let accepted = format!("{fixed_title}: {ACCEPTED_RESPONSE}");
        self.entries.iter().any(|e| *e == accepted)
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub total_feeds: usize,
    pub failed_feeds: usize,
    pub items: usize,
    pub unresolved: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub submitted: usize,
}

/// Everything a run reports once it finishes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Lines flagged for the operator (duplicates found, files replaced,
    /// feed failures).
    pub notices: Vec<String>,

    pub ledger: SessionLedger,

    pub stats: RunStats,
}

impl RunSummary {
    pub fn notice(&mut self, line: impl Into<String>) {
        self.notices.push(line.into());
    }

    /// The report as printed at the end of a run.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let mut lines = self.notices.clone();
        lines.extend(
            self.ledger
                .entries()
                .iter()
                .map(|entry| format!("Queued for download: {entry}")),
        );
        lines.push(format!(
            "Number of reports added to the queue: {}",
            self.ledger.len()
        ));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_matches_only_accepted_entries() {
        let mut ledger = SessionLedger::new();
        ledger.record("Show Name - 1x02 - Pilot", "ok\n");
        ledger.record("Other - 2x01 - Start", "error: bad url");

        assert!(ledger.has_submitted("Show Name - 1x02 - Pilot"));
        assert!(!ledger.has_submitted("Other - 2x01 - Start"));
        assert!(!ledger.has_submitted("show name - 1x02 - pilot"));
        assert_eq!(ledger.entries()[0], "Show Name - 1x02 - Pilot: ok");
    }

    #[test]
    fn test_render_summary() {
        let mut summary = RunSummary::default();
        summary.notice("Episode on disk: /tv/Show/Show - 1x01 - A.mkv");
        summary.ledger.record("Show - 1x02 - B", "ok");

        assert_eq!(
            summary.render(),
            vec![
                "Episode on disk: /tv/Show/Show - 1x01 - A.mkv".to_string(),
                "Queued for download: Show - 1x02 - B: ok".to_string(),
                "Number of reports added to the queue: 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_empty_summary() {
        assert_eq!(
            RunSummary::default().render(),
            vec!["Number of reports added to the queue: 0".to_string()]
        );
    }
}
