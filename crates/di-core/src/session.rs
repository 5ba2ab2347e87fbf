//! Session-scoped state
//!
//! A [`SessionContext`] owns the current dataset and the ordered list of
//! chart configurations. Each user session holds exactly one; uploading a
//! dataset replaces the previous one wholesale, and tearing the session
//! down discards everything. All state mutation goes through these methods
//! so a failed operation can never leave partial edits behind.

use tracing::info;

use crate::config::{ChartConfig, ChartId, ConfigError};
use crate::dataset::Dataset;

/// Upper bound on configured charts per session.
pub const MAX_CHARTS: usize = 10;

#[derive(Debug, Default)]
pub struct SessionContext {
    dataset: Option<Dataset>,
    charts: Vec<ChartConfig>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Install a new dataset, returning the one it displaced. Chart
    /// configurations are kept; they are re-validated against the new
    /// columns when next used.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> Option<Dataset> {
        info!(name = dataset.name(), rows = dataset.num_rows(), "dataset replaced");
        self.dataset.replace(dataset)
    }

    pub fn clear_dataset(&mut self) -> Option<Dataset> {
        self.dataset.take()
    }

    /// Charts in render order (insertion order).
    pub fn charts(&self) -> &[ChartConfig] {
        &self.charts
    }

    pub fn chart(&self, id: ChartId) -> Option<&ChartConfig> {
        self.charts.iter().find(|chart| chart.id() == id)
    }

    pub fn chart_mut(&mut self, id: ChartId) -> Option<&mut ChartConfig> {
        self.charts.iter_mut().find(|chart| chart.id() == id)
    }

    pub fn add_chart(&mut self, config: ChartConfig) -> Result<ChartId, ConfigError> {
        if self.charts.len() >= MAX_CHARTS {
            return Err(ConfigError::ChartLimit(MAX_CHARTS));
        }
        let id = config.id();
        self.charts.push(config);
        Ok(id)
    }

    /// Deep-copy a chart and insert the copy right after the original.
    pub fn duplicate_chart(&mut self, id: ChartId) -> Result<ChartId, ConfigError> {
        if self.charts.len() >= MAX_CHARTS {
            return Err(ConfigError::ChartLimit(MAX_CHARTS));
        }
        let position = self
            .charts
            .iter()
            .position(|chart| chart.id() == id)
            .ok_or(ConfigError::UnknownChart(id))?;
        let copy = self.charts[position].duplicate();
        let copy_id = copy.id();
        self.charts.insert(position + 1, copy);
        Ok(copy_id)
    }

    pub fn remove_chart(&mut self, id: ChartId) -> Result<ChartConfig, ConfigError> {
        let position = self
            .charts
            .iter()
            .position(|chart| chart.id() == id)
            .ok_or(ConfigError::UnknownChart(id))?;
        Ok(self.charts.remove(position))
    }

    pub fn remove_all_charts(&mut self) {
        self.charts.clear();
    }

    /// End-of-session cleanup.
    pub fn teardown(&mut self) {
        self.dataset = None;
        self.charts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Aggregate, BarChartConfig};

    fn bar(x: &str) -> ChartConfig {
        ChartConfig::Bar(BarChartConfig::new(x, Aggregate::Count))
    }

    #[test]
    fn test_chart_limit() {
        let mut session = SessionContext::new();
        for _ in 0..MAX_CHARTS {
            session.add_chart(bar("region")).unwrap();
        }
        assert_eq!(
            session.add_chart(bar("region")).unwrap_err(),
            ConfigError::ChartLimit(MAX_CHARTS)
        );
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let mut session = SessionContext::new();
        let first = session.add_chart(bar("a")).unwrap();
        let _second = session.add_chart(bar("b")).unwrap();

        let copy = session.duplicate_chart(first).unwrap();
        let ids: Vec<ChartId> = session.charts().iter().map(|chart| chart.id()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[1], copy);
    }

    #[test]
    fn test_remove_unknown_chart() {
        let mut session = SessionContext::new();
        let id = ChartId::new_v4();
        assert_eq!(session.remove_chart(id).unwrap_err(), ConfigError::UnknownChart(id));
    }

    #[test]
    fn test_teardown_discards_state() {
        let mut session = SessionContext::new();
        session.add_chart(bar("a")).unwrap();
        session.teardown();
        assert!(session.dataset().is_none());
        assert!(session.charts().is_empty());
    }
}
