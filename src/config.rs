use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-run options for [`crate::DeltaStepping`].
///
/// Every acceleration is optional and none of them can change the distances returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsspConfig {
    /// Bucket width Δ. `None` uses half the average edge weight.
    pub delta: Option<f64>,
    /// Number of landmarks. `None` uses ⌈√N⌉.
    pub landmark_count: Option<usize>,
    /// Seed lower bounds from a contracted graph hierarchy
    pub hierarchy_enabled: bool,
    /// Skip relaxations the landmark oracle proves useless
    pub pruning_enabled: bool,
    /// Worker threads for batch relaxation; 0 or 1 runs sequentially
    pub parallelism: usize,
    /// Batches smaller than this are relaxed on the calling thread
    pub parallel_batch_threshold: usize,
    /// Target number of nodes per region when building the hierarchy
    pub region_size_target: usize,
    /// Maximum number of contracted levels
    pub max_hierarchy_levels: usize,
    /// Wall-clock budget for landmark precomputation
    pub landmark_time_budget: Option<Duration>,
    /// Memory budget in bytes for landmark distance rows
    pub landmark_memory_budget: Option<usize>,
    /// Abort the run (between buckets) once this much time has passed
    pub time_limit: Option<Duration>,
    /// Keep every accepted distance update in the result
    pub record_updates: bool,
}

impl Default for SsspConfig {
    fn default() -> Self {
        SsspConfig {
            delta: None,
            landmark_count: None,
            hierarchy_enabled: false,
            pruning_enabled: false,
            parallelism: 1,
            parallel_batch_threshold: 256,
            region_size_target: 100,
            max_hierarchy_levels: 4,
            landmark_time_budget: None,
            landmark_memory_budget: None,
            time_limit: None,
            record_updates: false,
        }
    }
}

impl SsspConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SsspConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the bucket width
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Set the number of landmarks
    pub fn with_landmark_count(mut self, count: usize) -> Self {
        self.landmark_count = Some(count);
        self
    }

    /// Enable or disable hierarchy-guided seeding
    pub fn with_hierarchy(mut self, enabled: bool) -> Self {
        self.hierarchy_enabled = enabled;
        self
    }

    /// Enable or disable landmark pruning
    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.pruning_enabled = enabled;
        self
    }

    /// Set the number of worker threads
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers;
        self
    }

    pub fn with_parallel_batch_threshold(mut self, threshold: usize) -> Self {
        self.parallel_batch_threshold = threshold;
        self
    }

    /// Set the target region size for hierarchy construction
    pub fn with_region_size_target(mut self, nodes: usize) -> Self {
        self.region_size_target = nodes;
        self
    }

    pub fn with_max_hierarchy_levels(mut self, levels: usize) -> Self {
        self.max_hierarchy_levels = levels;
        self
    }

    pub fn with_landmark_time_budget(mut self, budget: Duration) -> Self {
        self.landmark_time_budget = Some(budget);
        self
    }

    pub fn with_landmark_memory_budget(mut self, bytes: usize) -> Self {
        self.landmark_memory_budget = Some(bytes);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_update_recording(mut self, enabled: bool) -> Self {
        self.record_updates = enabled;
        self
    }

    /// Rejects values no run could use
    pub fn validate(&self) -> Result<()> {
        if let Some(delta) = self.delta {
            if !(delta.is_finite() && delta > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "delta must be positive and finite, got {}",
                    delta
                )));
            }
        }
        if self.region_size_target == 0 {
            return Err(Error::InvalidConfig(
                "region_size_target must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Landmarks to select for a graph with `n` nodes
    pub fn effective_landmark_count(&self, n: usize) -> usize {
        match self.landmark_count {
            Some(k) => k.min(n),
            None => ((n as f64).sqrt().ceil() as usize).min(n),
        }
    }

    /// Worker count actually used
    pub fn workers(&self) -> usize {
        self.parallelism.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = SsspConfig::new()
            .with_delta(2.5)
            .with_landmark_count(4)
            .with_hierarchy(true)
            .with_pruning(true)
            .with_parallelism(8)
            .with_region_size_target(50);
        assert_eq!(config.delta, Some(2.5));
        assert_eq!(config.landmark_count, Some(4));
        assert!(config.hierarchy_enabled && config.pruning_enabled);
        assert_eq!(config.workers(), 8);
        assert_eq!(config.region_size_target, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_delta() {
        assert!(SsspConfig::new().with_delta(0.0).validate().is_err());
        assert!(SsspConfig::new().with_delta(f64::NAN).validate().is_err());
        assert!(SsspConfig::new().with_region_size_target(0).validate().is_err());
    }

    #[test]
    fn landmark_count_defaults_to_sqrt_n() {
        let config = SsspConfig::default();
        assert_eq!(config.effective_landmark_count(100), 10);
        assert_eq!(config.effective_landmark_count(10), 4);
        assert_eq!(config.effective_landmark_count(0), 0);
        assert_eq!(config.with_landmark_count(50).effective_landmark_count(10), 10);
    }

    #[test]
    fn parses_partial_json() {
        let config = SsspConfig::from_json(r#"{ "delta": 3.0, "parallelism": 4 }"#).unwrap();
        assert_eq!(config.delta, Some(3.0));
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.region_size_target, 100);

        assert!(matches!(
            SsspConfig::from_json(r#"{ "delta": -1.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SsspConfig::from_json("not json"),
            Err(Error::ConfigParse(_))
        ));
    }
}
