use anyhow::Context;
use cpscore::CpsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::profile::ScenarioConfig;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub cps: CpsConfig,
    pub scenario: ScenarioConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(points: usize, seed: u64, verbose: bool) -> Self {
        let scenario = ScenarioConfig {
            points,
            seed,
            ..Default::default()
        };
        Self {
            cps: CpsConfig {
                geopt_name: scenario.geopt_name.clone(),
                plev_name: scenario.plev_name.clone(),
                verbose,
                time_fields: cpscore::TimeFields::Components,
                ..Default::default()
            },
            scenario,
        }
    }

    /// The generated dataset must use the names the pipeline looks up.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.cps.validate().context("validating cps section")?;
        anyhow::ensure!(
            self.cps.geopt_name == self.scenario.geopt_name,
            "cps.geopt_name '{}' does not match scenario.geopt_name '{}'",
            self.cps.geopt_name,
            self.scenario.geopt_name
        );
        Ok(())
    }
}
