//! Generation pipeline.
//!
//! The generation stages run as an explicit ordered list of steps,
//! constructed once per run and handed to the batch runner. Step
//! dependencies are validated up front: dispatch needs demand and
//! renewable ceilings, the loss estimate needs demand.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One stage of chronics generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    /// Demand chronics per load node
    Load,
    /// Solar and wind ceiling chronics per production node
    Renewable,
    /// Standalone percentage-of-demand loss series
    Loss,
    /// Economic dispatch reconciled against the flow evaluator
    Dispatch,
}

impl GenerationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStep::Load => "load",
            GenerationStep::Renewable => "renewable",
            GenerationStep::Loss => "loss",
            GenerationStep::Dispatch => "dispatch",
        }
    }
}

impl std::str::FromStr for GenerationStep {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "load" => Ok(GenerationStep::Load),
            "renewable" => Ok(GenerationStep::Renewable),
            "loss" => Ok(GenerationStep::Loss),
            "dispatch" => Ok(GenerationStep::Dispatch),
            other => Err(anyhow!(
                "unknown generation step '{other}'; use load, renewable, loss, or dispatch"
            )),
        }
    }
}

/// Ordered, validated list of generation steps for one run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<GenerationStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<GenerationStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(anyhow!("pipeline needs at least one step"));
        }
        let mut seen = Vec::new();
        for step in &steps {
            if seen.contains(step) {
                return Err(anyhow!("duplicate step '{}' in pipeline", step.as_str()));
            }
            seen.push(*step);
        }
        let pipeline = Self { steps };
        if pipeline.contains(GenerationStep::Dispatch)
            && !(pipeline.contains(GenerationStep::Load)
                && pipeline.contains(GenerationStep::Renewable))
        {
            return Err(anyhow!(
                "dispatch requires the load and renewable steps in the same pipeline"
            ));
        }
        if pipeline.contains(GenerationStep::Loss) && !pipeline.contains(GenerationStep::Load) {
            return Err(anyhow!("the loss step requires the load step"));
        }
        Ok(pipeline)
    }

    /// The full run: demand, renewables, reconciled dispatch.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                GenerationStep::Load,
                GenerationStep::Renewable,
                GenerationStep::Dispatch,
            ],
        }
    }

    /// Parse a comma-separated step list, e.g. `load,renewable,dispatch`.
    pub fn parse(spec: &str) -> Result<Self> {
        let steps = spec
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>>>()?;
        Self::new(steps)
    }

    pub fn steps(&self) -> &[GenerationStep] {
        &self.steps
    }

    pub fn contains(&self, step: GenerationStep) -> bool {
        self.steps.contains(&step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline() {
        let pipeline = Pipeline::standard();
        assert!(pipeline.contains(GenerationStep::Dispatch));
        assert_eq!(pipeline.steps().len(), 3);
    }

    #[test]
    fn test_parse_roundtrip() {
        let pipeline = Pipeline::parse("load,renewable,dispatch").unwrap();
        assert_eq!(
            pipeline.steps(),
            &[
                GenerationStep::Load,
                GenerationStep::Renewable,
                GenerationStep::Dispatch
            ]
        );
        assert!(Pipeline::parse("load,teleport").is_err());
    }

    #[test]
    fn test_dispatch_needs_inputs() {
        assert!(Pipeline::new(vec![GenerationStep::Dispatch]).is_err());
        assert!(Pipeline::new(vec![
            GenerationStep::Load,
            GenerationStep::Dispatch
        ])
        .is_err());
        assert!(Pipeline::new(vec![
            GenerationStep::Load,
            GenerationStep::Renewable,
            GenerationStep::Dispatch
        ])
        .is_ok());
    }

    #[test]
    fn test_loss_needs_load() {
        assert!(Pipeline::new(vec![GenerationStep::Loss]).is_err());
        assert!(Pipeline::new(vec![GenerationStep::Load, GenerationStep::Loss]).is_ok());
    }

    #[test]
    fn test_duplicates_rejected() {
        assert!(Pipeline::new(vec![GenerationStep::Load, GenerationStep::Load]).is_err());
        assert!(Pipeline::parse("").is_err());
    }
}
