use anyhow::{anyhow, Context, Result};
use gat_core::Network;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ScalingResult;
use crate::parameters::ScalingParameters;
use crate::report::ScalingReporter;
use crate::scalable::Scalable;
use crate::up_down::UpDownScalable;

/// Serializable description of a scaling tree.
///
/// ```yaml
/// type: stack
/// children:
///   - { type: generator, id: g1 }
///   - { type: load, id: l1, min: 20, max: 80 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalableSpec {
    Generator {
        id: String,
        #[serde(flatten)]
        limits: LimitsSpec,
    },
    Load {
        id: String,
        #[serde(flatten)]
        limits: LimitsSpec,
    },
    DanglingLine {
        id: String,
        #[serde(flatten)]
        limits: LimitsSpec,
    },
    Stack {
        children: Vec<ScalableSpec>,
        #[serde(flatten)]
        limits: LimitsSpec,
    },
    Proportional {
        percentages: Vec<f64>,
        children: Vec<ScalableSpec>,
        #[serde(flatten)]
        limits: LimitsSpec,
    },
    UpDown {
        up: Box<ScalableSpec>,
        down: Box<ScalableSpec>,
        #[serde(default)]
        deactivated: Vec<String>,
    },
}

/// Optional `[min, max]` range; both ends must be given together.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LimitsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl LimitsSpec {
    fn resolve(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(-f64::MAX), max.unwrap_or(f64::MAX))),
        }
    }
}

impl ScalableSpec {
    /// Build the tree; construction errors are reported as they would be
    /// by the `Scalable` constructors.
    pub fn build(&self) -> ScalingResult<Scalable> {
        match self {
            ScalableSpec::Generator { id, limits } => match limits.resolve() {
                Some((min, max)) => Scalable::on_generator_with_limits(id, min, max),
                None => Scalable::on_generator(id),
            },
            ScalableSpec::Load { id, limits } => match limits.resolve() {
                Some((min, max)) => Scalable::on_load_with_limits(id, min, max),
                None => Scalable::on_load(id),
            },
            ScalableSpec::DanglingLine { id, limits } => match limits.resolve() {
                Some((min, max)) => Scalable::on_dangling_line_with_limits(id, min, max),
                None => Scalable::on_dangling_line(id),
            },
            ScalableSpec::Stack { children, limits } => {
                let children = build_all(children)?;
                Ok(match limits.resolve() {
                    Some((min, max)) => Scalable::stack_with_limits(children, min, max),
                    None => Scalable::stack(children),
                })
            }
            ScalableSpec::Proportional {
                percentages,
                children,
                limits,
            } => {
                let children = build_all(children)?;
                let (min, max) = limits.resolve().unwrap_or((-f64::MAX, f64::MAX));
                Scalable::proportional_with_limits(percentages.clone(), children, min, max)
            }
            ScalableSpec::UpDown {
                up,
                down,
                deactivated,
            } => {
                let mut node = UpDownScalable::new(up.build()?, down.build()?);
                node.deactivate_scalables(deactivated.iter().cloned());
                Ok(Scalable::UpDown(node))
            }
        }
    }
}

fn build_all(specs: &[ScalableSpec]) -> ScalingResult<Vec<Scalable>> {
    specs.iter().map(ScalableSpec::build).collect()
}

/// A complete scaling request: what to scale, by how much, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPlan {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub parameters: ScalingParameters,
    pub asked: f64,
    pub scalable: ScalableSpec,
}

fn default_label() -> String {
    "scaling".to_string()
}

impl ScalingPlan {
    /// Build the tree and apply the plan to `network`, reporting once.
    pub fn run(&self, network: &mut Network, reporter: &mut dyn ScalingReporter) -> Result<f64> {
        let scalable = self
            .scalable
            .build()
            .with_context(|| format!("building scalable for plan '{}'", self.label))?;
        let done = scalable
            .scale_reported(network, self.asked, &self.parameters, &self.label, reporter)
            .with_context(|| format!("running plan '{}'", self.label))?;
        Ok(done)
    }
}

pub fn load_parameters_from_path(path: &Path) -> Result<ScalingParameters> {
    load_document(path, "scaling parameters")
}

pub fn load_plan_from_path(path: &Path) -> Result<ScalingPlan> {
    let plan: ScalingPlan = load_document(path, "scaling plan")?;
    if !plan.asked.is_finite() {
        return Err(anyhow!("plan '{}' asks for a non-finite amount", plan.label));
    }
    plan.scalable
        .build()
        .with_context(|| format!("validating plan '{}'", plan.label))?;
    Ok(plan)
}

/// Read YAML or JSON chosen by extension; unknown extensions try both.
fn load_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading {what} '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).with_context(|| format!("parsing {what} yaml"))
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).with_context(|| format!("parsing {what} json"))
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .with_context(|| format!("parsing {what}")),
    }
}
