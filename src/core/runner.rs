//! Dependency-ordered execution of a target step.
//!
//! Resolution is a depth-first walk from the target: dependencies run in
//! declared order before the step that needs them, and every step runs at
//! most once per run. The whole order is resolved before any body executes,
//! so a reachable cycle aborts the run with nothing executed.

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::{Error, ErrorCode, Result};
use crate::registry::StepRegistry;
use crate::step::{ActionOutput, StepBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Executed,
    NoOp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub target: String,
    pub started_at: String,
    pub finished_at: String,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn executed(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|record| record.outcome == StepOutcome::Executed)
            .map(|record| record.name.as_str())
            .collect()
    }
}

/// A resolved step as shown by `plan`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub overridden: bool,
    pub body: String,
    pub declared: bool,
}

pub struct PipelineRunner<'a> {
    registry: &'a StepRegistry,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(registry: &'a StepRegistry) -> Self {
        Self { registry }
    }

    /// Execution order for `target`, dependencies first.
    pub fn plan(&self, target: &str) -> Result<Vec<String>> {
        let mut resolution = Resolution {
            target,
            stack: Vec::new(),
            visited: HashSet::new(),
            order: Vec::new(),
        };
        self.visit(target, &mut resolution)?;
        Ok(resolution.order)
    }

    fn visit(&self, name: &str, resolution: &mut Resolution<'_>) -> Result<()> {
        if resolution.visited.contains(name) {
            return Ok(());
        }

        if let Some(pos) = resolution.stack.iter().position(|active| active == name) {
            let mut cycle = resolution.stack[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(Error::cyclic_dependency(resolution.target, cycle));
        }

        resolution.stack.push(name.to_string());
        for dependency in self.registry.dependencies_of(name) {
            self.visit(dependency, resolution)?;
        }
        resolution.stack.pop();

        resolution.visited.insert(name.to_string());
        resolution.order.push(name.to_string());
        Ok(())
    }

    /// Resolved order with each step's edges and body description.
    pub fn describe_plan(&self, target: &str) -> Result<Vec<PlannedStep>> {
        let order = self.plan(target)?;
        Ok(order
            .into_iter()
            .map(|name| match self.registry.step(&name) {
                Some(step) => PlannedStep {
                    depends_on: step.dependencies().to_vec(),
                    overridden: step.is_overridden(),
                    body: step.body().describe(),
                    declared: true,
                    name,
                },
                None => PlannedStep {
                    depends_on: Vec::new(),
                    overridden: false,
                    body: StepBody::NoOp.describe(),
                    declared: false,
                    name,
                },
            })
            .collect())
    }

    /// Run `target` and everything it depends on.
    ///
    /// Stops at the first failing body; steps that already completed are
    /// not undone.
    pub fn run(&self, target: &str, ctx: &ExecutionContext) -> Result<RunReport> {
        let order = self.plan(target)?;
        let started_at = chrono::Utc::now().to_rfc3339();
        let mut steps = Vec::with_capacity(order.len());

        log_status!("run", "{} ({} steps)", target, order.len());

        for name in order {
            let started = Instant::now();
            let body = self.registry.step(&name).map(|step| step.body());

            let (outcome, output) = match body {
                None | Some(StepBody::NoOp) => (StepOutcome::NoOp, ActionOutput::default()),
                Some(StepBody::Unimplemented) => {
                    return Err(Error::step_not_implemented(&name));
                }
                Some(StepBody::Action(action)) => {
                    log_status!("run", "{}", name);
                    let output = action
                        .execute(&name, ctx)
                        .map_err(|err| attribute_failure(&name, err))?;
                    (StepOutcome::Executed, output)
                }
            };

            steps.push(StepRecord {
                name,
                outcome,
                duration_ms: started.elapsed().as_millis() as u64,
                exit_code: output.exit_code,
            });
        }

        Ok(RunReport {
            run_id: Uuid::new_v4().to_string(),
            target: target.to_string(),
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            steps,
        })
    }
}

struct Resolution<'t> {
    target: &'t str,
    stack: Vec<String>,
    visited: HashSet<String>,
    order: Vec<String>,
}

/// Missing configuration and unimplemented markers keep their own kind;
/// every other body failure becomes `step.execution_failed`.
fn attribute_failure(step: &str, err: Error) -> Error {
    match err.code {
        ErrorCode::ConfigMissingKey | ErrorCode::StepNotImplemented => err.with_step(step),
        _ => Error::step_execution_failed(step, err),
    }
}
