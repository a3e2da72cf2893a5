use clap::Args;
use serde::Serialize;

use stagehand::runner::{PipelineRunner, PlannedStep};

use super::{load_pipeline, require_target, CmdResult};

#[derive(Args)]
pub struct PlanArgs {
    /// Step to plan
    pub target: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PlanOutput {
    #[serde(rename = "plan")]
    Plan {
        target: String,
        steps: Vec<PlannedStep>,
    },
}

pub fn run(args: PlanArgs, global: &super::GlobalArgs) -> CmdResult<PlanOutput> {
    let target = require_target(&args.target)?;
    let (_config, registry) = load_pipeline(global)?;

    let steps = PipelineRunner::new(&registry).describe_plan(target)?;
    Ok((
        PlanOutput::Plan {
            target: target.to_string(),
            steps,
        },
        0,
    ))
}
