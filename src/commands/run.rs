use clap::Args;
use serde::Serialize;

use stagehand::runner::{PipelineRunner, RunReport};

use super::{load_pipeline, require_target, CmdResult};

#[derive(Args)]
pub struct RunArgs {
    /// Step to run (its dependencies run first)
    pub target: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RunOutput {
    #[serde(rename = "run")]
    Run {
        #[serde(flatten)]
        report: RunReport,
    },
}

pub fn run(args: RunArgs, global: &super::GlobalArgs) -> CmdResult<RunOutput> {
    let target = require_target(&args.target)?;
    let (config, registry) = load_pipeline(global)?;
    let ctx = config.execution_context()?;

    let report = PipelineRunner::new(&registry).run(target, &ctx)?;
    Ok((RunOutput::Run { report }, 0))
}
