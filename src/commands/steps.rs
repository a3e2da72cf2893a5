use clap::Args;
use serde::Serialize;

use super::{load_pipeline, CmdResult};

#[derive(Args)]
pub struct StepsArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub overridden: bool,
    pub body: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum StepsOutput {
    #[serde(rename = "steps")]
    List {
        #[serde(skip_serializing_if = "Option::is_none")]
        config: Option<String>,
        steps: Vec<StepEntry>,
    },
}

pub fn run(_args: StepsArgs, global: &super::GlobalArgs) -> CmdResult<StepsOutput> {
    let (config, registry) = load_pipeline(global)?;

    let steps = registry
        .steps()
        .map(|step| StepEntry {
            name: step.name().to_string(),
            depends_on: step.dependencies().to_vec(),
            overridden: step.is_overridden(),
            body: step.body().describe(),
        })
        .collect();

    Ok((
        StepsOutput::List {
            config: config.source.map(|p| p.display().to_string()),
            steps,
        },
        0,
    ))
}
