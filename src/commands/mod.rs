use stagehand::config::{self, PipelineConfig};
use stagehand::StepRegistry;

pub type CmdResult<T> = stagehand::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Explicit `--config` path.
    pub config: Option<String>,
}

/// Load the pipeline config and build its step registry.
pub(crate) fn load_pipeline(global: &GlobalArgs) -> stagehand::Result<(PipelineConfig, StepRegistry)> {
    let config = config::resolve(global.config.as_deref())?;
    let registry = config.build_registry()?;
    Ok((config, registry))
}

pub(crate) fn require_target(target: &str) -> stagehand::Result<&str> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(stagehand::Error::validation_missing_argument(vec![
            "target".to_string(),
        ]));
    }
    Ok(trimmed)
}

pub mod init;
pub mod plan;
pub mod run;
pub mod steps;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        stagehand::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (stagehand::Result<serde_json::Value>, i32) {
    crate::tty::status("stagehand is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Steps(args) => dispatch!(args, global, steps),
        crate::Commands::Init(args) => dispatch!(args, global, init),
    }
}
