use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use stagehand::config::CONFIG_FILE_NAMES;
use stagehand::defaults;
use stagehand::io;

use super::CmdResult;

#[derive(Args)]
pub struct InitArgs {
    /// Artifact name (default: current directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Artifact version
    #[arg(long = "artifact-version", default_value = "0.1.0")]
    pub version: String,

    /// Overwrite an existing stagehand.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutput {
    pub command: &'static str,
    pub path: String,
    pub next_steps: Vec<String>,
}

pub fn run(args: InitArgs, global: &super::GlobalArgs) -> CmdResult<InitOutput> {
    let cwd = std::env::current_dir().map_err(|e| {
        stagehand::Error::internal_io(e.to_string(), Some("current dir".to_string()))
    })?;

    let path = match &global.config {
        Some(explicit) => PathBuf::from(shellexpand::tilde(explicit).to_string()),
        None => cwd.join(CONFIG_FILE_NAMES[0]),
    };

    if path.exists() && !args.force {
        return Err(stagehand::Error::validation_invalid_argument(
            "path",
            format!("{} already exists", path.display()),
            Some(path.display().to_string()),
            Some(vec!["Re-run with --force to overwrite".to_string()]),
        ));
    }

    semver::Version::parse(&args.version).map_err(|e| {
        stagehand::Error::validation_invalid_argument(
            "version",
            format!("'{}' is not a semantic version: {}", args.version, e),
            None,
            None,
        )
    })?;

    let name = match args.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => cwd
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| stagehand::Error::validation_missing_argument(vec!["name".to_string()]))?,
    };

    let config = defaults::starter_config(&name, &args.version);
    let content = serde_json::to_string_pretty(&config).map_err(|e| {
        stagehand::Error::internal_json(e.to_string(), Some("serialize config".to_string()))
    })?;
    io::write_file(&path, &format!("{}\n", content), "write stagehand.json")?;

    Ok((
        InitOutput {
            command: "init",
            path: path.display().to_string(),
            next_steps: vec![
                format!("stagehand plan {}", defaults::PUBLISH),
                format!(
                    "export {}=<dir> && stagehand run {}",
                    defaults::DEFAULT_LOCAL_REPOSITORY_ENV,
                    defaults::PUBLISH_LOCAL
                ),
            ],
        },
        0,
    ))
}
