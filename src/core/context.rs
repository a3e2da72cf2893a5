//! Read-only values shared by every step body during a run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::command::{ProcessRunner, SystemProcessRunner};
use crate::utils::template::{self, TemplateVars};

pub const DEFAULT_ARTIFACT_EXTENSION: &str = "tgz";

/// Name and version of the artifact a pipeline produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub name: String,
    pub version: String,
    pub extension: String,
}

impl ArtifactDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// `<name>-<version>.<extension>`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.name, self.version, self.extension)
    }
}

pub struct ExecutionContext {
    working_dir: PathBuf,
    artifact: Result<ArtifactDescriptor>,
    artifact_path: Option<String>,
    env: HashMap<String, String>,
    processes: Box<dyn ProcessRunner>,
}

impl ExecutionContext {
    /// Snapshot the process environment and run commands on the host.
    pub fn new(working_dir: impl Into<PathBuf>, artifact: ArtifactDescriptor) -> Self {
        Self::with_deferred_artifact(working_dir, Ok(artifact))
    }

    /// Like [`ExecutionContext::new`], but an artifact descriptor that failed
    /// to resolve is only reported when a step reads it.
    pub fn with_deferred_artifact(
        working_dir: impl Into<PathBuf>,
        artifact: Result<ArtifactDescriptor>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            artifact,
            artifact_path: None,
            env: std::env::vars().collect(),
            processes: Box::new(SystemProcessRunner),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_process_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.processes = runner;
        self
    }

    /// Path or glob locating the packed artifact, relative to the working directory.
    pub fn with_artifact_path(mut self, pattern: Option<String>) -> Self {
        self.artifact_path = pattern;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn artifact(&self) -> Result<&ArtifactDescriptor> {
        self.artifact.as_ref().map_err(Clone::clone)
    }

    pub fn processes(&self) -> &dyn ProcessRunner {
        self.processes.as_ref()
    }

    pub fn env(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Read an environment value a step cannot run without.
    pub fn require_env(&self, name: &str) -> Result<&str> {
        self.env(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::missing_env(name))
    }

    /// Expected location of the packed artifact.
    ///
    /// Uses the configured artifact path when present, else
    /// `<working_dir>/<name>-<version>.<ext>`. Relative patterns are joined
    /// onto the working directory.
    pub fn artifact_pattern(&self) -> Result<String> {
        let relative = match &self.artifact_path {
            Some(pattern) => pattern.clone(),
            None => self.artifact()?.file_name(),
        };
        let rendered = self.render_vars(&relative)?;

        if Path::new(&rendered).is_absolute() {
            Ok(rendered)
        } else {
            Ok(self.working_dir.join(rendered).to_string_lossy().to_string())
        }
    }

    /// Render `{{var}}` placeholders and `${ENV}` references in a step argument.
    ///
    /// Empty environment values count as missing, as in `require_env`.
    pub fn render(&self, input: &str) -> Result<String> {
        let rendered = self.render_vars(input)?;
        template::expand_env(&rendered, |name| {
            self.env(name).filter(|value| !value.is_empty())
        })
    }

    /// The artifact descriptor is only consulted when `input` references it.
    fn render_vars(&self, input: &str) -> Result<String> {
        let working_dir = self.working_dir.to_string_lossy().to_string();
        let rendered = template::render(input, &[(TemplateVars::WORKING_DIR, working_dir.as_str())]);

        let artifact_vars = [
            TemplateVars::ARTIFACT_NAME,
            TemplateVars::VERSION,
            TemplateVars::ARTIFACT_FILE,
        ];
        if !artifact_vars.iter().any(|key| template::is_present(&rendered, key)) {
            return Ok(rendered);
        }

        let artifact = self.artifact()?;
        let file_name = artifact.file_name();
        Ok(template::render(
            &rendered,
            &[
                (TemplateVars::ARTIFACT_NAME, artifact.name.as_str()),
                (TemplateVars::VERSION, artifact.version.as_str()),
                (TemplateVars::ARTIFACT_FILE, file_name.as_str()),
            ],
        ))
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("working_dir", &self.working_dir)
            .field("artifact", &self.artifact)
            .field("artifact_path", &self.artifact_path)
            .field("env_vars", &self.env.len())
            .finish_non_exhaustive()
    }
}
