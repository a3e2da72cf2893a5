use crate::actions::{CommandAction, CopyToLocalRepository};
use crate::context::{ArtifactDescriptor, ExecutionContext, DEFAULT_ARTIFACT_EXTENSION};
use crate::defaults::{self, StandardSteps};
use crate::error::{Error, Result};
use crate::registry::StepRegistry;
use crate::step::StepBody;
use crate::utils::io;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: &[&str] = &["stagehand.json", "stagehand.yml", "stagehand.yaml"];

// ============================================================================
// File model
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// Root structure of `stagehand.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,

    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    #[serde(default = "default_local_repository_env")]
    pub local_repository_env: String,

    #[serde(default = "default_true")]
    pub standard_steps: bool,

    /// Step entries in file order.
    #[serde(default)]
    pub steps: Map<String, Value>,

    /// Body replacements applied after `steps`.
    #[serde(default)]
    pub overrides: Map<String, Value>,

    /// File this config was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_package_manager() -> String {
    defaults::DEFAULT_PACKAGE_MANAGER.to_string()
}

fn default_local_repository_env() -> String {
    defaults::DEFAULT_LOCAL_REPOSITORY_ENV.to_string()
}

fn default_true() -> bool {
    true
}

/// One entry under `steps` or `overrides`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StepEntry {
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    require_env: Vec<String>,
    #[serde(default)]
    builtin: Option<String>,
    #[serde(default)]
    unimplemented: bool,
}

// ============================================================================
// Loading
// ============================================================================

/// Find the pipeline config in `dir`, trying each known file name.
pub fn discover(dir: &Path) -> Result<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::config_not_found(dir.join(CONFIG_FILE_NAMES[0]).display().to_string()))
}

/// Load from an explicit path, or discover in the current directory.
pub fn resolve(explicit: Option<&str>) -> Result<PipelineConfig> {
    let path = match explicit {
        Some(path) => {
            let expanded = PathBuf::from(shellexpand::tilde(path).to_string());
            if !expanded.is_file() {
                return Err(Error::config_not_found(expanded.display().to_string()));
            }
            expanded
        }
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| Error::internal_io(e.to_string(), Some("current dir".to_string())))?;
            discover(&cwd)?
        }
    };

    load(&path)
}

pub fn load(path: &Path) -> Result<PipelineConfig> {
    let content = io::read_file(path, "read pipeline config")?;
    let mut config = parse(&content, path)?;
    config.source = Some(path.to_path_buf());
    log_status!("config", "Loaded {}", path.display());
    Ok(config)
}

/// Parse config text; YAML for `.yml`/`.yaml`, JSON otherwise.
pub fn parse(content: &str, path: &Path) -> Result<PipelineConfig> {
    let display = path.display().to_string();
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    );

    if is_yaml {
        serde_yml::from_str(content).map_err(|e| Error::config_invalid_json(display, e.to_string()))
    } else {
        serde_json::from_str(content)
            .map_err(|e| Error::config_invalid_json(display, e.to_string()))
    }
}

// ============================================================================
// Interpretation
// ============================================================================

impl PipelineConfig {
    /// Artifact descriptor; name and a semver version are required.
    pub fn artifact(&self) -> Result<ArtifactDescriptor> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| Error::config_missing_key("artifact", self.source_display()))?;

        let name = non_empty(artifact.name.as_deref())
            .ok_or_else(|| Error::config_missing_key("artifact.name", self.source_display()))?;
        let version = non_empty(artifact.version.as_deref())
            .ok_or_else(|| Error::config_missing_key("artifact.version", self.source_display()))?;

        semver::Version::parse(version).map_err(|e| {
            Error::config_invalid_value(
                "artifact.version",
                Some(version.to_string()),
                format!("not a semantic version: {}", e),
            )
        })?;

        let extension = non_empty(artifact.extension.as_deref()).unwrap_or(DEFAULT_ARTIFACT_EXTENSION);

        Ok(ArtifactDescriptor::new(name, version).with_extension(extension))
    }

    /// Working directory: `workingDir` (tilde/env expanded, relative to the
    /// config file), else the config file's directory, else the current dir.
    pub fn working_dir(&self) -> Result<PathBuf> {
        let base = match self.source.as_ref().and_then(|p| p.parent()) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()
                .map_err(|e| Error::internal_io(e.to_string(), Some("current dir".to_string())))?,
        };

        match non_empty(self.working_dir.as_deref()) {
            Some(raw) => {
                let expanded = shellexpand::full(raw).map_err(|e| {
                    Error::config_invalid_value("workingDir", Some(raw.to_string()), e.to_string())
                })?;
                Ok(base.join(expanded.as_ref()))
            }
            None => Ok(base),
        }
    }

    pub fn standard_steps(&self) -> StandardSteps {
        StandardSteps {
            package_manager: self.package_manager.clone(),
            local_repository_env: self.local_repository_env.clone(),
        }
    }

    /// Build the step registry: standard steps, then `steps`, then `overrides`.
    pub fn build_registry(&self) -> Result<StepRegistry> {
        let mut registry = StepRegistry::new();

        if self.standard_steps {
            defaults::register_standard_steps(&mut registry, &self.standard_steps());
        }

        for (name, raw) in &self.steps {
            let entry = parse_entry("steps", name, raw)?;
            if !entry.depends_on.is_empty() {
                registry.depends_on(name, entry.depends_on.iter().cloned());
            } else {
                registry.get_or_create(name);
            }
            if let Some(body) = self.body_for("steps", name, &entry)? {
                registry.override_body(name, body);
            }
        }

        for (name, raw) in &self.overrides {
            let entry = parse_entry("overrides", name, raw)?;
            let body = self.body_for("overrides", name, &entry)?.ok_or_else(|| {
                Error::config_invalid_value(
                    format!("overrides.{}", name),
                    None,
                    "override must set command, builtin, or unimplemented",
                )
            })?;
            registry.override_body(name, body);
            if !entry.depends_on.is_empty() {
                registry.depends_on(name, entry.depends_on.iter().cloned());
            }
        }

        Ok(registry)
    }

    /// Execution context snapshotting the current process environment.
    ///
    /// Artifact settings are validated here but only reported by the step
    /// that reads them.
    pub fn execution_context(&self) -> Result<ExecutionContext> {
        Ok(
            ExecutionContext::with_deferred_artifact(self.working_dir()?, self.artifact())
                .with_artifact_path(self.artifact_path.clone()),
        )
    }

    fn body_for(&self, section: &str, name: &str, entry: &StepEntry) -> Result<Option<StepBody>> {
        let key = format!("{}.{}", section, name);
        let forms = [
            entry.command.is_some(),
            entry.builtin.is_some(),
            entry.unimplemented,
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if forms > 1 {
            return Err(Error::config_invalid_value(
                key,
                None,
                "set only one of command, builtin, unimplemented",
            ));
        }

        if entry.command.is_none() && (!entry.args.is_empty() || !entry.require_env.is_empty()) {
            return Err(Error::config_invalid_value(
                key,
                None,
                "args and requireEnv need a command",
            ));
        }

        if let Some(command) = &entry.command {
            if command.trim().is_empty() {
                return Err(Error::config_invalid_value(key, None, "command is empty"));
            }
            return Ok(Some(StepBody::action(CommandAction {
                program: command.clone(),
                args: entry.args.clone(),
                require_env: entry.require_env.clone(),
            })));
        }

        if let Some(builtin) = &entry.builtin {
            return match builtin.as_str() {
                "noop" => Ok(Some(StepBody::NoOp)),
                CopyToLocalRepository::BUILTIN_NAME => Ok(Some(StepBody::action(
                    CopyToLocalRepository::new(self.local_repository_env.clone()),
                ))),
                other => Err(Error::config_invalid_value(
                    key,
                    Some(other.to_string()),
                    format!(
                        "unknown builtin; expected one of: noop, {}",
                        CopyToLocalRepository::BUILTIN_NAME
                    ),
                )),
            };
        }

        if entry.unimplemented {
            return Ok(Some(StepBody::Unimplemented));
        }

        Ok(None)
    }

    fn source_display(&self) -> Option<String> {
        self.source.as_ref().map(|p| p.display().to_string())
    }
}

fn parse_entry(section: &str, name: &str, raw: &Value) -> Result<StepEntry> {
    if name.trim().is_empty() {
        return Err(Error::config_invalid_value(
            section,
            None,
            "step names cannot be empty",
        ));
    }

    serde_json::from_value(raw.clone()).map_err(|e| {
        Error::config_invalid_value(
            format!("{}.{}", section, name),
            Some(raw.to_string()),
            e.to_string(),
        )
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
