//! The standard packaging pipeline: `pack`, `publish`, `publish_local`.

use serde_json::{json, Value};

use crate::actions::{CommandAction, CopyToLocalRepository};
use crate::registry::StepRegistry;
use crate::step::StepBody;

pub const PACK: &str = "pack";
pub const PUBLISH: &str = "publish";
pub const PUBLISH_LOCAL: &str = "publish_local";

pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";
pub const DEFAULT_LOCAL_REPOSITORY_ENV: &str = "STAGEHAND_LOCAL_REPOSITORY";

#[derive(Debug, Clone)]
pub struct StandardSteps {
    pub package_manager: String,
    pub local_repository_env: String,
}

impl Default for StandardSteps {
    fn default() -> Self {
        Self {
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            local_repository_env: DEFAULT_LOCAL_REPOSITORY_ENV.to_string(),
        }
    }
}

/// Seed `registry` with the standard steps.
///
/// Bodies are installed as defaults, not overrides, so a later
/// `override_body` shows up as the only override in plans.
pub fn register_standard_steps(registry: &mut StepRegistry, standard: &StandardSteps) {
    registry
        .get_or_create(PACK)
        .set_default_body(StepBody::action(CommandAction::new(
            standard.package_manager.clone(),
            &["pack"],
        )));

    registry
        .depends_on(PUBLISH, [PACK])
        .set_default_body(StepBody::action(CommandAction::new(
            standard.package_manager.clone(),
            &["publish", "{{artifactFile}}"],
        )));

    registry
        .depends_on(PUBLISH_LOCAL, [PACK])
        .set_default_body(StepBody::action(CopyToLocalRepository::new(
            standard.local_repository_env.clone(),
        )));
}

/// Starter `stagehand.json` written by `stagehand init`.
pub fn starter_config(name: &str, version: &str) -> Value {
    json!({
        "artifact": {
            "name": name,
            "version": version,
        },
        "packageManager": DEFAULT_PACKAGE_MANAGER,
        "localRepositoryEnv": DEFAULT_LOCAL_REPOSITORY_ENV,
        "steps": {},
        "overrides": {},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::PipelineRunner;

    #[test]
    fn standard_pipeline_shape() {
        let mut registry = StepRegistry::new();
        register_standard_steps(&mut registry, &StandardSteps::default());

        assert_eq!(registry.names(), [PACK, PUBLISH, PUBLISH_LOCAL]);
        assert_eq!(registry.dependencies_of(PUBLISH), [PACK]);
        assert_eq!(registry.dependencies_of(PUBLISH_LOCAL), [PACK]);
        assert!(registry.steps().all(|step| !step.is_overridden()));

        let order = PipelineRunner::new(&registry).plan(PUBLISH_LOCAL).unwrap();
        assert_eq!(order, [PACK, PUBLISH_LOCAL]);
    }

    #[test]
    fn standard_bodies_use_package_manager() {
        let mut registry = StepRegistry::new();
        register_standard_steps(
            &mut registry,
            &StandardSteps {
                package_manager: "pnpm".to_string(),
                local_repository_env: "LOCAL_REPO".to_string(),
            },
        );

        let describe = |name: &str| registry.step(name).unwrap().body().describe();
        assert_eq!(describe(PACK), "command `pnpm pack`");
        assert_eq!(describe(PUBLISH), "command `pnpm publish {{artifactFile}}`");
        assert!(describe(PUBLISH_LOCAL).contains("${LOCAL_REPO}"));
    }

    #[test]
    fn starter_config_names_artifact() {
        let config = starter_config("widgets", "0.1.0");
        assert_eq!(config["artifact"]["name"], "widgets");
        assert_eq!(config["artifact"]["version"], "0.1.0");
    }
}
