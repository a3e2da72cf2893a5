use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use stagehand::command::{CommandOutput, Invocation, ProcessRunner};
use stagehand::config;
use stagehand::runner::PipelineRunner;
use stagehand::{ErrorCode, ExecutionContext, Result};

struct FakeProcesses {
    calls: Rc<RefCell<Vec<Invocation>>>,
    failing: Option<(&'static str, i32)>,
}

impl ProcessRunner for FakeProcesses {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());

        let fails = self
            .failing
            .filter(|(arg, _)| invocation.args.iter().any(|a| a == arg));
        if let Some((_, code)) = fails {
            return Ok(CommandOutput {
                stdout: String::new(),
                stderr: "npm ERR! publish failed".to_string(),
                success: false,
                exit_code: code,
            });
        }

        // `pack` leaves the artifact behind like a real package manager would.
        if invocation.args.first().map(String::as_str) == Some("pack") {
            if let Some(dir) = &invocation.working_dir {
                fs::write(dir.join("widgets-1.4.0.tgz"), b"tarball").unwrap();
            }
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        })
    }
}

fn write_config(dir: &Path, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("stagehand.json");
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn context_for(
    config: &config::PipelineConfig,
    env: &[(&str, &str)],
    failing: Option<(&'static str, i32)>,
) -> (ExecutionContext, Rc<RefCell<Vec<Invocation>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let ctx = config
        .execution_context()
        .unwrap()
        .with_env(env)
        .with_process_runner(Box::new(FakeProcesses {
            calls: Rc::clone(&calls),
            failing,
        }));
    (ctx, calls)
}

#[test]
fn standard_publish_local_packs_then_copies() {
    let work = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    let path = write_config(
        work.path(),
        serde_json::json!({ "artifact": { "name": "widgets", "version": "1.4.0" } }),
    );

    let config = config::load(&path).unwrap();
    let registry = config.build_registry().unwrap();
    let (ctx, calls) = context_for(
        &config,
        &[("STAGEHAND_LOCAL_REPOSITORY", repo.path().to_str().unwrap())],
        None,
    );

    let report = PipelineRunner::new(&registry)
        .run("publish_local", &ctx)
        .unwrap();

    assert_eq!(report.executed(), ["pack", "publish_local"]);
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(calls.borrow()[0].display(), "npm pack");
    assert!(repo.path().join("widgets-1.4.0.tgz").is_file());
    assert!(repo.path().join("widgets-1.4.0.tgz.sha256").is_file());
}

#[test]
fn publish_local_without_repository_env_is_missing_configuration() {
    let work = tempfile::tempdir().unwrap();
    let path = write_config(
        work.path(),
        serde_json::json!({ "artifact": { "name": "widgets", "version": "1.4.0" } }),
    );

    let config = config::load(&path).unwrap();
    let registry = config.build_registry().unwrap();
    let (ctx, calls) = context_for(&config, &[], None);

    let err = PipelineRunner::new(&registry)
        .run("publish_local", &ctx)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    assert_eq!(err.step(), Some("publish_local"));
    assert_eq!(err.details["key"], "STAGEHAND_LOCAL_REPOSITORY");
    // Raised lazily: pack already ran.
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn overridden_publish_reports_process_status() {
    let work = tempfile::tempdir().unwrap();
    let path = write_config(
        work.path(),
        serde_json::json!({
            "artifact": { "name": "widgets", "version": "1.4.0" },
            "overrides": {
                "publish": {
                    "command": "npm",
                    "args": ["publish", "{{artifactFile}}", "--tag", "${NPM_TAG}"]
                }
            }
        }),
    );

    let config = config::load(&path).unwrap();
    let registry = config.build_registry().unwrap();
    let (ctx, calls) = context_for(&config, &[("NPM_TAG", "next")], Some(("publish", 65)));

    let err = PipelineRunner::new(&registry).run("publish", &ctx).unwrap_err();

    assert_eq!(err.code, ErrorCode::StepExecutionFailed);
    assert_eq!(err.step(), Some("publish"));
    assert_eq!(err.exit_code(), Some(65));
    assert_eq!(err.details["cause"]["details"]["stderr"], "npm ERR! publish failed");
    assert_eq!(stagehand::output::exit_code_for_error(&err), 65);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].args, ["publish", "widgets-1.4.0.tgz", "--tag", "next"]);
}

#[test]
fn config_cycle_is_reported_without_running() {
    let work = tempfile::tempdir().unwrap();
    let path = write_config(
        work.path(),
        serde_json::json!({
            "artifact": { "name": "widgets", "version": "1.4.0" },
            "steps": { "pack": { "dependsOn": ["publish"] } }
        }),
    );

    let config = config::load(&path).unwrap();
    let registry = config.build_registry().unwrap();
    let (ctx, calls) = context_for(&config, &[], None);

    let err = PipelineRunner::new(&registry).run("publish", &ctx).unwrap_err();

    assert_eq!(err.code, ErrorCode::PipelineCyclicDependency);
    assert_eq!(
        err.details["cycle"],
        serde_json::json!(["publish", "pack", "publish"])
    );
    assert!(calls.borrow().is_empty());
}
