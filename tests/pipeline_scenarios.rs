use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use stagehand::runner::{PipelineRunner, StepOutcome};
use stagehand::{ArtifactDescriptor, Error, ErrorCode, ExecutionContext, StepBody, StepRegistry};

type Log = Rc<RefCell<Vec<String>>>;

fn context() -> ExecutionContext {
    ExecutionContext::new("/tmp", ArtifactDescriptor::new("widgets", "1.0.0"))
        .with_env(HashMap::new())
}

fn recorder(log: &Log, label: &str) -> StepBody {
    let log = Rc::clone(log);
    let label = label.to_string();
    StepBody::from_fn(label.clone(), move |_| {
        log.borrow_mut().push(label.clone());
        Ok(())
    })
}

#[test]
fn never_registered_name_runs_as_noop() {
    let registry = StepRegistry::new();
    let runner = PipelineRunner::new(&registry);

    let report = runner.run("anything", &context()).unwrap();

    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].name, "anything");
    assert_eq!(report.steps[0].outcome, StepOutcome::NoOp);
    assert!(report.executed().is_empty());
}

#[test]
fn repeated_override_leaves_last_body_active() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    for label in ["first", "second", "last"] {
        registry.override_body("publish", recorder(&log, label));
    }

    PipelineRunner::new(&registry).run("publish", &context()).unwrap();

    assert_eq!(*log.borrow(), ["last"]);
}

#[test]
fn diamond_dependency_runs_shared_step_once() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    for name in ["a", "b", "c", "d"] {
        registry.override_body(name, recorder(&log, name));
    }
    registry.depends_on("a", ["b", "c"]);
    registry.depends_on("b", ["d"]);
    registry.depends_on("c", ["d"]);

    PipelineRunner::new(&registry).run("a", &context()).unwrap();

    assert_eq!(*log.borrow(), ["d", "b", "c", "a"]);
}

#[test]
fn reachable_cycle_fails_before_any_body_runs() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    registry.override_body("a", recorder(&log, "a"));
    registry.override_body("b", recorder(&log, "b"));
    registry.override_body("leaf", recorder(&log, "leaf"));
    registry.depends_on("a", ["leaf", "b"]);
    registry.depends_on("b", ["a"]);

    let err = PipelineRunner::new(&registry).run("a", &context()).unwrap_err();

    assert_eq!(err.code, ErrorCode::PipelineCyclicDependency);
    assert_eq!(err.details["cycle"], serde_json::json!(["a", "b", "a"]));
    assert!(log.borrow().is_empty());
}

#[test]
fn failed_dependency_stops_dependent() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    registry.override_body(
        "x",
        StepBody::from_fn("x", |_| Err(Error::internal_unexpected("x exploded"))),
    );
    registry.override_body("y", recorder(&log, "y"));
    registry.override_body("other", recorder(&log, "other"));
    registry.depends_on("y", ["other", "x"]);

    let err = PipelineRunner::new(&registry).run("y", &context()).unwrap_err();

    assert_eq!(err.code, ErrorCode::StepExecutionFailed);
    assert_eq!(err.step(), Some("x"));
    assert!(err.message.contains("x exploded"));
    // Completed steps are not rolled back; the dependent never starts.
    assert_eq!(*log.borrow(), ["other"]);
}

#[test]
fn publish_local_runs_pack_first_exactly_once() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    registry.override_body("pack", recorder(&log, "pack"));
    registry.override_body("publish_local", recorder(&log, "publish_local"));
    registry.depends_on("publish_local", ["pack"]);

    let report = PipelineRunner::new(&registry)
        .run("publish_local", &context())
        .unwrap();

    assert_eq!(*log.borrow(), ["pack", "publish_local"]);
    assert_eq!(report.executed(), ["pack", "publish_local"]);
}

#[test]
fn override_then_depends_on_accumulates_edges() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    registry.override_body("pack", recorder(&log, "pack"));
    registry.override_body("publish", recorder(&log, "old publish"));
    registry.override_body("publish", recorder(&log, "new publish"));
    registry.depends_on("publish", ["pack"]);

    PipelineRunner::new(&registry).run("publish", &context()).unwrap();

    assert_eq!(*log.borrow(), ["pack", "new publish"]);
    assert!(registry.step("publish").unwrap().is_overridden());
}

#[test]
fn steps_may_be_referenced_before_configuration() {
    let log: Log = Default::default();
    let mut registry = StepRegistry::new();
    registry.depends_on("publish", ["pack"]);
    // Configured after being referenced as a dependency.
    registry.override_body("pack", recorder(&log, "pack"));

    PipelineRunner::new(&registry).run("publish", &context()).unwrap();

    assert_eq!(*log.borrow(), ["pack"]);
}
