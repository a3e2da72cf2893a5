//! Steps: named units of build work with prerequisite edges and a body.

use serde::Serialize;

use crate::context::ExecutionContext;
use crate::error::Result;

/// What a body reports back after it finished successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// The work a step performs once all of its dependencies have run.
pub trait StepAction {
    fn execute(&self, step: &str, ctx: &ExecutionContext) -> Result<ActionOutput>;

    /// Programmer-facing description, shown by `plan` and `steps`.
    fn describe(&self) -> String;
}

/// Adapts a closure into a [`StepAction`].
pub struct FnAction<F> {
    label: String,
    action: F,
}

impl<F> StepAction for FnAction<F>
where
    F: Fn(&ExecutionContext) -> Result<()>,
{
    fn execute(&self, _step: &str, ctx: &ExecutionContext) -> Result<ActionOutput> {
        (self.action)(ctx)?;
        Ok(ActionOutput::default())
    }

    fn describe(&self) -> String {
        format!("fn {}", self.label)
    }
}

pub enum StepBody {
    /// Runs nothing. Steps start out this way so they can act as pure
    /// dependency anchors.
    NoOp,
    /// Placeholder for work nobody has written yet; fails when executed.
    Unimplemented,
    Action(Box<dyn StepAction>),
}

impl StepBody {
    pub fn action(action: impl StepAction + 'static) -> Self {
        StepBody::Action(Box::new(action))
    }

    pub fn from_fn<F>(label: impl Into<String>, action: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Result<()> + 'static,
    {
        StepBody::Action(Box::new(FnAction {
            label: label.into(),
            action,
        }))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, StepBody::NoOp)
    }

    pub fn describe(&self) -> String {
        match self {
            StepBody::NoOp => "no-op".to_string(),
            StepBody::Unimplemented => "not yet implemented".to_string(),
            StepBody::Action(action) => action.describe(),
        }
    }
}

impl Default for StepBody {
    fn default() -> Self {
        StepBody::NoOp
    }
}

impl std::fmt::Debug for StepBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StepBody({})", self.describe())
    }
}

#[derive(Debug)]
pub struct Step {
    name: String,
    dependencies: Vec<String>,
    body: StepBody,
    overridden: bool,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            body: StepBody::NoOp,
            overridden: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prerequisite step names in declaration order. May contain duplicates.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn body(&self) -> &StepBody {
        &self.body
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn depends_on<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the body. Dependency edges are left untouched.
    pub fn override_body(&mut self, body: StepBody) -> &mut Self {
        self.body = body;
        self.overridden = true;
        self
    }

    /// Set the body without marking the step as overridden.
    pub(crate) fn set_default_body(&mut self, body: StepBody) -> &mut Self {
        self.body = body;
        self
    }
}
