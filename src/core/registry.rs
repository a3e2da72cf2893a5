use std::collections::HashMap;

use crate::step::{Step, StepBody};

/// Owns every step of a pipeline, keyed by name.
///
/// Names are created on first reference, so a step can be depended upon
/// before (or without) being configured.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: HashMap<String, Step>,
    order: Vec<String>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, name: &str) -> &mut Step {
        if !self.steps.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.steps
            .entry(name.to_string())
            .or_insert_with(|| Step::new(name))
    }

    pub fn depends_on<I, S>(&mut self, name: &str, others: I) -> &mut Step
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let others: Vec<String> = others.into_iter().map(Into::into).collect();
        for other in &others {
            // Referenced names exist from here on, even if never configured.
            self.get_or_create(other);
        }
        let step = self.get_or_create(name);
        step.depends_on(others);
        step
    }

    pub fn override_body(&mut self, name: &str, body: StepBody) -> &mut Step {
        let step = self.get_or_create(name);
        step.override_body(body);
        step
    }

    /// Lookup without creating.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    /// Dependencies of `name`; empty for names never referenced.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.steps
            .get(name)
            .map(Step::dependencies)
            .unwrap_or(&[])
    }

    /// Step names in first-reference order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.order.iter().filter_map(|name| self.steps.get(name))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
