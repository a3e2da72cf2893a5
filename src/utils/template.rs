//! String template rendering utilities.
//!
//! Two placeholder forms are supported:
//! - `{{name}}` for pipeline variables (artifact name, version, ...)
//! - `${NAME}` for environment variables, resolved through a lookup

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

pub struct TemplateVars;

impl TemplateVars {
    pub const ARTIFACT_NAME: &'static str = "artifactName";
    pub const VERSION: &'static str = "version";
    pub const ARTIFACT_FILE: &'static str = "artifactFile";
    pub const WORKING_DIR: &'static str = "workingDir";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

pub fn is_present(template: &str, key: &str) -> bool {
    template.contains(&format!("{{{{{}}}}}", key))
}

static ENV_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace `${NAME}` references using `lookup`.
///
/// A reference that `lookup` cannot resolve is a `config.missing_key` error;
/// nothing is substituted silently.
pub fn expand_env<'a, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for caps in ENV_REF_PATTERN.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = lookup(name.as_str()).ok_or_else(|| Error::missing_env(name.as_str()))?;

        result.push_str(&template[last..whole.start()]);
        result.push_str(value);
        last = whole.end();
    }

    result.push_str(&template[last..]);
    Ok(result)
}
