//! Built-in step bodies: external commands and local repository publishing.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::step::{ActionOutput, StepAction};
use crate::utils::artifact;
use crate::utils::command::Invocation;
use crate::utils::io;

/// Runs an external program in the working directory.
///
/// Arguments are rendered at execution time, so `${ENV}` references are only
/// required when the step actually runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAction {
    pub program: String,
    pub args: Vec<String>,
    pub require_env: Vec<String>,
}

impl CommandAction {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            require_env: Vec::new(),
        }
    }

    pub fn requiring_env(mut self, names: Vec<String>) -> Self {
        self.require_env = names;
        self
    }

    fn invocation(&self, ctx: &ExecutionContext) -> Result<Invocation> {
        for name in &self.require_env {
            ctx.require_env(name)?;
        }

        let program = ctx.render(&self.program)?;
        let args = self
            .args
            .iter()
            .map(|arg| ctx.render(arg))
            .collect::<Result<Vec<_>>>()?;

        Ok(Invocation::new(program, args).in_dir(ctx.working_dir()))
    }
}

impl StepAction for CommandAction {
    fn execute(&self, step: &str, ctx: &ExecutionContext) -> Result<ActionOutput> {
        let invocation = self.invocation(ctx)?;
        log_status!("run", "{}: {}", step, invocation.display());

        let output = ctx
            .processes()
            .run(&invocation)?
            .require_success(&invocation)?;

        Ok(ActionOutput {
            exit_code: Some(output.exit_code),
        })
    }

    fn describe(&self) -> String {
        let mut described = if self.args.is_empty() {
            format!("command `{}`", self.program)
        } else {
            format!("command `{} {}`", self.program, self.args.join(" "))
        };
        if !self.require_env.is_empty() {
            described.push_str(&format!(" (requires {})", self.require_env.join(", ")));
        }
        described
    }
}

/// Copies the packed artifact into a local repository directory named by an
/// environment variable, alongside a `.sha256` checksum file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyToLocalRepository {
    pub env_var: String,
}

impl CopyToLocalRepository {
    pub const BUILTIN_NAME: &'static str = "copy_to_local_repository";

    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    fn repository_dir(&self, ctx: &ExecutionContext) -> Result<PathBuf> {
        let raw = ctx.require_env(&self.env_var)?;
        let expanded = shellexpand::tilde(raw).to_string();
        Ok(PathBuf::from(expanded))
    }
}

impl StepAction for CopyToLocalRepository {
    fn execute(&self, step: &str, ctx: &ExecutionContext) -> Result<ActionOutput> {
        let repository = self.repository_dir(ctx)?;
        let source = artifact::locate(&ctx.artifact_pattern()?)?;
        let file_name = match source.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => ctx.artifact()?.file_name(),
        };

        io::ensure_dir(&repository, "create local repository")?;
        let destination = repository.join(&file_name);

        // Copying a file onto itself truncates it.
        if same_file(&source, &destination) {
            log_status!("run", "{}: {} already in {}", step, file_name, repository.display());
        } else {
            io::copy_file(&source, &destination, "copy artifact")?;
            log_status!("run", "{}: copied {} to {}", step, file_name, repository.display());
        }

        let bytes = io::read_bytes(&destination, "read artifact")?;
        let checksum = format!("{:x}", Sha256::digest(&bytes));
        let checksum_path = repository.join(format!("{}.sha256", file_name));
        io::write_file(
            &checksum_path,
            &format!("{}  {}\n", checksum, file_name),
            "write checksum",
        )?;

        Ok(ActionOutput::default())
    }

    fn describe(&self) -> String {
        format!("builtin {} (${{{}}})", Self::BUILTIN_NAME, self.env_var)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
