//! CLI response formatting and output.
//!
//! Provides the JSON envelope, printing, and exit code mapping.

use serde::Serialize;

use crate::error::{Error, ErrorCode, Hint, Result};

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

pub fn print_json_result(result: Result<serde_json::Value>) -> Result<()> {
    match result {
        Ok(data) => print_response(&CliResponse::success(data)),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(&err);
            (Err(err), exit_code)
        }
    }
}

/// Process exit code for a failed command.
///
/// A failed step mirrors the status of the process that failed it.
pub fn exit_code_for_error(err: &Error) -> i32 {
    match err.code {
        ErrorCode::StepExecutionFailed | ErrorCode::CommandFailed => match err.exit_code() {
            Some(code) if code > 0 => code.min(255),
            _ => 1,
        },

        ErrorCode::ConfigNotFound
        | ErrorCode::ConfigMissingKey
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationMissingArgument
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::PipelineCyclicDependency => 2,

        ErrorCode::StepNotImplemented
        | ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandFailedDetails;

    fn failed_step(exit_code: i32) -> Error {
        Error::step_execution_failed(
            "pack",
            Error::command_failed(CommandFailedDetails {
                command: "npm pack".to_string(),
                exit_code,
                stdout: "some stdout".to_string(),
                stderr: "some stderr".to_string(),
                working_dir: Some("/work".to_string()),
            }),
        )
    }

    #[test]
    fn step_failure_serializes_cause() {
        let json = CliResponse::<()>::from_error(&failed_step(127)).to_json().unwrap();

        assert!(json.contains("\"code\": \"step.execution_failed\""));
        assert!(json.contains("\"step\": \"pack\""));
        assert!(json.contains("some stderr"));
        assert!(json.contains("\"exitCode\": 127"));
    }

    #[test]
    fn step_failure_exit_code_mirrors_process() {
        let (_value, exit_code) = map_cmd_result_to_json::<serde_json::Value>(Err(failed_step(3)));
        assert_eq!(exit_code, 3);
    }

    #[test]
    fn step_failure_without_status_exits_one() {
        let err = Error::step_execution_failed("pack", Error::internal_unexpected("boom"));
        assert_eq!(exit_code_for_error(&err), 1);
        assert_eq!(exit_code_for_error(&failed_step(-1)), 1);
        assert_eq!(exit_code_for_error(&failed_step(300)), 255);
    }

    #[test]
    fn configuration_errors_exit_two() {
        assert_eq!(exit_code_for_error(&Error::missing_env("LOCAL_REPO")), 2);
        assert_eq!(
            exit_code_for_error(&Error::cyclic_dependency("a", vec!["a".into(), "a".into()])),
            2
        );
    }

    #[test]
    fn success_envelope_omits_error() {
        let json = CliResponse::success(serde_json::json!({ "ok": true }))
            .to_json()
            .unwrap();
        assert!(json.contains("\"success\": true"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn hints_are_omitted_when_empty() {
        let err = Error::internal_unexpected("boom");
        let response = CliResponse::<()>::from_error(&err);
        assert!(response.error.unwrap().hints.is_none());
    }
}
