//! Subprocess helper.

use std::process::{Command, Output};

use crate::error::{BackendError, Result};

/// Run `command` to completion, failing on a non-zero exit.
pub fn run(command: &mut Command) -> Result<Output> {
    let program = describe(command);
    log::debug!("running {program}");
    let output = command.output()?;
    if !output.status.success() {
        return Err(BackendError::Process {
            program,
            status: output.status.to_string(),
            stderr: tail(&output),
        });
    }
    Ok(output)
}

/// First line of `command`'s stdout if it runs successfully.
pub fn first_line(command: &mut Command) -> Option<String> {
    let output = command.output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}

fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Last lines of stderr (or stdout when stderr is empty).
fn tail(output: &Output) -> String {
    let text = if output.stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        String::from_utf8_lossy(&output.stderr)
    };
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_io_error() {
        let err = run(&mut Command::new("/nonexistent/brmstan-tool")).unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
        assert!(first_line(&mut Command::new("/nonexistent/brmstan-tool")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_stderr() {
        let err = run(Command::new("sh").args(["-c", "echo broken >&2; exit 3"])).unwrap_err();
        match err {
            BackendError::Process { stderr, program, .. } => {
                assert_eq!(stderr, "broken");
                assert!(program.starts_with("sh -c"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
