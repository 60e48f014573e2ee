//! R runtime abstraction.
//!
//! An [`RProgram`] is a short R script whose last step binds `result` to a
//! character value. An [`RRuntime`] evaluates the program and hands back that
//! value as text. [`Rscript`] does so in a fresh `Rscript` process per call,
//! so no R state leaks between calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use brmstan_bridge::r_string;

use crate::error::{BrmsError, Result};

/// An R script producing a single character result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RProgram {
    statements: Vec<String>,
}

impl RProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw statement.
    pub fn stmt(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Append `name <- expr`.
    pub fn assign(self, name: &str, expr: impl AsRef<str>) -> Self {
        let statement = format!("{name} <- {}", expr.as_ref());
        self.stmt(statement)
    }

    /// Bind the program's result.
    pub fn result(self, expr: impl AsRef<str>) -> Self {
        self.assign("result", expr)
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Full script text, writing `result` to `output`.
    pub fn render(&self, output: &Path) -> String {
        let mut script = String::new();
        script.push_str("options(warn = 1)\n");
        for statement in &self.statements {
            script.push_str(statement);
            script.push('\n');
        }
        script.push_str(&format!(
            "writeLines(paste(as.character(result), collapse = \"\\n\"), {}, useBytes = TRUE)\n",
            r_string(&output.to_string_lossy())
        ));
        script
    }
}

/// Something that can evaluate an [`RProgram`].
pub trait RRuntime {
    /// Evaluate the program and return its character result.
    fn eval(&self, program: &RProgram) -> Result<String>;

    /// Human-readable description of the runtime, for diagnostics.
    fn describe(&self) -> String {
        "R runtime".to_string()
    }
}

impl<T: RRuntime + ?Sized> RRuntime for Box<T> {
    fn eval(&self, program: &RProgram) -> Result<String> {
        (**self).eval(program)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: RRuntime + ?Sized> RRuntime for Rc<T> {
    fn eval(&self, program: &RProgram) -> Result<String> {
        (**self).eval(program)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Runs programs with the `Rscript` executable.
#[derive(Debug, Clone)]
pub struct Rscript {
    executable: PathBuf,
}

impl Rscript {
    /// Use `Rscript` from `PATH`.
    pub fn new() -> Self {
        Self::with_executable("Rscript")
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// First line of `Rscript --version`, or `None` if it cannot be run.
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.executable).arg("--version").output().ok()?;
        // Older R versions print the banner on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        text.lines().next().map(|l| l.trim().to_string())
    }
}

impl Default for Rscript {
    fn default() -> Self {
        Self::new()
    }
}

impl RRuntime for Rscript {
    fn eval(&self, program: &RProgram) -> Result<String> {
        let dir = tempfile::Builder::new().prefix("brmstan_r_").tempdir()?;
        let script_path = dir.path().join("program.R");
        let output_path = dir.path().join("result.txt");
        fs::write(&script_path, program.render(&output_path))?;

        log::debug!(
            "running {} {}",
            self.executable.display(),
            script_path.display()
        );
        let output = Command::new(&self.executable)
            .arg(&script_path)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BrmsError::RuntimeNotFound {
                    path: self.executable.clone(),
                },
                _ => BrmsError::Io(e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(BrmsError::Foreign {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("R: {line}");
        }

        let mut result = fs::read_to_string(&output_path)?;
        if result.ends_with('\n') {
            result.pop();
        }
        Ok(result)
    }

    fn describe(&self) -> String {
        format!("Rscript ({})", self.executable.display())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory runtime for tests.

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Records every program and answers from a queue of canned results.
    #[derive(Default)]
    pub struct RecordingRuntime {
        pub programs: RefCell<Vec<RProgram>>,
        pub responses: RefCell<VecDeque<Result<String>>>,
    }

    impl RecordingRuntime {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, response: Result<String>) -> Self {
            self.responses.borrow_mut().push_back(response);
            self
        }

        pub fn respond_ok(self, text: &str) -> Self {
            self.respond(Ok(text.to_string()))
        }

        pub fn last_script(&self) -> String {
            self.programs
                .borrow()
                .last()
                .map(|p| p.statements().join("\n"))
                .unwrap_or_default()
        }

        pub fn calls(&self) -> usize {
            self.programs.borrow().len()
        }
    }

    impl RRuntime for RecordingRuntime {
        fn eval(&self, program: &RProgram) -> Result<String> {
            self.programs.borrow_mut().push(program.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}
