//! Installing missing R packages.

use brmstan_bridge::r_string;

use crate::error::Result;
use crate::runtime::{RProgram, RRuntime};

/// Default CRAN mirror.
pub const DEFAULT_CRAN_MIRROR: &str = "https://cloud.r-project.org";

/// Makes R packages available on request.
pub trait PackageInstaller {
    /// Install `packages` into the runtime's library.
    fn install(&self, runtime: &dyn RRuntime, packages: &[String]) -> Result<()>;
}

/// Installs from a CRAN mirror with `utils::install.packages`.
#[derive(Debug, Clone)]
pub struct CranInstaller {
    mirror: String,
}

impl CranInstaller {
    pub fn new(mirror: impl Into<String>) -> Self {
        Self {
            mirror: mirror.into(),
        }
    }

    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    fn program(&self, packages: &[String]) -> RProgram {
        let names: Vec<String> = packages.iter().map(|p| r_string(p)).collect();
        RProgram::new()
            .stmt(format!(
                "utils::install.packages(c({}), repos = {})",
                names.join(", "),
                r_string(&self.mirror)
            ))
            .result("\"ok\"")
    }
}

impl Default for CranInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_CRAN_MIRROR)
    }
}

impl PackageInstaller for CranInstaller {
    fn install(&self, runtime: &dyn RRuntime, packages: &[String]) -> Result<()> {
        log::info!(
            "installing R package(s) {} from {}",
            packages.join(", "),
            self.mirror
        );
        runtime.eval(&self.program(packages))?;
        Ok(())
    }
}

/// Never installs anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstall;

impl PackageInstaller for NoInstall {
    fn install(&self, _runtime: &dyn RRuntime, packages: &[String]) -> Result<()> {
        log::warn!(
            "not installing missing R package(s): {}",
            packages.join(", ")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::RecordingRuntime;

    #[test]
    fn cran_installer_targets_mirror() {
        let runtime = RecordingRuntime::new();
        CranInstaller::new("https://cran.example.org")
            .install(&runtime, &["brms".to_string(), "jsonlite".to_string()])
            .unwrap();
        assert_eq!(
            runtime.last_script(),
            "utils::install.packages(c(\"brms\", \"jsonlite\"), repos = \"https://cran.example.org\")\nresult <- \"ok\""
        );
    }

    #[test]
    fn no_install_does_not_touch_runtime() {
        let runtime = RecordingRuntime::new();
        NoInstall.install(&runtime, &["brms".to_string()]).unwrap();
        assert_eq!(runtime.calls(), 0);
    }
}
