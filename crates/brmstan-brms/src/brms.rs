//! The initialised brms handle.

use brmstan_bridge::{r_string, ForeignData};
use brmstan_core::ModelSpec;

use crate::call::RCall;
use crate::error::{BrmsError, Result};
use crate::install::PackageInstaller;
use crate::prior::CombinedPrior;
use crate::runtime::{RProgram, RRuntime};

/// R packages the adapter relies on.
pub const REQUIRED_PACKAGES: [&str; 2] = ["brms", "jsonlite"];

/// Access to brms through an R runtime whose dependencies have been checked.
///
/// Obtain one with [`Brms::initialize`]; nothing is probed or installed
/// before that call.
pub struct Brms {
    runtime: Box<dyn RRuntime>,
}

impl Brms {
    /// Check that the required R packages load, installing missing ones with
    /// `installer` and checking again.
    pub fn initialize(
        runtime: Box<dyn RRuntime>,
        installer: &dyn PackageInstaller,
    ) -> Result<Self> {
        let missing = missing_packages(runtime.as_ref())?;
        if !missing.is_empty() {
            log::info!("missing R package(s): {}", missing.join(", "));
            installer.install(runtime.as_ref(), &missing)?;
            let still_missing = missing_packages(runtime.as_ref())?;
            if !still_missing.is_empty() {
                return Err(BrmsError::DependencyUnavailable {
                    packages: still_missing,
                });
            }
        }
        log::debug!("brms available via {}", runtime.describe());
        Ok(Self { runtime })
    }

    pub fn runtime(&self) -> &dyn RRuntime {
        self.runtime.as_ref()
    }

    /// Installed brms version, e.g. `2.21.0`.
    pub fn version(&self) -> Result<String> {
        let program = RProgram::new().result("as.character(utils::packageVersion(\"brms\"))");
        Ok(self.runtime.eval(&program)?.trim().to_string())
    }

    /// The `brms::make_stancode` call for `spec`.
    ///
    /// The `prior` argument is present only when a combined prior exists.
    pub fn stancode_call(spec: &ModelSpec, prior: Option<&CombinedPrior>) -> RCall {
        RCall::new("brms::make_stancode")
            .arg("formula", formula_expr(spec))
            .arg("data", "data")
            .arg_opt("prior", prior.map(|_| "prior"))
            .arg("family", r_string(spec.family.as_str()))
            .arg("sample_prior", r_string(spec.sample_prior.as_str()))
    }

    /// The `brms::make_standata` call for `spec`.
    pub fn standata_call(spec: &ModelSpec) -> RCall {
        RCall::new("brms::make_standata")
            .arg("formula", formula_expr(spec))
            .arg("data", "data")
            .arg("family", r_string(spec.family.as_str()))
    }

    /// Generate the Stan program text.
    pub fn compile(
        &self,
        spec: &ModelSpec,
        data: &ForeignData,
        prior: Option<&CombinedPrior>,
    ) -> Result<String> {
        let mut program = RProgram::new().assign("data", data.expr());
        if let Some(prior) = prior {
            program = program
                .assign("prior", prior.expr())
                .stmt("stopifnot(brms::is.brmsprior(prior))");
        }
        let program = program
            .assign("code", Self::stancode_call(spec, prior).to_string())
            .result("code");

        log::debug!("generating Stan code for '{}'", spec.formula);
        self.runtime.eval(&program)
    }

    /// Run brms data preparation and return the result as JSON text.
    ///
    /// The JSON is the named list written by `jsonlite` with row-major
    /// matrices and full precision; see `brmstan_bridge::from_foreign`.
    pub fn preprocess(&self, spec: &ModelSpec, data: &ForeignData) -> Result<String> {
        let program = RProgram::new()
            .assign("data", data.expr())
            .assign("sdata", Self::standata_call(spec).to_string())
            .result("jsonlite::toJSON(unclass(sdata), digits = NA, matrix = \"rowmajor\")");

        log::debug!("preparing Stan data for '{}'", spec.formula);
        self.runtime.eval(&program)
    }

    /// Fetch a dataset shipped with brms as JSON row records.
    pub fn fetch_dataset(&self, name: &str) -> Result<String> {
        let program = RProgram::new()
            .assign("env", "new.env()")
            .stmt(format!(
                "utils::data(list = {}, package = \"brms\", envir = env)",
                r_string(name)
            ))
            .assign("df", format!("as.data.frame(env[[{}]])", r_string(name)))
            .result(
                "jsonlite::toJSON(df, dataframe = \"rows\", digits = NA, factor = \"string\", na = \"null\")",
            );

        log::debug!("fetching brms dataset '{name}'");
        self.runtime.eval(&program)
    }
}

fn formula_expr(spec: &ModelSpec) -> String {
    RCall::new("brms::bf")
        .positional(r_string(&spec.formula))
        .to_string()
}

fn missing_packages(runtime: &dyn RRuntime) -> Result<Vec<String>> {
    let checks: Vec<String> = REQUIRED_PACKAGES
        .iter()
        .map(|p| format!("requireNamespace({}, quietly = TRUE)", r_string(p)))
        .collect();
    let program = RProgram::new()
        .assign("available", format!("c({})", checks.join(", ")))
        .result("paste(ifelse(available, \"TRUE\", \"FALSE\"), collapse = \",\")");
    let answer = runtime.eval(&program)?;
    let flags: Vec<&str> = answer.trim().split(',').map(str::trim).collect();
    if flags.len() != REQUIRED_PACKAGES.len() {
        return Err(BrmsError::Foreign {
            status: "unexpected package probe output".to_string(),
            stderr: format!(
                "expected {} flags for {}, got '{}'",
                REQUIRED_PACKAGES.len(),
                REQUIRED_PACKAGES.join(", "),
                answer.trim()
            ),
        });
    }

    Ok(REQUIRED_PACKAGES
        .iter()
        .zip(flags)
        .filter(|(_, ok)| *ok != "TRUE")
        .map(|(p, _)| p.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use brmstan_bridge::to_foreign;
    use brmstan_core::{Column, Family, SamplePrior, TabularInput, Table};

    use super::*;
    use crate::install::NoInstall;
    use crate::prior::PriorSpec;
    use crate::runtime::testing::RecordingRuntime;

    fn ready_runtime() -> Rc<RecordingRuntime> {
        Rc::new(RecordingRuntime::new().respond_ok("TRUE,TRUE"))
    }

    fn epilepsy_data() -> ForeignData {
        let table = Table::new()
            .with_column("count", Column::Int(vec![5, 3]))
            .unwrap()
            .with_column("zAge", Column::Real(vec![0.5, -0.5]))
            .unwrap();
        to_foreign(&TabularInput::Table(table))
    }

    struct CountingInstaller(std::cell::Cell<usize>);

    impl PackageInstaller for CountingInstaller {
        fn install(&self, _runtime: &dyn RRuntime, packages: &[String]) -> Result<()> {
            assert_eq!(packages, &["brms".to_string()]);
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn initialize_probes_once_when_present() {
        let runtime = ready_runtime();
        Brms::initialize(Box::new(runtime.clone()), &NoInstall).unwrap();
        assert_eq!(runtime.calls(), 1);
    }

    #[test]
    fn initialize_installs_missing_then_rechecks() {
        let runtime = Rc::new(
            RecordingRuntime::new()
                .respond_ok("FALSE,TRUE")
                .respond_ok("TRUE,TRUE"),
        );
        let installer = CountingInstaller(std::cell::Cell::new(0));
        Brms::initialize(Box::new(runtime.clone()), &installer).unwrap();
        assert_eq!(installer.0.get(), 1);
        assert_eq!(runtime.calls(), 2);
    }

    #[test]
    fn initialize_reports_unavailable_dependency() {
        let runtime = Rc::new(
            RecordingRuntime::new()
                .respond_ok("FALSE,TRUE")
                .respond_ok("FALSE,TRUE"),
        );
        let err = Brms::initialize(Box::new(runtime), &NoInstall)
            .err()
            .unwrap();
        match err {
            BrmsError::DependencyUnavailable { packages } => assert_eq!(packages, vec!["brms"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_prior_is_omitted() {
        let spec = ModelSpec::new("count ~ zAge");
        let call = Brms::stancode_call(&spec, None);
        assert!(!call.has_arg("prior"));

        let runtime = ready_runtime();
        let brms = Brms::initialize(Box::new(runtime.clone()), &NoInstall).unwrap();
        brms.compile(&spec, &epilepsy_data(), None).unwrap();
        let script = runtime.last_script();
        assert!(!script.contains("prior <-"));
        assert!(!script.contains(", prior = "));
        assert!(script.contains("sample_prior = \"no\""));
    }

    #[test]
    fn non_empty_prior_is_passed() {
        let spec = ModelSpec::new("count ~ zAge")
            .with_family(Family::new("poisson").unwrap())
            .with_sample_prior(SamplePrior::Yes);
        let combined = PriorSpec::combine(&[
            PriorSpec::new("normal(0, 1)", "b"),
            PriorSpec::new("normal(0, 10)", "Intercept"),
        ])
        .unwrap();

        let call = Brms::stancode_call(&spec, combined.as_ref());
        assert_eq!(call.get_arg("prior"), Some("prior"));
        assert_eq!(call.get_arg("family"), Some("\"poisson\""));
        assert_eq!(call.get_arg("sample_prior"), Some("\"yes\""));

        let runtime = ready_runtime();
        let brms = Brms::initialize(Box::new(runtime.clone()), &NoInstall).unwrap();
        brms.compile(&spec, &epilepsy_data(), combined.as_ref()).unwrap();
        let program = runtime.programs.borrow().last().cloned().unwrap();
        assert_eq!(
            program.statements()[1],
            "prior <- brms::prior_string(\"normal(0, 1)\", \"b\") + brms::prior_string(\"normal(0, 10)\", \"Intercept\")"
        );
        assert_eq!(
            program.statements()[2],
            "stopifnot(brms::is.brmsprior(prior))"
        );
    }

    #[test]
    fn formula_is_quoted() {
        let call = Brms::standata_call(&ModelSpec::new("y ~ x + (1 | g)"));
        assert_eq!(
            call.to_string(),
            "brms::make_standata(formula = brms::bf(\"y ~ x + (1 | g)\"), data = data, family = \"gaussian\")"
        );
    }

    #[test]
    fn short_package_probe_is_an_error() {
        let runtime = Rc::new(RecordingRuntime::new().respond_ok("TRUE"));
        let err = Brms::initialize(Box::new(runtime.clone()), &NoInstall)
            .err()
            .unwrap();
        assert!(matches!(err, BrmsError::Foreign { .. }));
        assert!(err.to_string().contains("brms, jsonlite"));
        assert_eq!(runtime.calls(), 1);
    }

    #[test]
    fn foreign_errors_propagate_verbatim() {
        let runtime = Rc::new(
            RecordingRuntime::new()
                .respond_ok("TRUE,TRUE")
                .respond(Err(BrmsError::Foreign {
                    status: "exit status: 1".into(),
                    stderr: "Error: The following variables are missing in 'data': 'zBase'".into(),
                })),
        );
        let brms = Brms::initialize(Box::new(runtime), &NoInstall).unwrap();
        let err = brms
            .compile(&ModelSpec::new("count ~ zBase"), &epilepsy_data(), None)
            .unwrap_err();
        assert!(err.to_string().contains("missing in 'data': 'zBase'"));
    }
}
