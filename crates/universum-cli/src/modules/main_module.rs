//! Entry component of a CI run.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use universum_common::constants::{APP_NAME, REPOSITORY_STATE_FILE};
use universum_common::error::UniversumError;
use universum_common::types::StepStatus;
use universum_gravity::arguments::{ArgumentError, ArgumentScope};
use universum_gravity::{Component, Declaration, InitContext, Instance, OptionSpec, Result};

use super::error_state::HasErrorState;
use super::output::Output;
use super::vcs::Vcs;
use crate::output::format_duration;

const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

/// Prepares the repository and reports the outcome.
#[derive(Debug)]
pub struct Main {
    errors: Rc<HasErrorState>,
    vcs: Instance<Vcs>,
    output: Instance<Output>,
    artifact_dir: PathBuf,
}

impl Component for Main {
    const NAME: &'static str = "Main";

    fn declare(decl: &mut Declaration) {
        let _ = decl
            .extends::<HasErrorState>()
            .takes_settings()
            .depends_on::<Vcs>("vcs")
            .depends_on::<Output>("output");
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        args.group("Configuration execution").add_argument(
            OptionSpec::new("--artifact-dir")
                .env("ARTIFACT_DIR")
                .default_value(DEFAULT_ARTIFACT_DIR)
                .help("Directory to collect run artifacts in"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        let artifact_dir = ctx
            .settings()?
            .get_str("artifact_dir")
            .unwrap_or(DEFAULT_ARTIFACT_DIR);
        let output: Instance<Output> = ctx.dependency("output")?;
        tracing::debug!(format = %output.format(), "report output selected");
        Ok(Self {
            errors: ctx.parent()?,
            vcs: ctx.dependency("vcs")?,
            output,
            artifact_dir: PathBuf::from(artifact_dir),
        })
    }
}

impl Main {
    /// Runs the CI steps; returns `true` when no component reported an error.
    pub fn run(&self) -> bool {
        let started = Instant::now();
        let version = env!("CARGO_PKG_VERSION");
        self.output.log_execution_start(APP_NAME, version);

        self.output.open_block("Preparing repository");
        let status = match self.prepare_repository() {
            Ok(()) => StepStatus::Success,
            Err(e) => {
                self.output.log_error(&e.to_string());
                self.errors.error(&format!("Failed to prepare repository: {e}"));
                StepStatus::Failed
            }
        };
        self.output.close_block(status);

        self.output.open_block("Reporting errors");
        let errors = self.errors();
        if errors.is_empty() {
            self.output.report_step("No errors reported", StepStatus::Success);
        }
        for error in &errors {
            self.output.report_step(error, StepStatus::Failed);
        }
        self.output.close_block(if errors.is_empty() {
            StepStatus::Success
        } else {
            StepStatus::Failed
        });

        self.output
            .log_execution_finish(APP_NAME, version, &format_duration(started.elapsed()));
        !self.errors.is_in_error_state()
    }

    /// Errors reported during the run, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.errors.global().errors()
    }

    fn prepare_repository(&self) -> std::result::Result<(), UniversumError> {
        let status = self.vcs.prepare_repository()?;
        self.output.log(&status);

        fs::create_dir_all(&self.artifact_dir)
            .map_err(|e| UniversumError::io(&self.artifact_dir, e))?;
        let state_path = self.artifact_dir.join(REPOSITORY_STATE_FILE);
        let mut report = status;
        report.push_str("\n\nFile list:\n\n");
        for file in list_files(self.vcs.project_root())? {
            report.push_str(&file);
            report.push('\n');
        }
        fs::write(&state_path, report).map_err(|e| UniversumError::io(&state_path, e))?;
        self.output.report_step(
            &format!("Repository state saved to {}", state_path.display()),
            StepStatus::Success,
        );
        Ok(())
    }
}

/// Relative paths of every file below `root`, sorted.
fn list_files(root: &Path) -> std::result::Result<Vec<String>, UniversumError> {
    fn walk(root: &Path, dir: &Path, files: &mut Vec<String>) -> std::result::Result<(), UniversumError> {
        for entry in fs::read_dir(dir).map_err(|e| UniversumError::io(dir, e))? {
            let path = entry.map_err(|e| UniversumError::io(dir, e))?.path();
            if path.is_dir() {
                walk(root, &path, files)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.display().to_string());
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules;
    use universum_gravity::{ModuleArgumentParser, Params, TypeRef, construct, define_arguments_recursive};

    fn settings_for(args: &[String]) -> universum_gravity::SettingsTree {
        let registry = modules::registry();
        let mut parser = ModuleArgumentParser::new("test");
        define_arguments_recursive(&registry, &TypeRef::of::<Main>(), &mut parser).expect("define");
        parser.parse(args).expect("parse")
    }

    #[test]
    fn run_with_local_sources_succeeds() {
        let source = tempfile::tempdir().expect("source dir");
        fs::write(source.path().join("README"), "hello").expect("write");
        let work = tempfile::tempdir().expect("work dir");
        let root = work.path().join("project");
        let artifacts = work.path().join("artifacts");

        let settings = settings_for(&[
            format!("--project-root={}", root.display()),
            format!("--vcs-source-dir={}", source.path().display()),
            format!("--artifact-dir={}", artifacts.display()),
            "--out-type=json".to_owned(),
        ]);
        let registry = modules::registry();
        let main = construct::<Main>(&registry, &settings, Params::new()).expect("construct");
        assert!(main.run());

        let state = fs::read_to_string(artifacts.join(REPOSITORY_STATE_FILE)).expect("state file");
        assert!(state.contains("File list:"), "got: {state}");
        assert!(state.contains("README"), "got: {state}");
    }

    #[test]
    fn missing_source_reports_error() {
        let work = tempfile::tempdir().expect("work dir");
        let settings = settings_for(&[
            format!("--project-root={}", work.path().join("project").display()),
            format!("--vcs-source-dir={}", work.path().join("absent").display()),
            format!("--artifact-dir={}", work.path().join("artifacts").display()),
            "--out-type=json".to_owned(),
        ]);
        let registry = modules::registry();
        let main = construct::<Main>(&registry, &settings, Params::new()).expect("construct");
        assert!(!main.run());

        let errors = main.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to prepare repository"), "got: {errors:?}");
    }

    #[test]
    fn list_files_is_sorted_and_relative() {
        let dir = tempfile::tempdir().expect("dir");
        fs::create_dir_all(dir.path().join("b")).expect("mkdir");
        fs::write(dir.path().join("b/inner.txt"), "").expect("write");
        fs::write(dir.path().join("a.txt"), "").expect("write");
        let files = list_files(dir.path()).expect("list");
        assert_eq!(files, ["a.txt", format!("b{}inner.txt", std::path::MAIN_SEPARATOR).as_str()]);
    }
}
