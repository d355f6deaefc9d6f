//! Location of the checked-out project.

use std::path::{Path, PathBuf};

use universum_common::constants::DEFAULT_PROJECT_ROOT;
use universum_gravity::arguments::{ArgumentError, ArgumentScope};
use universum_gravity::{Component, Declaration, InitContext, OptionSpec, Result};

/// Parent type for components working inside the project root.
#[derive(Debug, Clone)]
pub struct ProjectDirectory {
    project_root: PathBuf,
}

impl ProjectDirectory {
    /// Directory sources are prepared in.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl Component for ProjectDirectory {
    const NAME: &'static str = "ProjectDirectory";

    fn declare(decl: &mut Declaration) {
        let _ = decl.takes_settings();
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        args.group("Configuration execution").add_argument(
            OptionSpec::new("--project-root")
                .short('r')
                .env("PROJECT_ROOT")
                .default_value(DEFAULT_PROJECT_ROOT)
                .help("Temporary directory to copy or clone the project sources to"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        let settings = ctx.settings()?;
        let project_root = settings
            .get_str("project_root")
            .unwrap_or(DEFAULT_PROJECT_ROOT);
        Ok(Self {
            project_root: PathBuf::from(project_root),
        })
    }
}
