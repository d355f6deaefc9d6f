//! Source preparation: a `Vcs` front selecting one download driver.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use std::str::FromStr;

use universum_common::error::UniversumError;
use universum_gravity::arguments::{ArgumentError, ArgumentScope};
use universum_gravity::{Component, Declaration, InitContext, OptionSpec, Result};

use super::project_directory::ProjectDirectory;

const SOURCE_GROUP: &str = "Source files";

/// Repository type sources are downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsType {
    /// A local directory.
    None,
    /// A git repository.
    Git,
}

impl fmt::Display for VcsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Git => write!(f, "git"),
        }
    }
}

impl FromStr for VcsType {
    type Err = UniversumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "git" => Ok(Self::Git),
            other => Err(UniversumError::Config {
                message: format!("unsupported vcs type \"{other}\""),
            }),
        }
    }
}

/// Fetches sources into a project root.
pub trait DownloadDriver {
    /// Fills `root` with the project sources and describes what was fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources cannot be fetched.
    fn prepare_repository(&self, root: &Path) -> std::result::Result<String, UniversumError>;
}

/// Copies sources from a local directory.
#[derive(Debug)]
pub struct LocalDownloadVcs {
    source_dir: Option<PathBuf>,
}

impl Component for LocalDownloadVcs {
    const NAME: &'static str = "LocalDownloadVcs";

    fn declare(decl: &mut Declaration) {
        let _ = decl.takes_settings();
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        args.group(SOURCE_GROUP).add_argument(
            OptionSpec::new("--vcs-source-dir")
                .dest("source_dir")
                .env("SOURCE_DIR")
                .help("Directory to copy the sources from when --vcs-type is 'none'"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        Ok(Self {
            source_dir: ctx.settings()?.get_str("source_dir").map(PathBuf::from),
        })
    }
}

impl DownloadDriver for LocalDownloadVcs {
    fn prepare_repository(&self, root: &Path) -> std::result::Result<String, UniversumError> {
        let source = self.source_dir.as_ref().ok_or_else(|| UniversumError::Config {
            message: "--vcs-source-dir is required for vcs type 'none'".into(),
        })?;
        if !source.is_dir() {
            return Err(UniversumError::NotFound {
                kind: "source directory",
                id: source.display().to_string(),
            });
        }
        let copied = copy_tree(source, root)?;
        tracing::info!(source = %source.display(), files = copied, "copied local sources");
        Ok(format!(
            "Got sources from local directory {}: {copied} file(s)",
            source.display()
        ))
    }
}

fn copy_tree(from: &Path, to: &Path) -> std::result::Result<usize, UniversumError> {
    fs::create_dir_all(to).map_err(|e| UniversumError::io(to, e))?;
    let mut copied = 0;
    for entry in fs::read_dir(from).map_err(|e| UniversumError::io(from, e))? {
        let entry = entry.map_err(|e| UniversumError::io(from, e))?;
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copied += copy_tree(&path, &target)?;
        } else {
            let _ = fs::copy(&path, &target).map_err(|e| UniversumError::io(&path, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Clones sources from a git repository.
#[derive(Debug)]
pub struct GitDownloadVcs {
    repo: Option<String>,
    refspec: Option<String>,
}

impl Component for GitDownloadVcs {
    const NAME: &'static str = "GitDownloadVcs";

    fn declare(decl: &mut Declaration) {
        let _ = decl.takes_settings();
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        let mut group = args.group("Git");
        group.add_argument(
            OptionSpec::new("--git-repo")
                .dest("repo")
                .env("GIT_REPO")
                .help("See your project home page for exact repository address"),
        )?;
        group.add_argument(
            OptionSpec::new("--git-refspec")
                .dest("refspec")
                .env("GIT_REFSPEC")
                .help("Any additional refspec to be fetched and checked out"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        let settings = ctx.settings()?;
        Ok(Self {
            repo: settings.get_str("repo").map(str::to_owned),
            refspec: settings.get_str("refspec").map(str::to_owned),
        })
    }
}

impl GitDownloadVcs {
    fn git(binary: &Path, args: &[&str]) -> std::result::Result<String, UniversumError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(%command, "running");
        let output = Command::new(binary)
            .args(args)
            .output()
            .map_err(|e| UniversumError::io(binary, e))?;
        if !output.status.success() {
            return Err(UniversumError::Command {
                command,
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl DownloadDriver for GitDownloadVcs {
    fn prepare_repository(&self, root: &Path) -> std::result::Result<String, UniversumError> {
        let repo = self.repo.as_deref().ok_or_else(|| UniversumError::Config {
            message: "--git-repo is required for vcs type 'git'".into(),
        })?;
        let binary = which::which("git").map_err(|_| UniversumError::NotFound {
            kind: "binary",
            id: "git".into(),
        })?;
        let root_arg = root.to_string_lossy().into_owned();
        let root_arg = root_arg.as_str();

        let _ = Self::git(&binary, &["clone", repo, root_arg])?;
        if let Some(refspec) = &self.refspec {
            let _ = Self::git(&binary, &["-C", root_arg, "fetch", "origin", refspec.as_str()])?;
            let _ = Self::git(&binary, &["-C", root_arg, "checkout", "FETCH_HEAD"])?;
        }
        let head = Self::git(&binary, &["-C", root_arg, "log", "-1", "--oneline"])?;
        Ok(format!("Cloned {repo}\nHEAD: {head}"))
    }
}

/// Repository front end: selects and drives the configured driver.
pub struct Vcs {
    project: Rc<ProjectDirectory>,
    vcs_type: VcsType,
    driver: Rc<dyn DownloadDriver>,
}

impl fmt::Debug for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vcs")
            .field("project", &self.project)
            .field("vcs_type", &self.vcs_type)
            .finish_non_exhaustive()
    }
}

impl Vcs {
    /// Selected repository type.
    pub const fn vcs_type(&self) -> VcsType {
        self.vcs_type
    }

    /// Directory the sources are prepared in.
    pub fn project_root(&self) -> &Path {
        self.project.project_root()
    }

    /// Recreates the project root and fetches sources into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be reset or the driver fails.
    pub fn prepare_repository(&self) -> std::result::Result<String, UniversumError> {
        let root = self.project_root();
        self.clean_sources_silently();
        if self.vcs_type == VcsType::Git {
            // `git clone` wants to create the directory itself.
            fs::remove_dir(root).map_err(|e| UniversumError::io(root, e))?;
        }
        self.driver.prepare_repository(root)
    }

    fn clean_sources_silently(&self) {
        let root = self.project_root();
        if let Err(e) = fs::remove_dir_all(root) {
            tracing::debug!(root = %root.display(), error = %e, "nothing to clean");
        }
        if let Err(e) = fs::create_dir_all(root) {
            tracing::warn!(root = %root.display(), error = %e, "cannot create project root");
        }
    }
}

impl Component for Vcs {
    const NAME: &'static str = "Vcs";

    fn declare(decl: &mut Declaration) {
        let _ = decl
            .extends::<ProjectDirectory>()
            .takes_settings()
            .depends_on::<LocalDownloadVcs>("local_driver")
            .depends_on::<GitDownloadVcs>("git_driver");
    }

    fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        args.group(SOURCE_GROUP).add_argument(
            OptionSpec::new("--vcs-type")
                .dest("type")
                .env("VCS_TYPE")
                .choices(["none", "git"])
                .default_value("none")
                .help("Select repository type to download sources from: a local directory ('none') or Git ('git')"),
        )
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        let vcs_type = ctx
            .settings()?
            .get_parsed::<VcsType>("type")?
            .unwrap_or(VcsType::None);
        let driver: Rc<dyn DownloadDriver> = match vcs_type {
            VcsType::None => ctx.dependency::<LocalDownloadVcs>("local_driver")?.into_rc(),
            VcsType::Git => ctx.dependency::<GitDownloadVcs>("git_driver")?.into_rc(),
        };
        tracing::debug!(%vcs_type, "selected download driver");
        Ok(Self {
            project: ctx.parent()?,
            vcs_type,
            driver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules;
    use universum_gravity::{ModuleArgumentParser, Params, TypeRef, construct, define_arguments_recursive};

    fn settings_for(args: &[String]) -> universum_gravity::SettingsTree {
        let registry = modules::registry();
        let mut parser = ModuleArgumentParser::new("test");
        define_arguments_recursive(&registry, &TypeRef::of::<Vcs>(), &mut parser).expect("define");
        parser.parse(args).expect("parse")
    }

    #[test]
    fn vcs_type_parses_known_values() {
        assert_eq!("none".parse::<VcsType>().expect("none"), VcsType::None);
        assert_eq!("git".parse::<VcsType>().expect("git"), VcsType::Git);
        assert!("p4".parse::<VcsType>().is_err());
    }

    #[test]
    fn local_driver_copies_sources() {
        let source = tempfile::tempdir().expect("source dir");
        fs::create_dir_all(source.path().join("nested")).expect("mkdir");
        fs::write(source.path().join("a.txt"), "a").expect("write");
        fs::write(source.path().join("nested/b.txt"), "b").expect("write");
        let work = tempfile::tempdir().expect("work dir");
        let root = work.path().join("project");

        let settings = settings_for(&[
            format!("--project-root={}", root.display()),
            format!("--vcs-source-dir={}", source.path().display()),
        ]);
        let registry = modules::registry();
        let vcs = construct::<Vcs>(&registry, &settings, Params::new()).expect("construct");
        assert_eq!(vcs.vcs_type(), VcsType::None);

        let status = vcs.prepare_repository().expect("prepare");
        assert!(status.contains("2 file(s)"), "got: {status}");
        assert_eq!(fs::read_to_string(root.join("nested/b.txt")).expect("read"), "b");
        let built: Vec<_> = vcs.session().constructed().map(|(_, name)| name).collect();
        assert_eq!(built, ["LocalDownloadVcs", "Vcs"]);
    }

    #[test]
    fn stale_project_root_is_replaced() {
        let source = tempfile::tempdir().expect("source dir");
        fs::write(source.path().join("fresh.txt"), "new").expect("write");
        let work = tempfile::tempdir().expect("work dir");
        let root = work.path().join("project");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(root.join("stale.txt"), "old").expect("write");

        let settings = settings_for(&[
            format!("--project-root={}", root.display()),
            format!("--vcs-source-dir={}", source.path().display()),
        ]);
        let registry = modules::registry();
        let vcs = construct::<Vcs>(&registry, &settings, Params::new()).expect("construct");
        let _ = vcs.prepare_repository().expect("prepare");
        assert!(!root.join("stale.txt").exists());
        assert!(root.join("fresh.txt").exists());
    }

    #[test]
    fn missing_source_dir_is_config_error() {
        let work = tempfile::tempdir().expect("work dir");
        let settings = settings_for(&[format!("--project-root={}", work.path().join("p").display())]);
        let registry = modules::registry();
        let vcs = construct::<Vcs>(&registry, &settings, Params::new()).expect("construct");
        let err = vcs.prepare_repository().expect_err("no source dir");
        assert!(err.to_string().contains("--vcs-source-dir"), "got: {err}");
    }

    #[test]
    fn git_type_selects_git_driver_only() {
        let settings = settings_for(&["--vcs-type=git".to_owned(), "--git-repo=https://example.invalid/repo.git".to_owned()]);
        let registry = modules::registry();
        let vcs = construct::<Vcs>(&registry, &settings, Params::new()).expect("construct");
        assert_eq!(vcs.vcs_type(), VcsType::Git);
        let built: Vec<_> = vcs.session().constructed().map(|(_, name)| name).collect();
        assert_eq!(built, ["GitDownloadVcs", "Vcs"]);
    }
}
