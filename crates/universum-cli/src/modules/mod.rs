//! Components shipped with the CLI.

pub mod error_state;
pub mod main_module;
pub mod output;
pub mod project_directory;
pub mod vcs;

use universum_gravity::Registry;

/// Registry holding every shipped component.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    let _ = registry.register::<error_state::GlobalErrorState>();
    let _ = registry.register::<error_state::HasErrorState>();
    let _ = registry.register::<project_directory::ProjectDirectory>();
    let _ = registry.register::<vcs::LocalDownloadVcs>();
    let _ = registry.register::<vcs::GitDownloadVcs>();
    let _ = registry.register::<vcs::Vcs>();
    let _ = registry.register::<output::Output>();
    let _ = registry.register::<main_module::Main>();
    registry
}
