//! Namespaced command-line option registration.
//!
//! Each component type registers its options through an [`ArgumentScope`]
//! bound to its own namespace. Options are assembled into a `clap`
//! command only at parse time; every clap argument id is prefixed with
//! the namespace, so identical destination names declared by unrelated
//! components never collide.

pub mod option;

use std::collections::HashMap;
use std::ffi::OsString;

use clap::Command;
use thiserror::Error;
use universum_common::constants::NAMESPACE_SEPARATOR;

pub use option::{OptionKind, OptionSpec};

use crate::settings::{SettingValue, SettingsTree};

/// Errors raised while registering or parsing options.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// Two options claim the same command-line flag.
    #[error("option {flag} of {namespace} conflicts with the same flag declared by {existing}")]
    Conflict {
        /// Conflicting flag, with dashes.
        flag: String,
        /// Namespace registering the second option.
        namespace: String,
        /// Namespace that registered the flag first.
        existing: String,
    },

    /// A namespace declares the same destination twice.
    #[error("{namespace} declares destination \"{dest}\" more than once")]
    DuplicateDestination {
        /// Namespace declaring it.
        namespace: String,
        /// Repeated destination.
        dest: String,
    },

    /// A flag is empty or reserved by the parser.
    #[error("{namespace} declares invalid flag \"{flag}\"")]
    InvalidFlag {
        /// Namespace declaring it.
        namespace: String,
        /// Offending flag.
        flag: String,
    },

    /// A parsed value does not convert to the requested type.
    #[error("invalid value \"{value}\" for {dest}: {message}")]
    InvalidValue {
        /// Destination being read.
        dest: String,
        /// Raw value.
        value: String,
        /// Conversion failure.
        message: String,
    },

    /// Command-line parsing failed (this also carries `--help` output).
    #[error(transparent)]
    Parse(#[from] clap::Error),
}

#[derive(Debug, Clone)]
struct RegisteredOption {
    namespace: String,
    group: Option<String>,
    spec: OptionSpec,
}

impl RegisteredOption {
    fn id(&self) -> String {
        format!("{}{NAMESPACE_SEPARATOR}{}", self.namespace, self.spec.dest)
    }
}

/// Collects namespaced options and parses them into a [`SettingsTree`].
#[derive(Debug, Clone)]
pub struct ModuleArgumentParser {
    name: String,
    about: Option<String>,
    namespaces: Vec<String>,
    options: Vec<RegisteredOption>,
    longs: HashMap<String, String>,
    shorts: HashMap<char, String>,
}

impl ModuleArgumentParser {
    /// Creates a parser for the given program name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            namespaces: Vec::new(),
            options: Vec::new(),
            longs: HashMap::new(),
            shorts: HashMap::new(),
        }
    }

    /// Sets the description shown in `--help`.
    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Returns a registration scope for `namespace`, creating the namespace.
    pub fn scope(&mut self, namespace: &str) -> ArgumentScope<'_> {
        if !self.has_namespace(namespace) {
            self.namespaces.push(namespace.to_owned());
        }
        ArgumentScope {
            parser: self,
            namespace: namespace.to_owned(),
            group: None,
        }
    }

    /// Returns `true` if `namespace` was created.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|n| n == namespace)
    }

    /// Namespaces in creation order.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Options registered for `namespace`, in registration order.
    pub fn options_of<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a OptionSpec> {
        self.options
            .iter()
            .filter(move |o| o.namespace == namespace)
            .map(|o| &o.spec)
    }

    /// Builds the `clap` command holding every registered option.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone());
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for option in &self.options {
            let heading = option.group.as_deref().unwrap_or(option.namespace.as_str());
            command = command.arg(option.spec.to_arg(option.id(), Some(heading)));
        }
        command
    }

    /// Parses `args` (without the program name) into a settings tree.
    ///
    /// Every created namespace is present in the result, even when it
    /// declares no option.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Parse`] when clap rejects the arguments,
    /// including requests for `--help`.
    pub fn parse<I, T>(&self, args: I) -> Result<SettingsTree, ArgumentError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv = std::iter::once(OsString::from(&self.name)).chain(args.into_iter().map(Into::into));
        let matches = self.command().try_get_matches_from(argv)?;
        let mut tree = SettingsTree::new();
        for namespace in &self.namespaces {
            let _ = tree.namespace_mut(namespace);
        }
        for option in &self.options {
            let id = option.id();
            let value = match option.spec.kind {
                OptionKind::Flag => SettingValue::Flag(matches.get_flag(&id)),
                OptionKind::Value => matches.get_one::<String>(&id).cloned().into(),
            };
            tree.namespace_mut(&option.namespace)
                .set(option.spec.dest.clone(), value);
        }
        tracing::debug!(namespaces = tree.len(), "parsed component settings");
        Ok(tree)
    }

    fn register(
        &mut self,
        namespace: &str,
        group: Option<&str>,
        spec: OptionSpec,
    ) -> Result<(), ArgumentError> {
        if spec.long.is_empty() || spec.long == "help" || spec.short == Some('h') {
            return Err(ArgumentError::InvalidFlag {
                namespace: namespace.to_owned(),
                flag: spec.long,
            });
        }
        if self.options_of(namespace).any(|o| o.dest == spec.dest) {
            return Err(ArgumentError::DuplicateDestination {
                namespace: namespace.to_owned(),
                dest: spec.dest,
            });
        }
        if let Some(existing) = self.longs.get(&spec.long) {
            return Err(ArgumentError::Conflict {
                flag: format!("--{}", spec.long),
                namespace: namespace.to_owned(),
                existing: existing.clone(),
            });
        }
        if let Some(short) = spec.short {
            if let Some(existing) = self.shorts.get(&short) {
                return Err(ArgumentError::Conflict {
                    flag: format!("-{short}"),
                    namespace: namespace.to_owned(),
                    existing: existing.clone(),
                });
            }
            let _ = self.shorts.insert(short, namespace.to_owned());
        }
        let _ = self.longs.insert(spec.long.clone(), namespace.to_owned());
        tracing::trace!(namespace, flag = %spec.long, dest = %spec.dest, "registered option");
        self.options.push(RegisteredOption {
            namespace: namespace.to_owned(),
            group: group.map(str::to_owned),
            spec,
        });
        Ok(())
    }
}

/// Option registration bound to one namespace and, optionally, a help group.
#[derive(Debug)]
pub struct ArgumentScope<'p> {
    parser: &'p mut ModuleArgumentParser,
    namespace: String,
    group: Option<String>,
}

impl ArgumentScope<'_> {
    /// Namespace options are registered into.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a scope registering into the same namespace under a help group.
    ///
    /// Groups only affect `--help` layout; several components may share one.
    pub fn group(&mut self, title: &str) -> ArgumentScope<'_> {
        ArgumentScope {
            parser: &mut *self.parser,
            namespace: self.namespace.clone(),
            group: Some(title.to_owned()),
        }
    }

    /// Registers an option.
    ///
    /// # Errors
    ///
    /// Returns an error when the flag is already taken by any namespace,
    /// or the destination is already used in this namespace.
    pub fn add_argument(&mut self, spec: OptionSpec) -> Result<(), ArgumentError> {
        self.parser
            .register(&self.namespace, self.group.as_deref(), spec)
    }
}
