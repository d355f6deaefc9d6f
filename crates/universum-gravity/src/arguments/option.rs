//! Declarative description of one command-line option.

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction};

/// Whether an option takes a value or acts as a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `--name VALUE` or `--name=VALUE`.
    Value,
    /// `--name`, stored as `true` when present.
    Flag,
}

/// An option a component declares for its own namespace.
///
/// The destination defaults to the long flag with dashes turned into
/// underscores, so `--base-option` lands in `base_option`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub(crate) long: String,
    pub(crate) short: Option<char>,
    pub(crate) dest: String,
    pub(crate) help: Option<String>,
    pub(crate) default: Option<String>,
    pub(crate) choices: Vec<String>,
    pub(crate) env: Option<String>,
    pub(crate) kind: OptionKind,
    pub(crate) required: bool,
}

impl OptionSpec {
    /// Creates a value-taking option from its long flag (`--name` or `name`).
    #[must_use]
    pub fn new(flag: &str) -> Self {
        let long = flag.trim_start_matches('-').to_owned();
        let dest = long.replace('-', "_");
        Self {
            long,
            short: None,
            dest,
            help: None,
            default: None,
            choices: Vec::new(),
            env: None,
            kind: OptionKind::Value,
            required: false,
        }
    }

    /// Overrides the destination name inside the namespace.
    #[must_use]
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = dest.into();
        self
    }

    /// Adds a one-letter short flag.
    #[must_use]
    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the value used when the option is not given.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts accepted values.
    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the value from an environment variable when the flag is absent.
    #[must_use]
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// Turns the option into a switch.
    #[must_use]
    pub const fn flag(mut self) -> Self {
        self.kind = OptionKind::Flag;
        self
    }

    /// Makes the option mandatory.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Long flag without leading dashes.
    pub fn long(&self) -> &str {
        &self.long
    }

    /// Destination inside the namespace.
    pub fn destination(&self) -> &str {
        &self.dest
    }

    /// Kind of the option.
    pub const fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Help text, if any.
    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub(crate) fn to_arg(&self, id: String, heading: Option<&str>) -> Arg {
        let mut arg = Arg::new(id).long(self.long.clone());
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        if let Some(heading) = heading {
            arg = arg.help_heading(heading.to_owned());
        }
        if let Some(var) = &self.env {
            arg = arg.env(var.clone());
        }
        match self.kind {
            OptionKind::Flag => arg.action(ArgAction::SetTrue),
            OptionKind::Value => {
                arg = arg
                    .action(ArgAction::Set)
                    .value_name(self.dest.to_uppercase())
                    .required(self.required);
                if let Some(default) = &self.default {
                    arg = arg.default_value(default.clone());
                }
                if !self.choices.is_empty() {
                    arg = arg.value_parser(PossibleValuesParser::new(self.choices.clone()));
                }
                arg
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dest_is_derived_from_long_flag() {
        let spec = OptionSpec::new("--vcs-source-dir");
        assert_eq!(spec.long(), "vcs-source-dir");
        assert_eq!(spec.destination(), "vcs_source_dir");
    }

    #[test]
    fn explicit_dest_overrides() {
        let spec = OptionSpec::new("--vcs-type").dest("type");
        assert_eq!(spec.destination(), "type");
        assert_eq!(spec.long(), "vcs-type");
    }

    #[test]
    fn flag_kind() {
        assert_eq!(OptionSpec::new("--report").flag().kind(), OptionKind::Flag);
        assert_eq!(OptionSpec::new("--report").kind(), OptionKind::Value);
    }
}
