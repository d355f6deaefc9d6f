//! Errors raised by the component container.

use thiserror::Error;
use universum_common::error::UniversumError;

use crate::arguments::ArgumentError;

/// Broad class of a [`GravityError`], mirroring how callers react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A type could not be found, was ambiguous, or the graph has a cycle.
    Lookup,
    /// An initializer's parameters or settings did not match what was supplied.
    Construction,
    /// Option registration or command-line parsing failed.
    Arguments,
    /// A component's own initializer failed.
    Component,
}

/// Error type of the container.
///
/// All of these are fatal to the request that triggered them: a broken
/// component graph is a programming or configuration defect.
#[derive(Debug, Error)]
pub enum GravityError {
    /// No live component type carries the requested name.
    #[error("component type not found: {name}")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// More than one live component type carries the requested name.
    #[error("ambiguous component type name \"{name}\": {count} live definitions")]
    Ambiguous {
        /// Requested name.
        name: String,
        /// Number of live definitions sharing it.
        count: usize,
    },

    /// The dependency graph contains a cycle.
    #[error("circular dependency detected: {cycle}")]
    CircularDependency {
        /// Minimal cycle, e.g. `B->C->D->B`.
        cycle: String,
    },

    /// A component asked for a dependency field it never declared.
    #[error("{component} has no dependency field \"{field}\"")]
    UnknownDependency {
        /// Requesting component.
        component: String,
        /// Requested field.
        field: String,
    },

    /// A dependency was requested as a Rust type its target does not provide.
    #[error("{component}.{field} resolves to {target}, which does not provide {requested}")]
    DependencyType {
        /// Requesting component.
        component: String,
        /// Requested field.
        field: String,
        /// Component type the field resolves to.
        target: String,
        /// Requested component name.
        requested: &'static str,
    },

    /// A component asked for a parent facet that is not one of its built ancestors.
    #[error("{component} has no initialized parent {requested}")]
    NotAParent {
        /// Requesting component.
        component: String,
        /// Requested parent.
        requested: &'static str,
    },

    /// An initializer parameter was required but not supplied.
    #[error("{component}: missing required parameter \"{parameter}\"")]
    MissingParameter {
        /// Component whose initializer declares the parameter.
        component: String,
        /// Parameter name.
        parameter: String,
    },

    /// A parameter was supplied that no initializer accepts.
    #[error("{component}: unexpected parameter \"{parameter}\"")]
    UnexpectedParameter {
        /// Component being constructed.
        component: String,
        /// Parameter name, or `#<index>` for extra positional values.
        parameter: String,
    },

    /// The same parameter was supplied more than once.
    #[error("{component}: parameter \"{parameter}\" supplied more than once")]
    DuplicateParameter {
        /// Component being constructed.
        component: String,
        /// Parameter name.
        parameter: String,
    },

    /// A parameter value could not be converted to the requested type.
    #[error("{component}: invalid value for parameter \"{parameter}\": {source}")]
    InvalidParameter {
        /// Component reading the parameter.
        component: String,
        /// Parameter name.
        parameter: String,
        /// Conversion failure.
        source: serde_json::Error,
    },

    /// The initializer takes settings but the settings tree has no namespace for it.
    #[error("{component}: initializer takes settings but no \"{component}\" namespace was parsed")]
    MissingSettings {
        /// Component being constructed.
        component: String,
    },

    /// The initializer read settings without declaring that it takes them.
    #[error("{component}: initializer does not take settings")]
    SettingsNotAccepted {
        /// Component being constructed.
        component: String,
    },

    /// The parent hierarchy has no consistent linear order.
    #[error("{component}: cannot linearize parents ({detail})")]
    Linearization {
        /// Component whose hierarchy is inconsistent.
        component: String,
        /// Remaining conflicting heads.
        detail: String,
    },

    /// Option registration or parsing failed.
    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    /// A component's initializer failed.
    #[error("{component}: {source}")]
    Component {
        /// Component whose initializer failed.
        component: String,
        /// Underlying failure.
        #[source]
        source: UniversumError,
    },

    /// A failure raised inside an initializer before it is attributed to a component.
    #[error(transparent)]
    Common(#[from] UniversumError),
}

impl GravityError {
    /// Classifies this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. }
            | Self::Ambiguous { .. }
            | Self::CircularDependency { .. }
            | Self::UnknownDependency { .. }
            | Self::DependencyType { .. }
            | Self::NotAParent { .. } => ErrorKind::Lookup,
            Self::MissingParameter { .. }
            | Self::UnexpectedParameter { .. }
            | Self::DuplicateParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::MissingSettings { .. }
            | Self::SettingsNotAccepted { .. }
            | Self::Linearization { .. } => ErrorKind::Construction,
            Self::Arguments(_) => ErrorKind::Arguments,
            Self::Component { .. } | Self::Common(_) => ErrorKind::Component,
        }
    }

    /// Attributes an unattributed component failure to `component`.
    pub(crate) fn attribute(self, component: &str) -> Self {
        match self {
            Self::Common(source) => Self::Component {
                component: component.to_owned(),
                source,
            },
            other => other,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GravityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_is_lookup_kind() {
        let err = GravityError::CircularDependency {
            cycle: "A->A".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.to_string(), "circular dependency detected: A->A");
    }

    #[test]
    fn attribute_names_the_component() {
        let err = GravityError::from(UniversumError::Config {
            message: "bad".into(),
        })
        .attribute("Vcs");
        assert_eq!(err.kind(), ErrorKind::Component);
        assert!(err.to_string().starts_with("Vcs: "), "got: {err}");
    }

    #[test]
    fn attribute_keeps_container_errors() {
        let err = GravityError::MissingSettings {
            component: "Q".into(),
        }
        .attribute("P");
        assert!(err.to_string().starts_with("Q:"), "got: {err}");
    }
}
