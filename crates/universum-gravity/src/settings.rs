//! Parsed settings, one namespace per component type.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arguments::ArgumentError;

/// A single parsed option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A `store_true` style switch.
    Flag(bool),
    /// A value-taking option.
    Text(String),
    /// A value-taking option that was neither given nor defaulted.
    Unset,
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SettingValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

/// Options declared by one component type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    values: BTreeMap<String, SettingValue>,
}

impl Namespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of an option.
    pub fn get(&self, dest: &str) -> Option<&SettingValue> {
        self.values.get(dest)
    }

    /// Returns the text value of an option, `None` when unset or undeclared.
    pub fn get_str(&self, dest: &str) -> Option<&str> {
        match self.values.get(dest) {
            Some(SettingValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the state of a switch; undeclared switches read as `false`.
    pub fn get_flag(&self, dest: &str) -> bool {
        matches!(self.values.get(dest), Some(SettingValue::Flag(true)))
    }

    /// Parses the text value of an option.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not parse as `T`.
    pub fn get_parsed<T>(&self, dest: &str) -> Result<Option<T>, ArgumentError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_str(dest)
            .map(|text| {
                text.parse().map_err(|e: T::Err| ArgumentError::InvalidValue {
                    dest: dest.to_owned(),
                    value: text.to_owned(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Returns `true` when the namespace holds an entry for `dest`.
    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    /// Sets an option value.
    pub fn set(&mut self, dest: impl Into<String>, value: impl Into<SettingValue>) {
        let _ = self.values.insert(dest.into(), value.into());
    }

    /// Iterates over option names and values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of options in the namespace.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the namespace holds no option.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parsed settings for a whole component graph.
///
/// A component type appears at most once, keyed by its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsTree {
    namespaces: BTreeMap<String, Namespace>,
}

impl SettingsTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the namespace of a component type.
    pub fn namespace(&self, component: &str) -> Option<&Namespace> {
        self.namespaces.get(component)
    }

    /// Returns the namespace of a component type, creating it if absent.
    pub fn namespace_mut(&mut self, component: &str) -> &mut Namespace {
        self.namespaces.entry(component.to_owned()).or_default()
    }

    /// Returns `true` when a namespace exists for the component type.
    pub fn contains(&self, component: &str) -> bool {
        self.namespaces.contains_key(component)
    }

    /// Names of all namespaces in the tree.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Number of namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns `true` if the tree has no namespace.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_and_missing_read_as_none() {
        let mut ns = Namespace::new();
        ns.set("option", None::<String>);
        assert_eq!(ns.get_str("option"), None);
        assert!(ns.contains("option"));
        assert_eq!(ns.get_str("other"), None);
        assert!(!ns.contains("other"));
    }

    #[test]
    fn flags_default_to_false() {
        let mut ns = Namespace::new();
        ns.set("report", true);
        assert!(ns.get_flag("report"));
        assert!(!ns.get_flag("missing"));
    }

    #[test]
    fn parsed_values() {
        let mut ns = Namespace::new();
        ns.set("timeout", "30");
        ns.set("broken", "x");
        assert_eq!(ns.get_parsed::<u32>("timeout").expect("parse"), Some(30));
        assert_eq!(ns.get_parsed::<u32>("absent").expect("parse"), None);
        let err = ns.get_parsed::<u32>("broken").expect_err("should fail");
        assert!(err.to_string().contains("broken"), "got: {err}");
    }

    #[test]
    fn tree_serializes_as_nested_objects() {
        let mut tree = SettingsTree::new();
        tree.namespace_mut("Vcs").set("type", "none");
        tree.namespace_mut("Output").set("quiet", false);
        tree.namespace_mut("Output").set("out_type", None::<String>);
        let json = serde_json::to_value(&tree).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "Output": {"out_type": null, "quiet": false},
                "Vcs": {"type": "none"}
            })
        );
    }
}
