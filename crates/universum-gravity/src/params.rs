//! Call-site parameters passed to component initializers.
//!
//! Settings come from the parsed namespace tree; parameters are the
//! ad hoc values a component hands to a dependency when it requests it,
//! or that a derived component hands to its parents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional and named initializer parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named value, replacing an earlier one with the same name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.named.insert(name.into(), value.into());
        self
    }

    /// Returns `true` when no value was supplied.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Positional values in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Named values.
    pub const fn named_values(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    pub(crate) fn into_parts(self) -> (Vec<Value>, BTreeMap<String, Value>) {
        (self.positional, self.named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_positional_order() {
        let params = Params::new().arg(1).arg("two").named("three", 3);
        assert_eq!(params.positional(), &[Value::from(1), Value::from("two")]);
        assert_eq!(params.named_values().get("three"), Some(&Value::from(3)));
    }

    #[test]
    fn empty_params() {
        assert!(Params::new().is_empty());
        assert!(!Params::new().named("a", true).is_empty());
    }
}
