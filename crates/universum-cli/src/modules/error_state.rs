//! Run-wide error collection.

use std::cell::RefCell;
use std::rc::Rc;

use universum_gravity::{Component, Declaration, InitContext, Instance, Result};

/// Errors reported by any component during one run.
#[derive(Debug, Default)]
pub struct GlobalErrorState {
    errors: RefCell<Vec<String>>,
}

impl GlobalErrorState {
    /// Errors reported so far, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    /// Returns `true` once any error was reported.
    pub fn is_in_error_state(&self) -> bool {
        !self.errors.borrow().is_empty()
    }

    fn push(&self, message: String) {
        self.errors.borrow_mut().push(message);
    }
}

impl Component for GlobalErrorState {
    const NAME: &'static str = "GlobalErrorState";

    fn construct(_ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        Ok(Self::default())
    }
}

/// Parent type giving components access to the shared error list.
#[derive(Debug)]
pub struct HasErrorState {
    global: Instance<GlobalErrorState>,
}

impl HasErrorState {
    /// Records an error; indentation common to all lines is removed.
    pub fn error(&self, message: &str) {
        let message = clean_doc(message);
        tracing::warn!(%message, "error reported");
        self.global.push(message);
    }

    /// Returns `true` once any component reported an error.
    pub fn is_in_error_state(&self) -> bool {
        self.global.is_in_error_state()
    }

    /// The shared error list.
    pub fn global(&self) -> Rc<GlobalErrorState> {
        Rc::clone(self.global.as_rc())
    }
}

impl Component for HasErrorState {
    const NAME: &'static str = "HasErrorState";

    fn declare(decl: &mut Declaration) {
        let _ = decl.depends_on::<GlobalErrorState>("global_error_state");
    }

    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
        Ok(Self {
            global: ctx.dependency("global_error_state")?,
        })
    }
}

/// Trims surrounding blank lines and the indentation shared by all lines
/// after the first.
fn clean_doc(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = std::iter::once(first)
        .chain(rest.iter().map(|l| l.get(indent..).unwrap_or_default().trim_end()))
        .collect();
    while out.last().is_some_and(|l| l.is_empty()) {
        let _ = out.pop();
    }
    while out.first().is_some_and(|l| l.is_empty()) {
        let _ = out.remove(0);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use universum_gravity::{Params, Registry, SettingsTree, construct};

    #[test]
    fn clean_doc_strips_common_indent() {
        let text = "
            Failed to prepare repository:
              reason one
            done
        ";
        assert_eq!(clean_doc(text), "Failed to prepare repository:\n  reason one\ndone");
    }

    #[test]
    fn clean_doc_keeps_single_line() {
        assert_eq!(clean_doc("  plain  "), "plain");
    }

    #[test]
    fn errors_are_shared_through_the_session() {
        let mut registry = Registry::new();
        let _ = registry.register::<GlobalErrorState>();
        let _ = registry.register::<HasErrorState>();
        let settings = SettingsTree::new();

        let (reporter, mut session) = construct::<HasErrorState>(&registry, &settings, Params::new())
            .expect("construct")
            .into_parts();
        assert!(!reporter.is_in_error_state());
        reporter.error("something broke");

        let global = session.construct::<GlobalErrorState>().expect("shared state");
        assert!(global.is_in_error_state());
        assert_eq!(global.errors(), ["something broke"]);
    }
}
