//! The trait every injectable component type implements.

use std::any::Any;

use crate::arguments::{ArgumentError, ArgumentScope};
use crate::context::InitContext;
use crate::descriptor::Declaration;
use crate::error::Result;
use crate::params::Params;

/// A unit of capability the container can construct.
///
/// ```
/// use universum_gravity::{Component, Declaration, InitContext, Result};
/// use universum_gravity::arguments::{ArgumentError, ArgumentScope, OptionSpec};
///
/// struct Reporter {
///     verbose: bool,
/// }
///
/// impl Component for Reporter {
///     const NAME: &'static str = "Reporter";
///
///     fn declare(decl: &mut Declaration) {
///         let _ = decl.takes_settings();
///     }
///
///     fn define_arguments(args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
///         args.add_argument(OptionSpec::new("--verbose").flag())
///     }
///
///     fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self> {
///         Ok(Self { verbose: ctx.settings()?.get_flag("verbose") })
///     }
/// }
/// ```
pub trait Component: Any + Sized {
    /// Name of the type; also the name of its settings namespace.
    const NAME: &'static str;

    /// Declares dependencies, parents and the initializer signature.
    fn declare(_decl: &mut Declaration) {}

    /// Registers the options of this type into its own namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if an option conflicts with one already registered.
    fn define_arguments(_args: &mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError> {
        Ok(())
    }

    /// Named parameters this type hands to its ancestors.
    ///
    /// Called before any member of the hierarchy is constructed, most
    /// derived type first; the result is merged into the parameters every
    /// later ancestor in the linearized order can bind.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be computed.
    fn parent_params(_ctx: &InitContext<'_, '_>) -> Result<Params> {
        Ok(Params::new())
    }

    /// Builds the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency, setting or parameter is missing,
    /// or the component itself fails to initialize.
    fn construct(ctx: &mut InitContext<'_, '_>) -> Result<Self>;
}
