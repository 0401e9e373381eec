use crate::contract::{Inputs, ParameterSpec, ResultSpec, Values};

use super::AdapterError;

/// The static contract of one analysis routine: its typed inputs, the files
/// it produces and the script that calls it.
///
/// Implementors are plain structs holding the routine's inputs, so callers
/// that know the adapter at compile time can fill in fields instead of
/// building a [`Values`] map.
pub trait Interface: Sized + Send {
    /// Identifier used by the command line and the run history
    const NAME: &'static str;
    const PARAMETERS: &'static [ParameterSpec];
    const RESULTS: &'static [ResultSpec];
    /// Script with one `{{name}}` slot per parameter
    const TEMPLATE: &'static str;

    /// Read the typed inputs back out of checked inputs.
    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError>;

    /// The raw values this struct configures an adapter with
    fn to_values(&self) -> Values;
}
