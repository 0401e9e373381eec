//! Adapters that run R lesion analysis routines (MIMoSA segmentation,
//! lesion clustering, central vein sign and paramagnetic rim lesion
//! detection) as workflow steps.
//!
//! Every adapter declares its inputs and results, renders an R script from
//! them, hands the script to a [`ScriptRunner`] and maps the files the script
//! wrote back to absolute output paths.

pub mod adapter;
pub mod config;
pub mod contract;
pub mod history;
pub mod script_runner;
pub mod template;

pub use adapter::{Adapter, AdapterError, Interface, State};
pub use contract::{Inputs, Kind, Outputs, ParameterSpec, ResultSpec, Value, Values};
pub use script_runner::{ExecutionReport, RScriptRunner, RunnerError, ScriptRunner};
pub use template::{ScriptTemplate, TemplateError};
