use std::path::PathBuf;

use crate::{
    script_runner::{ExecutionReport, RunnerError},
    template::TemplateError,
};

use super::State;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("{adapter}: required input \"{name}\" was not supplied")]
    MissingRequiredInput {
        adapter: &'static str,
        name: &'static str,
    },

    #[error("{adapter}: invalid input \"{name}\": {reason}")]
    InvalidInput {
        adapter: &'static str,
        name: String,
        reason: String,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("{adapter}: result \"{name}\" has no file parameter carrying its path")]
    UnboundResult {
        adapter: &'static str,
        name: &'static str,
    },

    #[error("unable to resolve working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("{adapter}: script failed with {report}\n{}", .report.stderr)]
    ExternalExecution {
        adapter: &'static str,
        report: ExecutionReport,
    },

    #[error("{adapter}: script finished but did not produce \"{name}\" at {}", .path.display())]
    MissingOutput {
        adapter: &'static str,
        name: &'static str,
        path: PathBuf,
    },

    #[error("{0} has already been executed")]
    AlreadyExecuted(&'static str),

    #[error("{adapter} has no outputs while {state}")]
    NoOutputs {
        adapter: &'static str,
        state: State,
    },
}
