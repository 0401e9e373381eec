use std::{
    fmt::Display,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    contract::{check_inputs, Inputs, Kind, Outputs, Value, Values},
    script_runner::{ExecutionReport, ScriptRunner},
    template::ScriptTemplate,
};

use super::{AdapterError, Interface};

/// Lifecycle of an adapter. `Succeeded` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Configured,
    Executing,
    Succeeded,
    Failed,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Unconfigured => "unconfigured",
            State::Configured => "configured",
            State::Executing => "executing",
            State::Succeeded => "succeeded",
            State::Failed => "failed",
        }
    }

    fn has_started(&self) -> bool {
        matches!(self, State::Executing | State::Succeeded | State::Failed)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the routine described by `I` once.
///
/// Relative paths, both inputs and outputs, are resolved against the
/// adapter's working directory, which is also where the script runs.
#[derive(Debug)]
pub struct Adapter<I: Interface> {
    template: ScriptTemplate,
    working_directory: PathBuf,
    state: State,
    inputs: Option<Inputs>,
    outputs: Option<Outputs>,
    report: Option<ExecutionReport>,
    interface: PhantomData<fn() -> I>,
}

impl<I: Interface> Adapter<I> {
    /// Create an unconfigured adapter. Fails when the template and the
    /// declared parameters/results disagree.
    pub fn new(working_directory: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let template = ScriptTemplate::compile(I::TEMPLATE, I::PARAMETERS)?;

        for result in I::RESULTS {
            let bound = I::PARAMETERS
                .iter()
                .any(|p| p.name == result.name && p.kind == Kind::File);

            if !bound {
                return Err(AdapterError::UnboundResult {
                    adapter: I::NAME,
                    name: result.name,
                });
            }
        }

        let working_directory =
            std::path::absolute(working_directory).map_err(AdapterError::WorkingDirectory)?;

        Ok(Self {
            template,
            working_directory,
            state: State::Unconfigured,
            inputs: None,
            outputs: None,
            report: None,
            interface: PhantomData,
        })
    }

    pub fn name(&self) -> &'static str {
        I::NAME
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn inputs(&self) -> Option<&Inputs> {
        self.inputs.as_ref()
    }

    /// Resolved results, present only after a successful execution
    pub fn outputs(&self) -> Option<&Outputs> {
        self.outputs.as_ref()
    }

    /// Streams and exit status of the script, once it has run
    pub fn report(&self) -> Option<&ExecutionReport> {
        self.report.as_ref()
    }

    /// Assign input values, applying defaults for everything not supplied.
    /// May be repeated until the adapter has been executed.
    pub fn configure<K: Into<String>>(
        &mut self,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<(), AdapterError> {
        if self.state.has_started() {
            return Err(AdapterError::AlreadyExecuted(I::NAME));
        }

        let values: Values = values
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();

        let inputs = match check_inputs(I::NAME, I::PARAMETERS, values, &self.working_directory) {
            Ok(inputs) => inputs,
            Err(err) => {
                // a rejected configuration must not leave the previous one runnable
                self.inputs = None;
                self.state = State::Unconfigured;
                return Err(err);
            }
        };

        debug!("configured {} with {:?}", I::NAME, inputs);

        self.inputs = Some(inputs);
        self.state = State::Configured;

        Ok(())
    }

    /// Configure from the typed inputs struct
    pub fn configure_with(&mut self, interface: &I) -> Result<(), AdapterError> {
        self.configure(interface.to_values())
    }

    /// Typed view of the configured inputs
    pub fn interface(&self) -> Result<I, AdapterError> {
        I::from_inputs(&self.current_inputs()?)
    }

    /// Render the script for the configured inputs. Pure: nothing is read
    /// from disk and nothing is run.
    pub fn render_script(&self) -> Result<String, AdapterError> {
        Ok(self.template.render(&self.current_inputs()?))
    }

    /// Run the script through `runner` and map its results. Blocks until the
    /// script terminated.
    pub fn execute<R: ScriptRunner + ?Sized>(
        &mut self,
        runner: &R,
    ) -> Result<&Outputs, AdapterError> {
        if self.state.has_started() {
            return Err(AdapterError::AlreadyExecuted(I::NAME));
        }

        let inputs = self.current_inputs()?;
        let script = self.template.render(&inputs);

        self.state = State::Executing;
        info!(
            "executing {} in {}",
            I::NAME,
            self.working_directory.to_string_lossy()
        );

        match self.run(runner, &script, &inputs) {
            Ok(outputs) => {
                info!("{} succeeded with {} outputs", I::NAME, outputs.len());
                self.state = State::Succeeded;
                Ok(&*self.outputs.insert(outputs))
            }
            Err(err) => {
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    /// Absolute paths of every declared result, resolved when the script
    /// succeeded. Any other state has no outputs.
    pub fn map_outputs(&self) -> Result<&Outputs, AdapterError> {
        match (&self.state, &self.outputs) {
            (State::Succeeded, Some(outputs)) => Ok(outputs),
            (state, _) => Err(AdapterError::NoOutputs {
                adapter: I::NAME,
                state: *state,
            }),
        }
    }

    fn run<R: ScriptRunner + ?Sized>(
        &mut self,
        runner: &R,
        script: &str,
        inputs: &Inputs,
    ) -> Result<Outputs, AdapterError> {
        let report = runner.run(script, &self.working_directory)?;
        self.report = Some(report.clone());

        if !report.success() {
            return Err(AdapterError::ExternalExecution {
                adapter: I::NAME,
                report,
            });
        }

        self.resolve_outputs(inputs)
    }

    fn resolve_outputs(&self, inputs: &Inputs) -> Result<Outputs, AdapterError> {
        let mut outputs = Outputs::default();

        for result in I::RESULTS {
            let path = self.working_directory.join(inputs.path(result.name)?);

            if !path.exists() {
                if result.must_exist {
                    return Err(AdapterError::MissingOutput {
                        adapter: I::NAME,
                        name: result.name,
                        path,
                    });
                }

                warn!(
                    "{} did not write optional output \"{}\" at {}",
                    I::NAME,
                    result.name,
                    path.to_string_lossy()
                );
            }

            outputs.insert(result.name, path);
        }

        Ok(outputs)
    }

    /// Configured inputs, or for an unconfigured adapter the defaults, which
    /// fails on the first mandatory parameter.
    fn current_inputs(&self) -> Result<Inputs, AdapterError> {
        match &self.inputs {
            Some(inputs) => Ok(inputs.clone()),
            None => check_inputs(
                I::NAME,
                I::PARAMETERS,
                Values::new(),
                &self.working_directory,
            ),
        }
    }
}
