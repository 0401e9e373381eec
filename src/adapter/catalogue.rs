use std::path::Path;

use crate::{
    contract::{Outputs, ParameterSpec, ResultSpec, Values},
    script_runner::{ExecutionReport, ScriptRunner},
};

use super::{
    Adapter, AdapterError, CentralVeinSign, Interface, LesionClusters, LesionSegmentation,
    LesionSegmentationData, ParamagneticRimLesion, State,
};

/// Object safe view of an [`Adapter`], for callers that pick the routine at
/// runtime by name.
pub trait Invocation: Send {
    fn name(&self) -> &'static str;
    fn state(&self) -> State;
    fn configure_values(&mut self, values: Values) -> Result<(), AdapterError>;
    fn render_script(&self) -> Result<String, AdapterError>;
    fn execute(&mut self, runner: &dyn ScriptRunner) -> Result<Outputs, AdapterError>;
    fn report(&self) -> Option<&ExecutionReport>;
}

impl<I: Interface> Invocation for Adapter<I> {
    fn name(&self) -> &'static str {
        I::NAME
    }

    fn state(&self) -> State {
        Adapter::state(self)
    }

    fn configure_values(&mut self, values: Values) -> Result<(), AdapterError> {
        self.configure(values)
    }

    fn render_script(&self) -> Result<String, AdapterError> {
        Adapter::render_script(self)
    }

    fn execute(&mut self, runner: &dyn ScriptRunner) -> Result<Outputs, AdapterError> {
        Adapter::execute(self, runner).cloned()
    }

    fn report(&self) -> Option<&ExecutionReport> {
        Adapter::report(self)
    }
}

/// Static description of one adapter
#[derive(Debug)]
pub struct Descriptor {
    pub name: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub results: &'static [ResultSpec],
    build: fn(&Path) -> Result<Box<dyn Invocation>, AdapterError>,
}

impl Descriptor {
    const fn of<I: Interface + 'static>() -> Self {
        Self {
            name: I::NAME,
            parameters: I::PARAMETERS,
            results: I::RESULTS,
            build: build::<I>,
        }
    }

    /// Create an unconfigured adapter working in `working_directory`
    pub fn build(&self, working_directory: &Path) -> Result<Box<dyn Invocation>, AdapterError> {
        (self.build)(working_directory)
    }

    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn build<I: Interface + 'static>(
    working_directory: &Path,
) -> Result<Box<dyn Invocation>, AdapterError> {
    Ok(Box::new(Adapter::<I>::new(working_directory)?))
}

pub static CATALOGUE: &[Descriptor] = &[
    Descriptor::of::<CentralVeinSign>(),
    Descriptor::of::<LesionClusters>(),
    Descriptor::of::<LesionSegmentation>(),
    Descriptor::of::<LesionSegmentationData>(),
    Descriptor::of::<ParamagneticRimLesion>(),
];

pub fn lookup(name: &str) -> Option<&'static Descriptor> {
    CATALOGUE.iter().find(|descriptor| descriptor.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tempdir::TempDir;

    use crate::{
        adapter::testing::{touch, FakeRunner},
        contract::{Requirement, Value},
    };

    use super::*;

    #[test]
    fn every_adapter_builds() {
        let directory = TempDir::new("catalogue").unwrap();

        for descriptor in CATALOGUE {
            let invocation = descriptor.build(directory.path()).unwrap();

            assert_eq!(invocation.name(), descriptor.name);
            assert_eq!(invocation.state(), State::Unconfigured);
        }
    }

    #[test]
    fn names_are_unique_and_found() {
        let names: BTreeSet<&str> = CATALOGUE.iter().map(|descriptor| descriptor.name).collect();
        assert_eq!(names.len(), CATALOGUE.len());

        for descriptor in CATALOGUE {
            let found = lookup(descriptor.name).unwrap();
            assert_eq!(found.name, descriptor.name);
            assert_eq!(found.parameters, descriptor.parameters);
        }

        assert!(lookup("centralveins").is_none());
    }

    #[test]
    fn unconfigured_adapters_report_their_first_mandatory_input() {
        let directory = TempDir::new("catalogue").unwrap();
        let runner = FakeRunner::writing(&[]);

        for descriptor in CATALOGUE {
            let mut invocation = descriptor.build(directory.path()).unwrap();
            let first_mandatory = descriptor
                .parameters
                .iter()
                .find(|p| p.requirement == Requirement::Mandatory)
                .unwrap();

            let error = invocation.execute(&runner).unwrap_err();

            assert!(matches!(
                error,
                AdapterError::MissingRequiredInput { name, .. } if name == first_mandatory.name
            ));
        }

        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn adapters_run_through_the_object_safe_view() {
        let directory = TempDir::new("catalogue").unwrap();
        touch(
            directory.path(),
            &["prob_map.nii.gz", "lesion_map.nii.gz", "phase.nii.gz"],
        );

        let descriptor = lookup("paramagnetic_rim_lesion").unwrap();
        let mut invocation = descriptor.build(directory.path()).unwrap();

        invocation
            .configure_values(Values::from([
                ("prob_map".to_owned(), Value::from("prob_map.nii.gz")),
                ("lesion_map".to_owned(), Value::from("lesion_map.nii.gz")),
                ("phase".to_owned(), Value::from("phase.nii.gz")),
            ]))
            .unwrap();

        let runner = FakeRunner::writing(&["leslabels.nii.gz", "preds.npy"]);
        let outputs = invocation.execute(&runner).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(invocation.state(), State::Succeeded);
        assert_eq!(invocation.report().unwrap().exit_code, Some(0));
        assert_eq!(descriptor.parameter("disc").unwrap().name, "disc");
    }
}
