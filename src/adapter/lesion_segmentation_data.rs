use std::path::PathBuf;

use crate::contract::{Inputs, ParameterSpec, ResultSpec, Value, Values};

use super::{AdapterError, Interface};

/// Extracts the MIMoSA feature dataframe and candidate voxel mask without
/// predicting, so a model can be trained on them.
#[derive(Debug, Clone, PartialEq)]
pub struct LesionSegmentationData {
    pub t1: PathBuf,
    pub flair: PathBuf,
    pub t2: Option<PathBuf>,
    pub pd: Option<PathBuf>,
    /// Falls back to `t1 > min(t1)` when unset or not present
    pub brainmask: Option<PathBuf>,
    pub mimosa_dataframe: PathBuf,
    pub mimosa_candidate_mask: PathBuf,
    pub tissue: bool,
    pub verbose: bool,
    pub cores: i64,
}

impl LesionSegmentationData {
    pub fn new(t1: impl Into<PathBuf>, flair: impl Into<PathBuf>) -> Self {
        Self {
            t1: t1.into(),
            flair: flair.into(),
            t2: None,
            pd: None,
            brainmask: None,
            mimosa_dataframe: PathBuf::from("mimosa_dataframe.npy"),
            mimosa_candidate_mask: PathBuf::from("mimosa_candidate_mask.npy"),
            tissue: false,
            verbose: false,
            cores: 1,
        }
    }
}

impl Interface for LesionSegmentationData {
    const NAME: &'static str = "lesion_segmentation_data";

    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::file("t1").mandatory().existing(),
        ParameterSpec::file("flair").mandatory().existing(),
        ParameterSpec::file("t2").existing(),
        ParameterSpec::file("pd").existing(),
        ParameterSpec::file("brainmask"),
        ParameterSpec::file("mimosa_dataframe").defaults_to("mimosa_dataframe.npy"),
        ParameterSpec::file("mimosa_candidate_mask").defaults_to("mimosa_candidate_mask.npy"),
        ParameterSpec::flag("tissue", false),
        ParameterSpec::flag("verbose", false),
        ParameterSpec::integer("cores", 1),
    ];

    const RESULTS: &'static [ResultSpec] = &[
        ResultSpec::file("mimosa_dataframe").existing(),
        ResultSpec::file("mimosa_candidate_mask").existing(),
    ];

    const TEMPLATE: &'static str = include_str!("../../scripts/lesion_segmentation_data.R");

    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError> {
        Ok(Self {
            t1: inputs.path("t1")?,
            flair: inputs.path("flair")?,
            t2: inputs.optional_path("t2")?,
            pd: inputs.optional_path("pd")?,
            brainmask: inputs.optional_path("brainmask")?,
            mimosa_dataframe: inputs.path("mimosa_dataframe")?,
            mimosa_candidate_mask: inputs.path("mimosa_candidate_mask")?,
            tissue: inputs.flag("tissue")?,
            verbose: inputs.flag("verbose")?,
            cores: inputs.integer("cores")?,
        })
    }

    fn to_values(&self) -> Values {
        let mut values = Values::from([
            ("t1".to_owned(), Value::from(self.t1.clone())),
            ("flair".to_owned(), Value::from(self.flair.clone())),
            (
                "mimosa_dataframe".to_owned(),
                Value::from(self.mimosa_dataframe.clone()),
            ),
            (
                "mimosa_candidate_mask".to_owned(),
                Value::from(self.mimosa_candidate_mask.clone()),
            ),
            ("tissue".to_owned(), Value::from(self.tissue)),
            ("verbose".to_owned(), Value::from(self.verbose)),
            ("cores".to_owned(), Value::from(self.cores)),
        ]);

        let optional = [("t2", &self.t2), ("pd", &self.pd), ("brainmask", &self.brainmask)];
        for (name, path) in optional {
            if let Some(path) = path {
                values.insert(name.to_owned(), path.clone().into());
            }
        }

        values
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use crate::adapter::{
        testing::{touch, FakeRunner},
        Adapter, State,
    };

    use super::*;

    fn configured(
        directory: &TempDir,
        interface: &LesionSegmentationData,
    ) -> Adapter<LesionSegmentationData> {
        touch(directory.path(), &["t1.nii.gz", "flair.nii.gz"]);
        let mut adapter = Adapter::new(directory.path()).unwrap();
        adapter.configure_with(interface).unwrap();
        adapter
    }

    #[test]
    fn brainmask_need_not_exist() {
        let directory = TempDir::new("mimosa_data").unwrap();
        let interface = LesionSegmentationData {
            brainmask: Some(PathBuf::from("not_there.nii.gz")),
            ..LesionSegmentationData::new("t1.nii.gz", "flair.nii.gz")
        };

        let adapter = configured(&directory, &interface);
        let script = adapter.render_script().unwrap();

        assert!(script.contains("if (file.exists('not_there.nii.gz')) {"));
        assert!(script.contains("np$save('mimosa_dataframe.npy', mimosa_testdata_df)"));
    }

    #[test]
    fn defaults_match_the_typed_constructor() {
        let directory = TempDir::new("mimosa_data").unwrap();
        touch(directory.path(), &["t1.nii.gz", "flair.nii.gz"]);

        let mut adapter = Adapter::<LesionSegmentationData>::new(directory.path()).unwrap();
        adapter
            .configure([
                ("t1", Value::from("t1.nii.gz")),
                ("flair", Value::from("flair.nii.gz")),
            ])
            .unwrap();

        assert_eq!(
            adapter.interface().unwrap(),
            LesionSegmentationData::new("t1.nii.gz", "flair.nii.gz")
        );
    }

    #[test]
    fn both_outputs_are_required() {
        let directory = TempDir::new("mimosa_data").unwrap();
        let interface = LesionSegmentationData::new("t1.nii.gz", "flair.nii.gz");

        let mut adapter = configured(&directory, &interface);
        let runner = FakeRunner::writing(&["mimosa_dataframe.npy"]);

        let error = adapter.execute(&runner).unwrap_err();

        assert!(matches!(
            error,
            AdapterError::MissingOutput {
                name: "mimosa_candidate_mask",
                ..
            }
        ));
        assert_eq!(adapter.state(), State::Failed);
        assert!(adapter.outputs().is_none());
    }

    #[test]
    fn outputs_resolve_when_both_are_written() {
        let directory = TempDir::new("mimosa_data").unwrap();
        let interface = LesionSegmentationData::new("t1.nii.gz", "flair.nii.gz");

        let mut adapter = configured(&directory, &interface);
        let runner = FakeRunner::writing(&["mimosa_dataframe.npy", "mimosa_candidate_mask.npy"]);

        let outputs = adapter.execute(&runner).unwrap();

        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|(_, path)| path.is_absolute()));
    }
}
