use std::path::PathBuf;

use crate::contract::{Inputs, ParameterSpec, ResultSpec, Value, Values};

use super::{AdapterError, Interface};

/// MIMoSA lesion probability map from T1 and FLAIR images, optionally
/// refined with T2 and PD images.
#[derive(Debug, Clone, PartialEq)]
pub struct LesionSegmentation {
    pub t1: PathBuf,
    pub flair: PathBuf,
    pub t2: Option<PathBuf>,
    pub pd: Option<PathBuf>,
    /// Where the probability map is written
    pub prob_map: PathBuf,
    /// Also segment tissue classes
    pub tissue: bool,
    pub verbose: bool,
    pub cores: i64,
}

impl LesionSegmentation {
    pub fn new(t1: impl Into<PathBuf>, flair: impl Into<PathBuf>) -> Self {
        Self {
            t1: t1.into(),
            flair: flair.into(),
            t2: None,
            pd: None,
            prob_map: PathBuf::from("prob_map.nii.gz"),
            tissue: false,
            verbose: false,
            cores: 1,
        }
    }
}

impl Interface for LesionSegmentation {
    const NAME: &'static str = "lesion_segmentation";

    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::file("t1").mandatory().existing(),
        ParameterSpec::file("flair").mandatory().existing(),
        ParameterSpec::file("t2").existing(),
        ParameterSpec::file("pd").existing(),
        ParameterSpec::file("prob_map").defaults_to("prob_map.nii.gz"),
        ParameterSpec::flag("tissue", false),
        ParameterSpec::flag("verbose", false),
        ParameterSpec::integer("cores", 1),
    ];

    const RESULTS: &'static [ResultSpec] = &[ResultSpec::file("prob_map")];

    const TEMPLATE: &'static str = include_str!("../../scripts/lesion_segmentation.R");

    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError> {
        Ok(Self {
            t1: inputs.path("t1")?,
            flair: inputs.path("flair")?,
            t2: inputs.optional_path("t2")?,
            pd: inputs.optional_path("pd")?,
            prob_map: inputs.path("prob_map")?,
            tissue: inputs.flag("tissue")?,
            verbose: inputs.flag("verbose")?,
            cores: inputs.integer("cores")?,
        })
    }

    fn to_values(&self) -> Values {
        let mut values = Values::from([
            ("t1".to_owned(), Value::from(self.t1.clone())),
            ("flair".to_owned(), Value::from(self.flair.clone())),
            ("prob_map".to_owned(), Value::from(self.prob_map.clone())),
            ("tissue".to_owned(), Value::from(self.tissue)),
            ("verbose".to_owned(), Value::from(self.verbose)),
            ("cores".to_owned(), Value::from(self.cores)),
        ]);

        if let Some(t2) = &self.t2 {
            values.insert("t2".to_owned(), t2.clone().into());
        }
        if let Some(pd) = &self.pd {
            values.insert("pd".to_owned(), pd.clone().into());
        }

        values
    }
}
