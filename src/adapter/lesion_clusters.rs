use std::path::PathBuf;

use crate::contract::{Inputs, ParameterSpec, ResultSpec, Value, Values};

use super::{AdapterError, Interface};

/// Splits a lesion segmentation into individual lesions: lesion centers,
/// nearest neighbour and connected component cluster maps, and optionally a
/// Gaussian mixture cluster map.
#[derive(Debug, Clone, PartialEq)]
pub struct LesionClusters {
    pub prob_map: PathBuf,
    pub bin_map: PathBuf,
    pub centers: PathBuf,
    pub nnmap: PathBuf,
    pub clusmap: PathBuf,
    /// Only written when `gmm` is set
    pub gmmmap: PathBuf,
    pub gmm: bool,
    pub parallel: bool,
    pub cores: i64,
    pub smooth: f64,
    pub min_center_size: i64,
}

impl LesionClusters {
    pub fn new(prob_map: impl Into<PathBuf>, bin_map: impl Into<PathBuf>) -> Self {
        Self {
            prob_map: prob_map.into(),
            bin_map: bin_map.into(),
            centers: PathBuf::from("centers.nii.gz"),
            nnmap: PathBuf::from("nnmap.nii.gz"),
            clusmap: PathBuf::from("clusmap.nii.gz"),
            gmmmap: PathBuf::from("gmmmap.nii.gz"),
            gmm: true,
            parallel: false,
            cores: 1,
            smooth: 1.2,
            min_center_size: 10,
        }
    }
}

impl Interface for LesionClusters {
    const NAME: &'static str = "lesion_clusters";

    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::file("prob_map").mandatory().existing(),
        ParameterSpec::file("bin_map").mandatory().existing(),
        ParameterSpec::file("centers").defaults_to("centers.nii.gz"),
        ParameterSpec::file("nnmap").defaults_to("nnmap.nii.gz"),
        ParameterSpec::file("clusmap").defaults_to("clusmap.nii.gz"),
        ParameterSpec::file("gmmmap").defaults_to("gmmmap.nii.gz"),
        ParameterSpec::flag("gmm", true),
        ParameterSpec::flag("parallel", false),
        ParameterSpec::integer("cores", 1),
        ParameterSpec::float("smooth", 1.2),
        ParameterSpec::integer("min_center_size", 10),
    ];

    const RESULTS: &'static [ResultSpec] = &[
        ResultSpec::file("centers").existing(),
        ResultSpec::file("nnmap").existing(),
        ResultSpec::file("clusmap").existing(),
        ResultSpec::file("gmmmap"),
    ];

    const TEMPLATE: &'static str = include_str!("../../scripts/lesion_clusters.R");

    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError> {
        Ok(Self {
            prob_map: inputs.path("prob_map")?,
            bin_map: inputs.path("bin_map")?,
            centers: inputs.path("centers")?,
            nnmap: inputs.path("nnmap")?,
            clusmap: inputs.path("clusmap")?,
            gmmmap: inputs.path("gmmmap")?,
            gmm: inputs.flag("gmm")?,
            parallel: inputs.flag("parallel")?,
            cores: inputs.integer("cores")?,
            smooth: inputs.float("smooth")?,
            min_center_size: inputs.integer("min_center_size")?,
        })
    }

    fn to_values(&self) -> Values {
        Values::from([
            ("prob_map".to_owned(), Value::from(self.prob_map.clone())),
            ("bin_map".to_owned(), Value::from(self.bin_map.clone())),
            ("centers".to_owned(), Value::from(self.centers.clone())),
            ("nnmap".to_owned(), Value::from(self.nnmap.clone())),
            ("clusmap".to_owned(), Value::from(self.clusmap.clone())),
            ("gmmmap".to_owned(), Value::from(self.gmmmap.clone())),
            ("gmm".to_owned(), Value::from(self.gmm)),
            ("parallel".to_owned(), Value::from(self.parallel)),
            ("cores".to_owned(), Value::from(self.cores)),
            ("smooth".to_owned(), Value::from(self.smooth)),
            (
                "min_center_size".to_owned(),
                Value::from(self.min_center_size),
            ),
        ])
    }
}
