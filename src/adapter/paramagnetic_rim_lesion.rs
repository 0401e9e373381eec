use std::path::PathBuf;

use crate::contract::{Inputs, ParameterSpec, ResultSpec, Value, Values};

use super::{AdapterError, Interface};

/// Paramagnetic rim lesion detection from a lesion probability map, a
/// lesion mask and a phase image.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamagneticRimLesion {
    pub prob_map: PathBuf,
    pub lesion_map: PathBuf,
    pub phase: PathBuf,
    pub leslabels: PathBuf,
    pub preds: PathBuf,
    /// Discretize the lesion labels
    pub disc: bool,
}

impl ParamagneticRimLesion {
    pub fn new(
        prob_map: impl Into<PathBuf>,
        lesion_map: impl Into<PathBuf>,
        phase: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prob_map: prob_map.into(),
            lesion_map: lesion_map.into(),
            phase: phase.into(),
            leslabels: PathBuf::from("leslabels.nii.gz"),
            preds: PathBuf::from("preds.npy"),
            disc: true,
        }
    }
}

impl Interface for ParamagneticRimLesion {
    const NAME: &'static str = "paramagnetic_rim_lesion";

    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::file("prob_map").mandatory().existing(),
        ParameterSpec::file("lesion_map").mandatory().existing(),
        ParameterSpec::file("phase").mandatory().existing(),
        ParameterSpec::file("leslabels").defaults_to("leslabels.nii.gz"),
        ParameterSpec::file("preds").defaults_to("preds.npy"),
        ParameterSpec::flag("disc", true),
    ];

    const RESULTS: &'static [ResultSpec] = &[
        ResultSpec::file("leslabels").existing(),
        ResultSpec::file("preds"),
    ];

    const TEMPLATE: &'static str = include_str!("../../scripts/paramagnetic_rim_lesion.R");

    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError> {
        Ok(Self {
            prob_map: inputs.path("prob_map")?,
            lesion_map: inputs.path("lesion_map")?,
            phase: inputs.path("phase")?,
            leslabels: inputs.path("leslabels")?,
            preds: inputs.path("preds")?,
            disc: inputs.flag("disc")?,
        })
    }

    fn to_values(&self) -> Values {
        Values::from([
            ("prob_map".to_owned(), Value::from(self.prob_map.clone())),
            ("lesion_map".to_owned(), Value::from(self.lesion_map.clone())),
            ("phase".to_owned(), Value::from(self.phase.clone())),
            ("leslabels".to_owned(), Value::from(self.leslabels.clone())),
            ("preds".to_owned(), Value::from(self.preds.clone())),
            ("disc".to_owned(), Value::from(self.disc)),
        ])
    }
}
