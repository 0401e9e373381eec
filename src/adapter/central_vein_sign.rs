use std::path::PathBuf;

use crate::contract::{Inputs, ParameterSpec, ResultSpec, Value, Values};

use super::{AdapterError, Interface};

/// Central vein sign detection on an EPI image, seeded with a MIMoSA
/// probability map and its thresholded binary map.
#[derive(Debug, Clone, PartialEq)]
pub struct CentralVeinSign {
    pub t1: PathBuf,
    pub epi: PathBuf,
    pub flair: PathBuf,
    pub mimosa_prob_map: PathBuf,
    pub mimosa_bin_map: PathBuf,
    pub candidate_lesions: PathBuf,
    pub cvs_prob_map: PathBuf,
    pub biomarker: PathBuf,
    pub parallel: bool,
    pub skullstripped: bool,
    pub biascorrected: bool,
    /// Use the c3d based registration/segmentation path
    pub c3d: bool,
    pub cores: i64,
}

impl CentralVeinSign {
    pub fn new(
        t1: impl Into<PathBuf>,
        epi: impl Into<PathBuf>,
        flair: impl Into<PathBuf>,
        mimosa_prob_map: impl Into<PathBuf>,
        mimosa_bin_map: impl Into<PathBuf>,
    ) -> Self {
        Self {
            t1: t1.into(),
            epi: epi.into(),
            flair: flair.into(),
            mimosa_prob_map: mimosa_prob_map.into(),
            mimosa_bin_map: mimosa_bin_map.into(),
            candidate_lesions: PathBuf::from("candidate_lesions.npy"),
            cvs_prob_map: PathBuf::from("prob_map.npy"),
            biomarker: PathBuf::from("biomarker.npy"),
            parallel: false,
            skullstripped: false,
            biascorrected: false,
            c3d: true,
            cores: 1,
        }
    }
}

impl Interface for CentralVeinSign {
    const NAME: &'static str = "central_vein_sign";

    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::file("t1").mandatory().existing(),
        ParameterSpec::file("epi").mandatory().existing(),
        ParameterSpec::file("flair").mandatory().existing(),
        ParameterSpec::file("mimosa_prob_map").mandatory().existing(),
        ParameterSpec::file("mimosa_bin_map").mandatory().existing(),
        ParameterSpec::file("candidate_lesions").defaults_to("candidate_lesions.npy"),
        ParameterSpec::file("cvs_prob_map").defaults_to("prob_map.npy"),
        ParameterSpec::file("biomarker").defaults_to("biomarker.npy"),
        ParameterSpec::flag("parallel", false),
        ParameterSpec::flag("skullstripped", false),
        ParameterSpec::flag("biascorrected", false),
        ParameterSpec::flag("c3d", true),
        ParameterSpec::integer("cores", 1),
    ];

    const RESULTS: &'static [ResultSpec] = &[
        ResultSpec::file("candidate_lesions").existing(),
        ResultSpec::file("cvs_prob_map"),
        ResultSpec::file("biomarker"),
    ];

    const TEMPLATE: &'static str = include_str!("../../scripts/central_vein_sign.R");

    fn from_inputs(inputs: &Inputs) -> Result<Self, AdapterError> {
        Ok(Self {
            t1: inputs.path("t1")?,
            epi: inputs.path("epi")?,
            flair: inputs.path("flair")?,
            mimosa_prob_map: inputs.path("mimosa_prob_map")?,
            mimosa_bin_map: inputs.path("mimosa_bin_map")?,
            candidate_lesions: inputs.path("candidate_lesions")?,
            cvs_prob_map: inputs.path("cvs_prob_map")?,
            biomarker: inputs.path("biomarker")?,
            parallel: inputs.flag("parallel")?,
            skullstripped: inputs.flag("skullstripped")?,
            biascorrected: inputs.flag("biascorrected")?,
            c3d: inputs.flag("c3d")?,
            cores: inputs.integer("cores")?,
        })
    }

    fn to_values(&self) -> Values {
        let paths = [
            ("t1", &self.t1),
            ("epi", &self.epi),
            ("flair", &self.flair),
            ("mimosa_prob_map", &self.mimosa_prob_map),
            ("mimosa_bin_map", &self.mimosa_bin_map),
            ("candidate_lesions", &self.candidate_lesions),
            ("cvs_prob_map", &self.cvs_prob_map),
            ("biomarker", &self.biomarker),
        ];
        let flags = [
            ("parallel", self.parallel),
            ("skullstripped", self.skullstripped),
            ("biascorrected", self.biascorrected),
            ("c3d", self.c3d),
        ];

        let mut values: Values = paths
            .into_iter()
            .map(|(name, path)| (name.to_owned(), Value::from(path.clone())))
            .collect();
        values.extend(
            flags
                .into_iter()
                .map(|(name, flag)| (name.to_owned(), Value::from(flag))),
        );
        values.insert("cores".to_owned(), Value::from(self.cores));

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

    const IMAGES: [&str; 5] = [
        "t1.nii.gz",
        "epi.nii.gz",
        "flair.nii.gz",
        "mimosa_prob_map.nii.gz",
        "mimosa_bin_map.nii.gz",
    ];

    fn interface() -> CentralVeinSign {
        let [t1, epi, flair, prob_map, bin_map] = IMAGES;
        CentralVeinSign::new(t1, epi, flair, prob_map, bin_map)
    }

    fn adapter(directory: &TempDir) -> Adapter<CentralVeinSign> {
        touch(directory.path(), &IMAGES);
        Adapter::new(directory.path()).unwrap()
    }

    #[test]
    fn renders_flags_and_numpy_member_access() {
        let directory = TempDir::new("cvs").unwrap();
        let mut adapter = adapter(&directory);

        adapter
            .configure_with(&CentralVeinSign {
                skullstripped: true,
                biascorrected: true,
                ..interface()
            })
            .unwrap();

        let script = adapter.render_script().unwrap();

        assert!(script.contains("parallel = F,"));
        assert!(script.contains("skullstripped = T,"));
        assert!(script.contains("biascorrected = T,"));
        assert!(script.contains("c3d = T,"));
        assert!(script.contains("np$save('candidate_lesions.npy', result$candidate.lesions)"));
        assert!(script.contains("np$save('prob_map.npy', result$cvs.probmap)"));
        assert!(!script.contains("TRUE") && !script.contains("true"));
    }

    #[test]
    fn mandatory_inputs_alone_equal_spelled_out_defaults() {
        let directory = TempDir::new("cvs").unwrap();

        let names = ["t1", "epi", "flair", "mimosa_prob_map", "mimosa_bin_map"];

        let mut minimal = adapter(&directory);
        minimal
            .configure(
                names
                    .into_iter()
                    .zip(IMAGES)
                    .map(|(name, file)| (name, Value::from(file))),
            )
            .unwrap();

        let mut explicit = adapter(&directory);
        explicit.configure_with(&interface()).unwrap();

        assert_eq!(minimal.inputs(), explicit.inputs());
        assert_eq!(minimal.interface().unwrap(), interface());
    }

    #[test]
    fn only_candidate_lesions_are_required() {
        let directory = TempDir::new("cvs").unwrap();
        let mut adapter = adapter(&directory);
        adapter.configure_with(&interface()).unwrap();

        let outputs = adapter
            .execute(&FakeRunner::writing(&["candidate_lesions.npy"]))
            .unwrap();

        assert_eq!(outputs.len(), 3);
        assert_eq!(
            outputs.get("biomarker"),
            Some(directory.path().join("biomarker.npy").as_path())
        );
        assert_eq!(adapter.state(), State::Succeeded);
    }

    #[test]
    fn missing_epi_is_invalid() {
        let directory = TempDir::new("cvs").unwrap();
        let mut adapter = adapter(&directory);

        let error = adapter
            .configure_with(&CentralVeinSign {
                epi: PathBuf::from("absent_epi.nii.gz"),
                ..interface()
            })
            .unwrap_err();

        assert!(matches!(error, AdapterError::InvalidInput { ref name, .. } if name == "epi"));
        assert_eq!(adapter.state(), State::Unconfigured);
    }
}
