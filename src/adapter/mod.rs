mod catalogue;
mod central_vein_sign;
mod error;
mod interface;
mod lesion_clusters;
mod lesion_segmentation;
mod lesion_segmentation_data;
mod lifecycle;
mod paramagnetic_rim_lesion;
#[cfg(test)]
mod testing;

pub use catalogue::{lookup, Descriptor, Invocation, CATALOGUE};
pub use central_vein_sign::CentralVeinSign;
pub use error::AdapterError;
pub use interface::Interface;
pub use lesion_clusters::LesionClusters;
pub use lesion_segmentation::LesionSegmentation;
pub use lesion_segmentation_data::LesionSegmentationData;
pub use lifecycle::{Adapter, State};
pub use paramagnetic_rim_lesion::ParamagneticRimLesion;
