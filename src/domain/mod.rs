//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. The encoder and the category maps live here
//! because they are a contract with the trained model.

pub mod features;
mod persisted;
mod prediction;
pub mod record;

pub use features::{EncodedFeatureVector, ENCODING_VERSION, FEATURE_COUNT, FEATURE_NAMES};
pub use persisted::{PersistedRecord, COLUMNS};
pub use prediction::{PredictionResult, SurvivalLabel};
pub use record::{
    CancerStage, Category, ClinicalRecord, Gender, SmokingStatus, TreatmentType, YesNo,
};
