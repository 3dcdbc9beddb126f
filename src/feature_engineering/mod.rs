//! Feature engineering for raw evidence records

mod derive;

pub use derive::FeatureDeriver;
