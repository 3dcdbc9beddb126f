//! Encoding and scaling of derived evidence features

mod encoder;
mod scaler;

pub use encoder::{CategoricalEncoder, CategoryMapping};
pub use scaler::{FeatureMatrix, StandardScaler};
