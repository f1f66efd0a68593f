//! Data-quality validation and anomaly diagnostics.

pub mod diagnostics;
pub mod validator;

pub use diagnostics::{find_outliers, modified_z_scores, Diagnostician, Outlier};
pub use validator::{QualityCheck, Validator};
