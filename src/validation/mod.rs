pub mod version_validator;

pub use version_validator::{
    MaxSelection, NumericVersion, VersionValidationResult, VersionValidator,
};
