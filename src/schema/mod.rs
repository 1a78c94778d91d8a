//! Parameter schema validation: the document walker and the
//! registration-time meta-rules.

pub mod meta;
pub mod validator;

pub use meta::meta_validate;
pub use validator::{SchemaValidator, ValidationReport};
