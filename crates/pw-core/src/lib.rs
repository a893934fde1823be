pub mod error;
pub mod report;
pub mod types;
pub mod value;

pub use error::{ErrorKind, WizardError};
pub use report::*;
pub use types::*;
pub use value::*;
