//! Servlet configuration schema and structural validation.

mod types;
mod validation;


pub use types::{DeviceMode, DeviceSpec, ExecSpec, NodeSpec, ServletSpec};
pub use validation::validate;
