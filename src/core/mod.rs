pub mod error;
pub mod value;

pub use error::{BatchError, Result, WidgetError};
pub use value::Value;
