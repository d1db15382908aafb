pub mod duty;
pub mod engine;
pub mod identifier;
pub mod interval;
pub mod seating;

pub use crate::domain::model::{Table, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
