pub mod etl;
pub mod pipeline;
pub mod reader;
pub mod transform;
pub mod writer;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
