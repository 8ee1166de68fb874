pub mod etl;
pub mod stage;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
