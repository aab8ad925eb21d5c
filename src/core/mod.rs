pub mod aggregate;
pub mod crawler;
pub mod digest;
pub mod engine;
pub mod grade_file;
pub mod parser;
pub mod summary;

pub use crate::domain::model::{Points, Roster, Student, Topic};
pub use crate::domain::ports::Dispatcher;
pub use crate::utils::error::Result;
