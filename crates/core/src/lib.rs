#![forbid(unsafe_code)]

pub mod error;
pub mod leitner;
pub mod model;
pub mod time;

pub use error::Error;
pub use leitner::{Difficulty, LeitnerBox, LeitnerError};
pub use time::Clock;
