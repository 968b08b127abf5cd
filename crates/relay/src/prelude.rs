pub use crate::args::{Args, Command, Globals};
pub use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;
