pub mod error;
pub mod hal;
pub mod response;

pub use error::AppError;
