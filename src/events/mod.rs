pub mod errors;
pub mod ready;
