pub mod export;
pub mod json;
