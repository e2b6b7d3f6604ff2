pub mod dtos;
pub mod handlers;

pub use dtos::{AnalyzeRequest, AnalyzeResponse, ErrorResponse};
pub use handlers::analyze;
