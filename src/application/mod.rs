//! Application layer wiring DTOs and services for askdocs.

pub mod dtos;
pub mod services;

pub use dtos::{AnswerResponse, ErrorResponse, HealthStatusResponse, QuestionRequest};
pub use services::AnswerService;
