mod exercise;
mod lesson;
mod student_point;
mod user;

pub use exercise::*;
pub use lesson::*;
pub use student_point::*;
pub use user::*;

use serde::Serialize;

/// Minimal success body for delete/logout style endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}
