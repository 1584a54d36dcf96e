//! Lesson models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::exercise::Exercise;
use super::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub teacher_id: i64,
    pub subject: String,
    pub level: String,
    pub file_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lesson with its owner and exercises attached, for list/detail views.
/// The owner is omitted when the caller is the owner (teacher-scoped list).
#[derive(Debug, Serialize)]
pub struct LessonDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub teacher_id: i64,
    pub subject: String,
    pub level: String,
    pub file_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<UserResponse>,
    pub exercises: Vec<Exercise>,
}

impl LessonDetail {
    pub fn new(lesson: Lesson, teacher: Option<UserResponse>, exercises: Vec<Exercise>) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            description: lesson.description,
            content: lesson.content,
            teacher_id: lesson.teacher_id,
            subject: lesson.subject,
            level: lesson.level,
            file_url: lesson.file_url,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
            teacher,
            exercises,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
    pub file_url: Option<String>,
    /// Honored only for admin callers; teachers always own what they create.
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonListResponse {
    pub status: &'static str,
    pub lessons: Vec<LessonDetail>,
}

#[derive(Debug, Serialize)]
pub struct LessonDetailResponse {
    pub status: &'static str,
    pub lesson: LessonDetail,
}

/// Create/update envelope; carries the bare row without relations.
#[derive(Debug, Serialize)]
pub struct LessonMutationResponse {
    pub status: &'static str,
    pub message: String,
    pub lesson: Lesson,
}
