//! Exercise models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lesson::Lesson;
use super::student_point::StudentPointWithStudent;
use super::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub teacher_id: i64,
    pub lesson_id: i64,
    pub subject: String,
    pub level: String,
    pub file_path: Option<String>,
    pub points: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Exercise with owner and lesson attached, for list/search views.
#[derive(Debug, Serialize)]
pub struct ExerciseSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub teacher_id: i64,
    pub lesson_id: i64,
    pub subject: String,
    pub level: String,
    pub file_path: Option<String>,
    pub points: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<UserResponse>,
    pub lesson: Option<Lesson>,
}

impl ExerciseSummary {
    pub fn new(exercise: Exercise, teacher: Option<UserResponse>, lesson: Option<Lesson>) -> Self {
        Self {
            id: exercise.id,
            title: exercise.title,
            description: exercise.description,
            content: exercise.content,
            teacher_id: exercise.teacher_id,
            lesson_id: exercise.lesson_id,
            subject: exercise.subject,
            level: exercise.level,
            file_path: exercise.file_path,
            points: exercise.points,
            created_at: exercise.created_at,
            updated_at: exercise.updated_at,
            teacher,
            lesson,
        }
    }
}

/// Detail view: owner, lesson, and every point record with its student.
#[derive(Debug, Serialize)]
pub struct ExerciseDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub teacher_id: i64,
    pub lesson_id: i64,
    pub subject: String,
    pub level: String,
    pub file_path: Option<String>,
    pub points: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<UserResponse>,
    pub lesson: Option<Lesson>,
    pub student_points: Vec<StudentPointWithStudent>,
}

impl ExerciseDetail {
    pub fn new(
        exercise: Exercise,
        teacher: Option<UserResponse>,
        lesson: Option<Lesson>,
        student_points: Vec<StudentPointWithStudent>,
    ) -> Self {
        Self {
            id: exercise.id,
            title: exercise.title,
            description: exercise.description,
            content: exercise.content,
            teacher_id: exercise.teacher_id,
            lesson_id: exercise.lesson_id,
            subject: exercise.subject,
            level: exercise.level,
            file_path: exercise.file_path,
            points: exercise.points,
            created_at: exercise.created_at,
            updated_at: exercise.updated_at,
            teacher,
            lesson,
            student_points,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub lesson_id: Option<i64>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
    pub points: Option<i64>,
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseListResponse {
    pub status: &'static str,
    pub exercises: Vec<ExerciseSummary>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseDetailResponse {
    pub status: &'static str,
    pub exercise: ExerciseDetail,
}

#[derive(Debug, Serialize)]
pub struct ExerciseMutationResponse {
    pub status: &'static str,
    pub message: String,
    pub exercise: Exercise,
}
