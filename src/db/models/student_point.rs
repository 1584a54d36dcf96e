//! Student point (grade) models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentPoint {
    pub id: i64,
    pub student_id: i64,
    pub exercise_id: i64,
    pub points_earned: i64,
    pub teacher_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct StudentPointWithStudent {
    pub id: i64,
    pub student_id: i64,
    pub exercise_id: i64,
    pub points_earned: i64,
    pub teacher_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub student: Option<UserResponse>,
}

impl StudentPointWithStudent {
    pub fn new(point: StudentPoint, student: Option<UserResponse>) -> Self {
        Self {
            id: point.id,
            student_id: point.student_id,
            exercise_id: point.exercise_id,
            points_earned: point.points_earned,
            teacher_notes: point.teacher_notes,
            created_at: point.created_at,
            updated_at: point.updated_at,
            student,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignPointsRequest {
    pub student_id: Option<i64>,
    pub exercise_id: Option<i64>,
    pub points_earned: Option<i64>,
    pub teacher_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignPointsResponse {
    pub status: &'static str,
    pub message: String,
    pub student_point: StudentPoint,
}
