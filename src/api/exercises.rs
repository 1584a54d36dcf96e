//! Exercise endpoints and point assignment.
//!
//! Exercises deliberately have no update or delete routes, and only
//! teachers may create them or assign points; both asymmetries with
//! lessons are inherited product behavior (see DESIGN.md).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    AssignPointsRequest, AssignPointsResponse, CreateExerciseRequest, DbPool, Exercise,
    ExerciseDetail, ExerciseDetailResponse, ExerciseListResponse, ExerciseMutationResponse,
    ExerciseSummary, Lesson, Role, StudentPoint, StudentPointWithStudent, User, UserResponse,
};
use crate::policy;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::lessons::SearchQuery;
use super::validation::{
    validate_long_text, validate_optional_text, validate_points, validate_short_text,
};

async fn load_teacher(pool: &DbPool, teacher_id: i64) -> Result<Option<UserResponse>, ApiError> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(teacher_id)
        .fetch_optional(pool)
        .await?
        .map(UserResponse::from))
}

async fn load_lesson(pool: &DbPool, lesson_id: i64) -> Result<Option<Lesson>, ApiError> {
    Ok(sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .fetch_optional(pool)
        .await?)
}

/// List exercises, role-scoped like lessons
///
/// GET /api/exercises
pub async fn list_exercises(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<ExerciseListResponse>, ApiError> {
    let (exercises, include_teacher) = if user.role == Role::Teacher {
        let own = sqlx::query_as::<_, Exercise>(
            "SELECT * FROM exercises WHERE teacher_id = ? ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;
        (own, false)
    } else {
        let all =
            sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY created_at DESC")
                .fetch_all(&state.db)
                .await?;
        (all, true)
    };

    let mut results = Vec::with_capacity(exercises.len());
    for exercise in exercises {
        let teacher = if include_teacher {
            load_teacher(&state.db, exercise.teacher_id).await?
        } else {
            None
        };
        let lesson = load_lesson(&state.db, exercise.lesson_id).await?;
        results.push(ExerciseSummary::new(exercise, teacher, lesson));
    }

    Ok(Json(ExerciseListResponse {
        status: "success",
        exercises: results,
    }))
}

/// Create an exercise under an existing lesson (teachers only)
///
/// POST /api/exercises
pub async fn create_exercise(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseMutationResponse>), ApiError> {
    if !policy::can_create_exercise(user.role) {
        return Err(ApiError::forbidden("Only teachers can create exercises"));
    }

    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_short_text(&req.title, "Title") {
        errors.add("title", e);
    }
    if let Err(e) = validate_long_text(&req.description, "Description") {
        errors.add("description", e);
    }
    if let Err(e) = validate_long_text(&req.content, "Content") {
        errors.add("content", e);
    }
    if let Err(e) = validate_short_text(&req.subject, "Subject") {
        errors.add("subject", e);
    }
    if let Err(e) = validate_short_text(&req.level, "Level") {
        errors.add("level", e);
    }
    if let Err(e) = validate_optional_text(&req.file_path, "file_path") {
        errors.add("file_path", e);
    }
    let points = match validate_points(req.points, "Points") {
        Ok(p) => p,
        Err(e) => {
            errors.add("points", e);
            0
        }
    };

    // The lesson reference is part of validation, reported with the rest
    let lesson_id = match req.lesson_id {
        None => {
            errors.add("lesson_id", "Lesson is required");
            0
        }
        Some(id) => {
            if load_lesson(&state.db, id).await?.is_none() {
                errors.add("lesson_id", "The selected lesson does not exist");
            }
            id
        }
    };

    errors.finish()?;

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO exercises (title, description, content, teacher_id, lesson_id, subject, level, file_path, points, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.content)
    .bind(user.id)
    .bind(lesson_id)
    .bind(&req.subject)
    .bind(&req.level)
    .bind(&req.file_path)
    .bind(points)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let exercise: Exercise = sqlx::query_as("SELECT * FROM exercises WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    tracing::info!(
        exercise_id = exercise.id,
        lesson_id,
        teacher_id = user.id,
        "Exercise created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ExerciseMutationResponse {
            status: "success",
            message: "Exercise created successfully".to_string(),
            exercise,
        }),
    ))
}

/// Fetch one exercise with owner, lesson, and every point record
///
/// GET /api/exercises/:id
pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(id): Path<i64>,
) -> Result<Json<ExerciseDetailResponse>, ApiError> {
    let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise not found"))?;

    let teacher = load_teacher(&state.db, exercise.teacher_id).await?;
    let lesson = load_lesson(&state.db, exercise.lesson_id).await?;

    let points = sqlx::query_as::<_, StudentPoint>(
        "SELECT * FROM student_points WHERE exercise_id = ? ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let mut student_points = Vec::with_capacity(points.len());
    for point in points {
        let student = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(point.student_id)
            .fetch_optional(&state.db)
            .await?
            .map(UserResponse::from);
        student_points.push(StudentPointWithStudent::new(point, student));
    }

    Ok(Json(ExerciseDetailResponse {
        status: "success",
        exercise: ExerciseDetail::new(exercise, teacher, lesson, student_points),
    }))
}

/// Search exercises by title/subject substring and exact level
///
/// GET /api/exercises/search/by
pub async fn search_exercises(
    State(state): State<Arc<AppState>>,
    _user: User,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ExerciseListResponse>, ApiError> {
    let exercises = sqlx::query_as::<_, Exercise>(
        "SELECT * FROM exercises
         WHERE (?1 IS NULL OR title LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR subject LIKE '%' || ?2 || '%')
           AND (?3 IS NULL OR level = ?3)
         ORDER BY created_at DESC",
    )
    .bind(&query.title)
    .bind(&query.subject)
    .bind(&query.level)
    .fetch_all(&state.db)
    .await?;

    let mut results = Vec::with_capacity(exercises.len());
    for exercise in exercises {
        let teacher = load_teacher(&state.db, exercise.teacher_id).await?;
        let lesson = load_lesson(&state.db, exercise.lesson_id).await?;
        results.push(ExerciseSummary::new(exercise, teacher, lesson));
    }

    Ok(Json(ExerciseListResponse {
        status: "success",
        exercises: results,
    }))
}

/// Record a grade for a student on an exercise (teachers only).
/// Every call inserts a new record; repeated grading is allowed and each
/// record counts as an independent submission.
///
/// POST /api/exercises/assign-points
pub async fn assign_points(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<AssignPointsRequest>,
) -> Result<(StatusCode, Json<AssignPointsResponse>), ApiError> {
    if !policy::can_assign_points(user.role) {
        return Err(ApiError::forbidden("Only teachers can assign points"));
    }

    let mut errors = ValidationErrorBuilder::new();

    let points_earned = match validate_points(req.points_earned, "Points earned") {
        Ok(p) => p,
        Err(e) => {
            errors.add("points_earned", e);
            0
        }
    };

    // The student id must reference an existing user; its role is
    // deliberately not checked (any user id can carry point records)
    let student_id = match req.student_id {
        None => {
            errors.add("student_id", "Student is required");
            0
        }
        Some(id) => {
            let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
                .bind(id)
                .fetch_one(&state.db)
                .await?;
            if exists.0 == 0 {
                errors.add("student_id", "The selected student does not exist");
            }
            id
        }
    };

    let exercise_id = match req.exercise_id {
        None => {
            errors.add("exercise_id", "Exercise is required");
            0
        }
        Some(id) => {
            let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exercises WHERE id = ?")
                .bind(id)
                .fetch_one(&state.db)
                .await?;
            if exists.0 == 0 {
                errors.add("exercise_id", "The selected exercise does not exist");
            }
            id
        }
    };

    errors.finish()?;

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO student_points (student_id, exercise_id, points_earned, teacher_notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(exercise_id)
    .bind(points_earned)
    .bind(&req.teacher_notes)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let student_point: StudentPoint = sqlx::query_as("SELECT * FROM student_points WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    tracing::info!(
        student_id,
        exercise_id,
        points_earned,
        teacher_id = user.id,
        "Points assigned"
    );

    Ok((
        StatusCode::CREATED,
        Json(AssignPointsResponse {
            status: "success",
            message: "Points assigned successfully".to_string(),
            student_point,
        }),
    ))
}
