//! Lesson CRUD and search endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{
    CreateLessonRequest, DbPool, Exercise, Lesson, LessonDetail, LessonDetailResponse,
    LessonListResponse, LessonMutationResponse, MessageResponse, Role, UpdateLessonRequest, User,
    UserResponse,
};
use crate::policy;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_long_text, validate_optional_text, validate_short_text};

/// Query parameters for the search endpoints. Absent filters are no-ops;
/// present filters compose with AND.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
}

fn validate_create_request(req: &CreateLessonRequest) -> Result<(), ApiError> {
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
    if let Err(e) = validate_optional_text(&req.file_url, "file_url") {
        errors.add("file_url", e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateLessonRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.title {
        if let Err(e) = validate_short_text(title, "Title") {
            errors.add("title", e);
        }
    }
    if let Some(ref description) = req.description {
        if let Err(e) = validate_long_text(description, "Description") {
            errors.add("description", e);
        }
    }
    if let Some(ref content) = req.content {
        if let Err(e) = validate_long_text(content, "Content") {
            errors.add("content", e);
        }
    }
    if let Some(ref subject) = req.subject {
        if let Err(e) = validate_short_text(subject, "Subject") {
            errors.add("subject", e);
        }
    }
    if let Some(ref level) = req.level {
        if let Err(e) = validate_short_text(level, "Level") {
            errors.add("level", e);
        }
    }
    if let Err(e) = validate_optional_text(&req.file_url, "file_url") {
        errors.add("file_url", e);
    }

    errors.finish()
}

/// Attach owner and exercises to a lesson row
async fn attach_relations(
    pool: &DbPool,
    lesson: Lesson,
    include_teacher: bool,
) -> Result<LessonDetail, ApiError> {
    let teacher = if include_teacher {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(lesson.teacher_id)
            .fetch_optional(pool)
            .await?
            .map(UserResponse::from)
    } else {
        None
    };

    let exercises = sqlx::query_as::<_, Exercise>(
        "SELECT * FROM exercises WHERE lesson_id = ? ORDER BY created_at",
    )
    .bind(lesson.id)
    .fetch_all(pool)
    .await?;

    Ok(LessonDetail::new(lesson, teacher, exercises))
}

/// List lessons, role-scoped: teachers see their own, everyone else sees all
///
/// GET /api/lessons
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<LessonListResponse>, ApiError> {
    let (lessons, include_teacher) = if user.role == Role::Teacher {
        let own = sqlx::query_as::<_, Lesson>(
            "SELECT * FROM lessons WHERE teacher_id = ? ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;
        (own, false)
    } else {
        let all = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
        (all, true)
    };

    let mut results = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        results.push(attach_relations(&state.db, lesson, include_teacher).await?);
    }

    Ok(Json(LessonListResponse {
        status: "success",
        lessons: results,
    }))
}

/// Create a lesson (teachers and admins)
///
/// POST /api/lessons
pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<LessonMutationResponse>), ApiError> {
    if !policy::can_create_lesson(user.role) {
        return Err(ApiError::forbidden(
            "Only teachers and admins can create lessons",
        ));
    }

    validate_create_request(&req)?;

    // Teachers always own what they create; admins may create on behalf of
    // an explicit teacher_id (no role check on the target, see DESIGN.md)
    let owner_id = match user.role {
        Role::Admin => req.teacher_id.unwrap_or(user.id),
        _ => user.id,
    };

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO lessons (title, description, content, teacher_id, subject, level, file_url, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.content)
    .bind(owner_id)
    .bind(&req.subject)
    .bind(&req.level)
    .bind(&req.file_url)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let lesson: Lesson = sqlx::query_as("SELECT * FROM lessons WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    tracing::info!(lesson_id = lesson.id, teacher_id = owner_id, "Lesson created");

    Ok((
        StatusCode::CREATED,
        Json(LessonMutationResponse {
            status: "success",
            message: "Lesson created successfully".to_string(),
            lesson,
        }),
    ))
}

/// Fetch a single lesson with owner and exercises
///
/// GET /api/lessons/:id
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(id): Path<i64>,
) -> Result<Json<LessonDetailResponse>, ApiError> {
    let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;

    Ok(Json(LessonDetailResponse {
        status: "success",
        lesson: attach_relations(&state.db, lesson, true).await?,
    }))
}

/// Update a lesson (owner or admin). Only supplied fields are applied.
///
/// PUT /api/lessons/:id
pub async fn update_lesson(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<Json<LessonMutationResponse>, ApiError> {
    // Existence before authorization; a missing lesson is 404 for everyone
    let existing = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;

    if !policy::can_mutate(user.id, user.role, existing.teacher_id) {
        return Err(ApiError::forbidden("Unauthorized to update this lesson"));
    }

    validate_update_request(&req)?;

    let title = req.title.unwrap_or(existing.title);
    let description = req.description.unwrap_or(existing.description);
    let content = req.content.unwrap_or(existing.content);
    let subject = req.subject.unwrap_or(existing.subject);
    let level = req.level.unwrap_or(existing.level);
    let file_url = req.file_url.or(existing.file_url);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE lessons SET title = ?, description = ?, content = ?, subject = ?, level = ?, file_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(&content)
    .bind(&subject)
    .bind(&level)
    .bind(&file_url)
    .bind(&now)
    .bind(id)
    .execute(&state.db)
    .await?;

    let lesson: Lesson = sqlx::query_as("SELECT * FROM lessons WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(LessonMutationResponse {
        status: "success",
        message: "Lesson updated successfully".to_string(),
        lesson,
    }))
}

/// Delete a lesson (owner or admin); removal is physical
///
/// DELETE /api/lessons/:id
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let existing = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;

    if !policy::can_mutate(user.id, user.role, existing.teacher_id) {
        return Err(ApiError::forbidden("Unauthorized to delete this lesson"));
    }

    sqlx::query("DELETE FROM lessons WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(lesson_id = id, actor = user.id, "Lesson deleted");

    Ok(Json(MessageResponse::success("Lesson deleted successfully")))
}

/// Search lessons by title/subject substring and exact level
///
/// GET /api/lessons/search/by
pub async fn search_lessons(
    State(state): State<Arc<AppState>>,
    _user: User,
    Query(query): Query<SearchQuery>,
) -> Result<Json<LessonListResponse>, ApiError> {
    let lessons = sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
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

    let mut results = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        results.push(attach_relations(&state.db, lesson, true).await?);
    }

    Ok(Json(LessonListResponse {
        status: "success",
        lessons: results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{seed_lesson, seed_user, test_state};

    fn lesson_request(title: &str, subject: &str, level: &str) -> CreateLessonRequest {
        CreateLessonRequest {
            title: title.into(),
            description: "A lesson description".into(),
            content: "Lesson content body".into(),
            subject: subject.into(),
            level: level.into(),
            file_url: None,
            teacher_id: None,
        }
    }

    #[tokio::test]
    async fn students_cannot_create_lessons() {
        let state = test_state().await;
        let student = seed_user(&state.db, "Student", "s@school.test", Role::Student).await;

        let err = create_lesson(
            State(state),
            student,
            Json(lesson_request("Algebra", "Math", "beginner")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn teacher_owns_created_lesson() {
        let state = test_state().await;
        let teacher = seed_user(&state.db, "Teacher", "t@school.test", Role::Teacher).await;

        let (status, body) = create_lesson(
            State(state),
            teacher.clone(),
            Json(lesson_request("Algebra", "Math", "beginner")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.lesson.teacher_id, teacher.id);
    }

    #[tokio::test]
    async fn teacher_cannot_create_on_behalf_of_another() {
        let state = test_state().await;
        let teacher = seed_user(&state.db, "Teacher", "t@school.test", Role::Teacher).await;
        let other = seed_user(&state.db, "Other", "o@school.test", Role::Teacher).await;

        let mut req = lesson_request("Algebra", "Math", "beginner");
        req.teacher_id = Some(other.id);
        let (_, body) = create_lesson(State(state), teacher.clone(), Json(req))
            .await
            .unwrap();
        // The explicit teacher_id is ignored for non-admin callers
        assert_eq!(body.lesson.teacher_id, teacher.id);
    }

    #[tokio::test]
    async fn admin_can_assign_an_explicit_owner() {
        let state = test_state().await;
        let admin = seed_user(&state.db, "Admin", "a@school.test", Role::Admin).await;
        let teacher = seed_user(&state.db, "Teacher", "t@school.test", Role::Teacher).await;

        let mut req = lesson_request("Geometry", "Math", "intermediate");
        req.teacher_id = Some(teacher.id);
        let (_, body) = create_lesson(State(state), admin, Json(req)).await.unwrap();
        assert_eq!(body.lesson.teacher_id, teacher.id);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let state = test_state().await;
        let teacher = seed_user(&state.db, "Teacher", "t@school.test", Role::Teacher).await;

        let err = create_lesson(
            State(state),
            teacher,
            Json(CreateLessonRequest {
                title: "".into(),
                description: "".into(),
                content: "".into(),
                subject: "".into(),
                level: "".into(),
                file_url: None,
                teacher_id: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let fields = err.field_errors().unwrap();
        for field in ["title", "description", "content", "subject", "level"] {
            assert!(fields.contains_key(field), "missing error for {}", field);
        }
    }

    #[tokio::test]
    async fn ownership_gates_update_and_delete() {
        let state = test_state().await;
        let owner = seed_user(&state.db, "Owner", "owner@school.test", Role::Teacher).await;
        let rival = seed_user(&state.db, "Rival", "rival@school.test", Role::Teacher).await;
        let admin = seed_user(&state.db, "Admin", "admin@school.test", Role::Admin).await;
        let lesson = seed_lesson(&state.db, owner.id, "Algebra", "Math", "beginner").await;

        // Another teacher is rejected
        let err = update_lesson(
            State(state.clone()),
            rival.clone(),
            Path(lesson.id),
            Json(UpdateLessonRequest {
                title: Some("Hijacked".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = delete_lesson(State(state.clone()), rival, Path(lesson.id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        // The owner succeeds and only supplied fields change
        let body = update_lesson(
            State(state.clone()),
            owner,
            Path(lesson.id),
            Json(UpdateLessonRequest {
                title: Some("Algebra II".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.lesson.title, "Algebra II");
        assert_eq!(body.lesson.subject, "Math");

        // Admin may delete anything
        delete_lesson(State(state.clone()), admin, Path(lesson.id))
            .await
            .unwrap();
        let gone = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
            .bind(lesson.id)
            .fetch_optional(&state.db)
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn missing_lesson_is_404_before_authorization() {
        let state = test_state().await;
        let student = seed_user(&state.db, "Student", "s@school.test", Role::Student).await;

        // A student has no mutation rights at all, but an unknown id still
        // reports 404, never 403
        let err = delete_lesson(State(state), student, Path(9999)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_is_role_scoped() {
        let state = test_state().await;
        let teacher_a = seed_user(&state.db, "A", "a@school.test", Role::Teacher).await;
        let teacher_b = seed_user(&state.db, "B", "b@school.test", Role::Teacher).await;
        let student = seed_user(&state.db, "S", "s@school.test", Role::Student).await;
        seed_lesson(&state.db, teacher_a.id, "Algebra", "Math", "beginner").await;
        seed_lesson(&state.db, teacher_b.id, "Grammar", "English", "beginner").await;

        let own = list_lessons(State(state.clone()), teacher_a.clone()).await.unwrap();
        assert_eq!(own.lessons.len(), 1);
        assert_eq!(own.lessons[0].teacher_id, teacher_a.id);
        assert!(own.lessons[0].teacher.is_none());

        let all = list_lessons(State(state), student).await.unwrap();
        assert_eq!(all.lessons.len(), 2);
        assert!(all.lessons.iter().all(|l| l.teacher.is_some()));
    }

    #[tokio::test]
    async fn search_filters_compose_with_and() {
        let state = test_state().await;
        let teacher = seed_user(&state.db, "T", "t@school.test", Role::Teacher).await;
        seed_lesson(&state.db, teacher.id, "Algebra Basics", "Math", "beginner").await;
        seed_lesson(&state.db, teacher.id, "Advanced Algebra", "Math", "advanced").await;
        seed_lesson(&state.db, teacher.id, "Poetry", "English", "beginner").await;

        // No filters: everything
        let all = search_lessons(
            State(state.clone()),
            teacher.clone(),
            Query(SearchQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(all.lessons.len(), 3);

        // Title substring
        let algebra = search_lessons(
            State(state.clone()),
            teacher.clone(),
            Query(SearchQuery {
                title: Some("Algebra".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(algebra.lessons.len(), 2);

        // Level is an exact match, never a substring
        let beginner = search_lessons(
            State(state.clone()),
            teacher.clone(),
            Query(SearchQuery {
                level: Some("beginner".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(beginner.lessons.len(), 2);

        let partial_level = search_lessons(
            State(state.clone()),
            teacher.clone(),
            Query(SearchQuery {
                level: Some("begin".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert!(partial_level.lessons.is_empty());

        // AND composition
        let narrowed = search_lessons(
            State(state),
            teacher,
            Query(SearchQuery {
                title: Some("Algebra".into()),
                subject: Some("Math".into()),
                level: Some("advanced".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(narrowed.lessons.len(), 1);
        assert_eq!(narrowed.lessons[0].title, "Advanced Algebra");
    }
}
