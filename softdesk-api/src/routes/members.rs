/// Project membership endpoints
///
/// Any contributor of a project (author or member) may list, add and
/// remove members; there is no per-object check.
///
/// - `GET /projects/:project_id/users` - List members
/// - `POST /projects/:project_id/users` - Add a member by `username` or `user_id`
/// - `DELETE /projects/:project_id/users/:user_id` - Remove a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    routes::{MemberPath, ProjectPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::{authorization::Action, middleware::AuthContext},
    models::user::{User, UserSummary},
};
use uuid::Uuid;

/// Identifies the user to add; `user_id` wins when both are given
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub username: Option<String>,
    pub user_id: Option<Uuid>,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<ProjectPath>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    path.chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::List)
        .await?;

    let users = state.store.list_members(path.project_id).await?;

    Ok(Json(users.iter().map(User::summary).collect()))
}

/// Adds a user to the project
///
/// # Endpoint
///
/// ```text
/// POST /projects/:project_id/users
///
/// { "username": "bob" }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "id": "uuid", "username": "bob" }
/// ```
///
/// # Errors
///
/// - `404`: No such user
/// - `409`: The user already is a member
/// - `422`: Neither `username` nor `user_id` given
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<ProjectPath>,
    body: Result<ApiJson<AddMemberRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    path.chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Create)
        .await?;

    let ApiJson(req) = body?;

    let user = match (req.user_id, req.username.as_deref()) {
        (Some(user_id), _) => state.store.find_user(user_id).await?,
        (None, Some(username)) if !username.is_empty() => {
            state.store.find_user_by_username(username).await?
        }
        _ => {
            return Err(ApiError::validation(
                "username",
                "Either username or user_id is required",
            ))
        }
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // The primary key settles concurrent adds: only one caller gets `true`
    if !state.store.add_member(path.project_id, user.id).await? {
        return Err(ApiError::Conflict(format!(
            "User {} is already a member of this project",
            user.username
        )));
    }

    tracing::info!(
        project_id = %path.project_id,
        member_id = %user.id,
        user_id = %auth.user_id,
        "Member added"
    );

    Ok((StatusCode::CREATED, Json(user.summary())))
}

/// Removes a member and returns the removed user
///
/// # Errors
///
/// - `404`: No such user, or the user is not a member
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<MemberPath>,
) -> ApiResult<Json<UserSummary>> {
    path.chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Delete)
        .await?;

    let user = state
        .store
        .find_user(path.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !state.store.remove_member(path.project_id, user.id).await? {
        return Err(ApiError::NotFound(
            "User is not a member of this project".to_string(),
        ));
    }

    tracing::info!(
        project_id = %path.project_id,
        member_id = %user.id,
        user_id = %auth.user_id,
        "Member removed"
    );

    Ok(Json(user.summary()))
}
