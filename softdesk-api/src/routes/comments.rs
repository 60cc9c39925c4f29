/// Comment endpoints, scoped to an issue of a project
///
/// - `GET /projects/:project_id/issues/:issue_id/comments`
/// - `POST /projects/:project_id/issues/:issue_id/comments`
/// - `GET|PUT|PATCH|DELETE /projects/:project_id/issues/:issue_id/comments/:comment_id`
///
/// Contributors of the project may read and post; only a comment's author
/// may change or delete it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    routes::{CommentPath, IssuePath},
};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::{authorization::Action, middleware::AuthContext},
    models::comment::{Comment, CreateComment, UpdateComment},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Description must be 1 to 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Description must be 1 to 2000 characters"))]
    pub description: Option<String>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<IssuePath>,
) -> ApiResult<Json<Vec<Comment>>> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::List)
        .await?;

    let comments = state.store.list_comments(scope.require_issue()?.id).await?;

    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<IssuePath>,
    body: Result<ApiJson<CreateCommentRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Create)
        .await?;

    let ApiJson(req) = body?;
    req.validate()?;

    let comment = state
        .store
        .create_comment(CreateComment {
            description: req.description,
            issue_id: scope.require_issue()?.id,
            author_user_id: auth.user_id,
        })
        .await?;

    tracing::info!(
        comment_id = %comment.id,
        issue_id = %comment.issue_id,
        user_id = %auth.user_id,
        "Comment created"
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<CommentPath>,
) -> ApiResult<Json<Comment>> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Retrieve)
        .await?;

    let comment = scope
        .find_comment(state.store.as_ref(), path.comment_id)
        .await?;
    scope.authorize_object(auth.user_id, Action::Retrieve, &comment)?;

    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    ApiPath(path): ApiPath<CommentPath>,
    body: Result<ApiJson<UpdateCommentRequest>, ApiError>,
) -> ApiResult<Json<Comment>> {
    let action = Action::from_method(&method, true).unwrap_or(Action::Update);

    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, action)
        .await?;

    let comment = scope
        .find_comment(state.store.as_ref(), path.comment_id)
        .await?;
    scope.authorize_object(auth.user_id, action, &comment)?;

    let ApiJson(req) = body?;
    req.validate()?;

    let updated = state
        .store
        .update_comment(
            comment.id,
            UpdateComment {
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    tracing::info!(comment_id = %updated.id, user_id = %auth.user_id, "Comment updated");

    Ok(Json(updated))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<CommentPath>,
) -> ApiResult<StatusCode> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Delete)
        .await?;

    let comment = scope
        .find_comment(state.store.as_ref(), path.comment_id)
        .await?;
    scope.authorize_object(auth.user_id, Action::Delete, &comment)?;

    state.store.delete_comment(comment.id).await?;

    tracing::info!(comment_id = %comment.id, user_id = %auth.user_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
