/// Project endpoints
///
/// - `GET /projects` - Projects the caller authored or is a member of
/// - `POST /projects` - Create a project, authored by the caller
/// - `GET /projects/:project_id` - Retrieve (contributors)
/// - `PUT|PATCH /projects/:project_id` - Update (author only)
/// - `DELETE /projects/:project_id` - Delete with its issues and comments (author only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    routes::ProjectPath,
};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use softdesk_shared::{
    auth::{authorization::Action, middleware::AuthContext},
    models::{
        project::{CreateProject, Project, ProjectType, UpdateProject},
        user::UserSummary,
    },
    scope::ParentChain,
    store::Store,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

/// Fields left out are not changed
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,
}

/// Project representation with its members embedded
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    #[serde(rename = "type")]
    pub project_type: ProjectType,

    pub author_user_id: Uuid,
    pub users: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}

impl ProjectResponse {
    fn new(project: Project, users: Vec<UserSummary>) -> Self {
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            project_type: project.project_type,
            author_user_id: project.author_user_id,
            users,
            created_at: project.created_at,
        }
    }

    async fn load(store: &dyn Store, project: Project) -> ApiResult<Self> {
        let users = store
            .list_members(project.id)
            .await?
            .iter()
            .map(|user| user.summary())
            .collect();

        Ok(Self::new(project, users))
    }
}

/// Lists every project the caller authored or is a member of
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    ParentChain::Root
        .resolve(state.store.as_ref(), auth.user_id, Action::List)
        .await?;

    let projects = state.store.list_projects_for_user(auth.user_id).await?;

    let mut response = Vec::with_capacity(projects.len());
    for project in projects {
        response.push(ProjectResponse::load(state.store.as_ref(), project).await?);
    }

    Ok(Json(response))
}

/// Creates a project authored by the caller
///
/// # Endpoint
///
/// ```text
/// POST /projects
///
/// { "title": "Website", "description": "Public site", "type": "BACKEND" }
/// ```
///
/// # Errors
///
/// - `422`: Invalid title, description or type
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    req.validate()?;

    ParentChain::Root
        .resolve(state.store.as_ref(), auth.user_id, Action::Create)
        .await?;

    let project = state
        .store
        .create_project(CreateProject {
            title: req.title,
            description: req.description,
            project_type: req.project_type,
            author_user_id: auth.user_id,
        })
        .await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %auth.user_id,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(project, Vec::new())),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<ProjectPath>,
) -> ApiResult<Json<ProjectResponse>> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Retrieve)
        .await?;

    let project = scope.require_project()?;
    scope.authorize_object(auth.user_id, Action::Retrieve, project)?;

    Ok(Json(
        ProjectResponse::load(state.store.as_ref(), project.clone()).await?,
    ))
}

/// Updates a project (PUT and PATCH both merge the given fields)
///
/// # Errors
///
/// - `403`: Caller is not a contributor, or not the author
/// - `404`: Project does not exist
/// - `422`: Invalid fields
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    ApiPath(path): ApiPath<ProjectPath>,
    body: Result<ApiJson<UpdateProjectRequest>, ApiError>,
) -> ApiResult<Json<ProjectResponse>> {
    let action = Action::from_method(&method, true).unwrap_or(Action::Update);

    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, action)
        .await?;

    scope.authorize_object(auth.user_id, action, scope.require_project()?)?;

    let ApiJson(req) = body?;
    req.validate()?;

    let project = state
        .store
        .update_project(
            path.project_id,
            UpdateProject {
                title: req.title,
                description: req.description,
                project_type: req.project_type,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "Project updated");

    Ok(Json(ProjectResponse::load(state.store.as_ref(), project).await?))
}

/// Deletes a project together with its memberships, issues and comments
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(path): ApiPath<ProjectPath>,
) -> ApiResult<StatusCode> {
    let scope = path
        .chain()
        .resolve(state.store.as_ref(), auth.user_id, Action::Delete)
        .await?;

    scope.authorize_object(auth.user_id, Action::Delete, scope.require_project()?)?;

    state.store.delete_project(path.project_id).await?;

    tracing::info!(project_id = %path.project_id, user_id = %auth.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
