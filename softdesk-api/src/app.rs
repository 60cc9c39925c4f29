/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use softdesk_api::{app::{AppState, build_router}, config::Config};
/// use softdesk_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
///
/// let app = build_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use softdesk_shared::{auth::middleware::authenticate, store::Store};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health                                   (public)
/// ├── POST /signup                                   (public)
/// ├── POST /api/token                                (public)
/// ├── POST /api/token/refresh                        (public)
/// ├── POST /logout
/// └── /projects                                     GET|POST
///     └── /:project_id                               GET|PUT|PATCH|DELETE
///         ├── /users                                 GET|POST
///         │   └── /:user_id                          DELETE
///         └── /issues                                GET|POST
///             └── /:issue_id                         GET|PUT|PATCH|DELETE
///                 └── /comments                      GET|POST
///                     └── /:comment_id               GET|PUT|PATCH|DELETE
/// ```
///
/// Everything except the public routes requires a Bearer access token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/api/token", post(routes::auth::obtain_token))
        .route("/api/token/refresh", post(routes::auth::refresh_token));

    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:project_id/users",
            get(routes::members::list_members).post(routes::members::add_member),
        )
        .route(
            "/projects/:project_id/users/:user_id",
            delete(routes::members::remove_member),
        )
        .route(
            "/projects/:project_id/issues",
            get(routes::issues::list_issues).post(routes::issues::create_issue),
        )
        .route(
            "/projects/:project_id/issues/:issue_id",
            get(routes::issues::get_issue)
                .put(routes::issues::update_issue)
                .patch(routes::issues::update_issue)
                .delete(routes::issues::delete_issue),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/comments/:comment_id",
            get(routes::comments::get_comment)
                .put(routes::comments::update_comment)
                .patch(routes::comments::update_comment)
                .delete(routes::comments::delete_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer access token, rejects revoked tokens and injects
/// `AuthContext` into the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret(), state.store.as_ref()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
