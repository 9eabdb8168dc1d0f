//! Web UI Handlers
//!
//! Server-rendered pages for sources and their infos:
//! - `GET /` - sources with their open info counts
//! - `GET /jsonGraph` - the same listing as JSON, for the chart
//! - `/source/...` - view, create, update and delete sources
//! - `/source/{sid}/info/...` - view, create, update and delete infos
//!
//! Every handler that touches the store checks out one pooled connection and
//! holds it until it returns. Writes answer with a `303 See Other` redirect,
//! or with the form again and `422` when validation fails.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use sqlx::SqliteConnection;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    config::Config,
    database::{Database, DatabaseError, infos, sources},
    error::{AppError, parse_id},
    forms::{InfoForm, SourceForm},
    models::{Info, InfoSummary, Source, SourceSummary},
};

type HandlerResult = Result<Response, AppError>;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

// Template rendering helper
struct HtmlTemplate<T> {
    status: StatusCode,
    page: T,
}

impl<T: Template> HtmlTemplate<T> {
    fn ok(page: T) -> Self {
        Self {
            status: StatusCode::OK,
            page,
        }
    }

    fn unprocessable(page: T) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            page,
        }
    }
}

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.page.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(err) => AppError::Template(err).into_response(),
        }
    }
}

// Templates
#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    sources: Vec<SourceSummary>,
    sources_json: String,
}

#[derive(Template)]
#[template(path = "source_view.html")]
struct SourceViewTemplate {
    source: Source,
    infos: Vec<InfoSummary>,
}

#[derive(Template)]
#[template(path = "source_create.html")]
struct SourceCreateTemplate {
    form: SourceForm,
}

#[derive(Template)]
#[template(path = "source_update.html")]
struct SourceUpdateTemplate {
    source_id: i64,
    form: SourceForm,
}

#[derive(Template)]
#[template(path = "info_view.html")]
struct InfoViewTemplate {
    source: Source,
    info: Info,
}

#[derive(Template)]
#[template(path = "info_create.html")]
struct InfoCreateTemplate {
    source: Source,
    form: InfoForm,
}

#[derive(Template)]
#[template(path = "info_update.html")]
struct InfoUpdateTemplate {
    source: Source,
    info_id: i64,
    form: InfoForm,
}

/// Load an info and make sure it belongs to the source named in the URL.
async fn owned_info(conn: &mut SqliteConnection, source_id: i64, id: i64) -> Result<Info, AppError> {
    let info = infos::get(conn, id).await?;
    if info.source_id != source_id {
        return Err(DatabaseError::NotFound(format!(
            "Info {} does not belong to source {}",
            id, source_id
        ))
        .into());
    }
    Ok(info)
}

// ========== Home ==========

async fn home(State(state): State<AppState>) -> HandlerResult {
    let mut conn = state.db.connection().await?;
    let sources = sources::list_with_counts(&mut conn).await?;

    let sources_json = serde_json::to_string(&sources)?;

    Ok(HtmlTemplate::ok(HomeTemplate {
        sources,
        sources_json,
    })
    .into_response())
}

/// The home listing as `[{"name": ..., "curatifs": ...}]`.
async fn json_graph(State(state): State<AppState>) -> Result<Json<Vec<SourceSummary>>, AppError> {
    let mut conn = state.db.connection().await?;
    let sources = sources::list_with_counts(&mut conn).await?;
    Ok(Json(sources))
}

// ========== Sources ==========

async fn source_view(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let source = sources::get(&mut conn, id).await?;
    let infos = infos::list_by_source(&mut conn, id).await?;

    Ok(HtmlTemplate::ok(SourceViewTemplate { source, infos }).into_response())
}

async fn source_create_form() -> impl IntoResponse {
    HtmlTemplate::ok(SourceCreateTemplate {
        form: SourceForm::default(),
    })
}

async fn source_create(State(state): State<AppState>, Form(form): Form<SourceForm>) -> HandlerResult {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(form) => return Ok(HtmlTemplate::unprocessable(SourceCreateTemplate { form }).into_response()),
    };

    let mut conn = state.db.connection().await?;
    let id = sources::insert(&mut conn, &fields).await?;

    tracing::info!(source_id = id, name = fields.name.as_str(), "Source created");
    Ok(Redirect::to(&format!("/source/view/{}", id)).into_response())
}

async fn source_delete(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    sources::delete(&mut conn, id).await?;

    tracing::info!(source_id = id, "Source deleted");
    Ok(Redirect::to("/").into_response())
}

async fn source_update_form(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let source = sources::get(&mut conn, id).await?;

    Ok(HtmlTemplate::ok(SourceUpdateTemplate {
        source_id: source.id,
        form: SourceForm::from(&source),
    })
    .into_response())
}

async fn source_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SourceForm>,
) -> HandlerResult {
    let id = parse_id(&id)?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(form) => {
            return Ok(HtmlTemplate::unprocessable(SourceUpdateTemplate { source_id: id, form }).into_response());
        }
    };

    let mut conn = state.db.connection().await?;
    sources::update(&mut conn, id, &fields).await?;

    tracing::info!(source_id = id, name = fields.name.as_str(), "Source updated");
    Ok(Redirect::to(&format!("/source/view/{}", id)).into_response())
}

// ========== Infos ==========

async fn info_view(
    State(state): State<AppState>,
    Path((sid, id)): Path<(String, String)>,
) -> HandlerResult {
    let source_id = parse_id(&sid)?;
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let info = owned_info(&mut conn, source_id, id).await?;
    let source = sources::get(&mut conn, source_id).await?;

    Ok(HtmlTemplate::ok(InfoViewTemplate { source, info }).into_response())
}

async fn info_create_form(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let source_id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let source = sources::get(&mut conn, source_id).await?;

    Ok(HtmlTemplate::ok(InfoCreateTemplate {
        source,
        form: InfoForm::default(),
    })
    .into_response())
}

async fn info_create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<InfoForm>,
) -> HandlerResult {
    let source_id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let source = sources::get(&mut conn, source_id).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(form) => return Ok(HtmlTemplate::unprocessable(InfoCreateTemplate { source, form }).into_response()),
    };

    let info_id = infos::insert(&mut conn, source_id, &fields).await?;

    tracing::info!(source_id, info_id, "Info created");
    Ok(Redirect::to(&format!("/source/view/{}", source_id)).into_response())
}

async fn info_delete(
    State(state): State<AppState>,
    Path((sid, id)): Path<(String, String)>,
) -> HandlerResult {
    let source_id = parse_id(&sid)?;
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    infos::delete(&mut conn, source_id, id).await?;

    tracing::info!(source_id, info_id = id, "Info deleted");
    Ok(Redirect::to(&format!("/source/view/{}", source_id)).into_response())
}

async fn info_update_form(
    State(state): State<AppState>,
    Path((sid, id)): Path<(String, String)>,
) -> HandlerResult {
    let source_id = parse_id(&sid)?;
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    let info = owned_info(&mut conn, source_id, id).await?;
    let source = sources::get(&mut conn, source_id).await?;

    Ok(HtmlTemplate::ok(InfoUpdateTemplate {
        source,
        info_id: info.id,
        form: InfoForm::from(&info),
    })
    .into_response())
}

async fn info_update(
    State(state): State<AppState>,
    Path((sid, id)): Path<(String, String)>,
    Form(form): Form<InfoForm>,
) -> HandlerResult {
    let source_id = parse_id(&sid)?;
    let id = parse_id(&id)?;

    let mut conn = state.db.connection().await?;
    owned_info(&mut conn, source_id, id).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(form) => {
            let source = sources::get(&mut conn, source_id).await?;
            return Ok(HtmlTemplate::unprocessable(InfoUpdateTemplate {
                source,
                info_id: id,
                form,
            })
            .into_response());
        }
    };

    infos::update(&mut conn, id, &fields).await?;

    tracing::info!(source_id, info_id = id, "Info updated");
    Ok(Redirect::to(&format!("/source/{}/info/view/{}", source_id, id)).into_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/jsonGraph", get(json_graph))
        .route("/source/view/{id}", get(source_view))
        .route("/source/create", get(source_create_form).post(source_create))
        .route("/source/delete/{id}", post(source_delete))
        .route("/source/update/{id}", get(source_update_form).post(source_update))
        .route("/source/{sid}/info/view/{id}", get(info_view))
        .route("/source/{sid}/info/create", get(info_create_form).post(info_create))
        .route("/source/{sid}/info/delete/{id}", post(info_delete))
        .route("/source/{sid}/info/update/{id}", get(info_update_form).post(info_update))
}

/// Requests still running after `limit` are answered with `408 Request Timeout`.
fn request_deadline(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::new(limit)
}

/// The full application: pages, static assets, health check, request
/// tracing and the server-wide request deadline.
pub fn app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let deadline = request_deadline(state.config.request_timeout());

    routes()
        .route("/health", get(|| async { "OK" }))
        .nest_service("/static", static_files)
        .layer(deadline)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn slow_router(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route("/fast", get(|| async { "on time" }))
            .layer(request_deadline(limit))
    }

    async fn status_of(router: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_request_past_deadline_is_cut_off() {
        let status = status_of(slow_router(Duration::from_millis(50)), "/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_request_within_deadline_completes() {
        let status = status_of(slow_router(Duration::from_secs(5)), "/fast").await;
        assert_eq!(status, StatusCode::OK);
    }
}
