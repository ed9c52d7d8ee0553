//! Static pages and model pages.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, State};
use axum::response::Response;
use domain::ChosenModel;
use rent_store::RentRepository;
use workflow::{SessionId, WorkflowError, parse_model_id};

use crate::error::ApiError;
use crate::render::TemplateData;
use crate::routes::render_page;
use crate::state::AppState;
use crate::templates;

/// GET / — home page.
pub async fn home<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    render_page(&state, session, templates::HOME, TemplateData::new()).await
}

/// GET /about
pub async fn about<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    render_page(&state, session, templates::ABOUT, TemplateData::new()).await
}

/// GET /contact
pub async fn contact<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    render_page(&state, session, templates::CONTACT, TemplateData::new()).await
}

/// GET /models/{id} — a model's page with its availability probe.
#[tracing::instrument(skip(state))]
pub async fn model<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::NotFound(format!("Model not found: {id}"));

    let model_id = parse_model_id(&id).map_err(|_| not_found())?;
    let model = match state.workflow.model(model_id).await {
        Ok(model) => model,
        Err(WorkflowError::ItemNotFound(_)) => return Err(not_found()),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let data = TemplateData::new()
        .with_string("model_name", model.name.clone())
        .with_data("model", &ChosenModel::from(model))?;
    render_page(&state, session, templates::MODEL, data).await
}
