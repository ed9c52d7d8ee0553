//! Date search and the single-model availability probe.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::{Extension, Form, Json};
use domain::ChosenModel;
use rent_store::RentRepository;
use serde::{Deserialize, Serialize};
use workflow::SessionId;

use crate::error::ApiError;
use crate::render::TemplateData;
use crate::routes::{check_csrf, render_page, workflow_failure};
use crate::state::AppState;
use crate::templates;

#[derive(Debug, Deserialize)]
pub struct DateSearchForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ProbeForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Probe answer. Echoes the request so the page can build the booking link.
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ok: bool,
    pub message: String,
    pub model_id: String,
    pub start_date: String,
    pub end_date: String,
}

/// GET /check-availability — the date search form.
pub async fn search_form<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    render_page(
        &state,
        session,
        templates::CHECK_AVAILABILITY,
        TemplateData::new(),
    )
    .await
}

/// POST /check-availability — lists the free models and starts a draft.
#[tracing::instrument(skip(state, form))]
pub async fn search<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<DateSearchForm>,
) -> Result<Response, ApiError> {
    check_csrf(&state, session, &form.csrf_token).await?;

    let models = match state
        .workflow
        .submit_date_range(session, &form.start, &form.end)
        .await
    {
        Ok(models) => models,
        Err(e) => return workflow_failure(&state, session, e).await,
    };

    let models: Vec<ChosenModel> = models.into_iter().map(ChosenModel::from).collect();
    let data = TemplateData::new()
        .with_string("start_date", form.start.trim())
        .with_string("end_date", form.end.trim())
        .with_data("models", &models)?;
    render_page(&state, session, templates::CHOOSE_MODEL, data).await
}

/// POST /check-availability-json — answers whether one model is free.
///
/// Never fails on bad input: anything unparseable answers `ok: false`.
#[tracing::instrument(skip(state, form))]
pub async fn probe<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<ProbeForm>,
) -> Result<Json<ProbeResponse>, ApiError> {
    check_csrf(&state, session, &form.csrf_token).await?;

    let ok = state
        .workflow
        .check_single_model(&form.start, &form.end, &form.model_id)
        .await;

    Ok(Json(ProbeResponse {
        ok,
        message: String::new(),
        model_id: form.model_id.trim().to_string(),
        start_date: form.start,
        end_date: form.end,
    }))
}
