//! Model choice, the rent form and the summary.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use domain::{ContactDetails, Form as ContactForm, RentDraft};
use rent_store::RentRepository;
use serde::Deserialize;
use workflow::{ContactOutcome, SessionId, SessionStoreExt, parse_model_id};

use crate::error::ApiError;
use crate::render::TemplateData;
use crate::routes::{check_csrf, render_page, workflow_failure};
use crate::session::FLASH_KEY;
use crate::state::AppState;
use crate::templates;

#[derive(Debug, Deserialize)]
pub struct RentVehicleQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub s: String,
    #[serde(default)]
    pub e: String,
}

#[derive(Debug, Deserialize)]
pub struct RentForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl RentForm {
    fn into_contact(self) -> ContactDetails {
        ContactDetails {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
        }
    }
}

fn draft_page_data(draft: &RentDraft, form: ContactForm) -> Result<TemplateData, ApiError> {
    let mut data = TemplateData::new().with_form(form).with_data("rent", draft)?;
    if let Some(dates) = draft.dates() {
        data = data
            .with_string("start_date", common::format_date(dates.start()))
            .with_string("end_date", common::format_date(dates.end()));
    }
    if let Some(model) = draft.model() {
        data = data.with_string("model_name", model.name.clone());
    }
    Ok(data)
}

/// GET /choose-model/{id} — picks a model for the searched dates.
#[tracing::instrument(skip(state))]
pub async fn choose_model<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let result = match parse_model_id(&id) {
        Ok(model_id) => state.workflow.choose_model(session, model_id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Ok(Redirect::to("/rent").into_response()),
        Err(e) => workflow_failure(&state, session, e).await,
    }
}

/// GET /rent-vehicle?id=&s=&e= — starts a rent straight from a model page.
#[tracing::instrument(skip(state))]
pub async fn rent_vehicle<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<RentVehicleQuery>,
) -> Result<Response, ApiError> {
    let result = match parse_model_id(&query.id) {
        Ok(model_id) => {
            state
                .workflow
                .start_rent_for_model(session, model_id, &query.s, &query.e)
                .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Ok(Redirect::to("/rent").into_response()),
        Err(e) => workflow_failure(&state, session, e).await,
    }
}

/// GET /rent — the contact form for the draft in session.
pub async fn rent_form<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    let draft = match state.workflow.view_rent_form(session).await {
        Ok(draft) => draft,
        Err(e) => return workflow_failure(&state, session, e).await,
    };
    let data = draft_page_data(&draft, ContactForm::default())?;
    render_page(&state, session, templates::RENT, data).await
}

/// POST /rent — validates contact details and commits the rent.
#[tracing::instrument(skip(state, form))]
pub async fn submit_rent<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<RentForm>,
) -> Result<Response, ApiError> {
    check_csrf(&state, session, &form.csrf_token).await?;

    match state
        .workflow
        .submit_contact(session, form.into_contact())
        .await
    {
        Ok(ContactOutcome::Invalid { draft, form }) => {
            let mut data = draft_page_data(&draft, form)?;
            data.warning = Some("Please correct the highlighted fields".to_string());
            render_page(&state, session, templates::RENT, data).await
        }
        Ok(ContactOutcome::Committed { .. }) => {
            state
                .sessions
                .put_as(session, FLASH_KEY, &"Your rent is booked")
                .await?;
            Ok(Redirect::to("/rent-summary").into_response())
        }
        Err(e) => workflow_failure(&state, session, e).await,
    }
}

/// GET /rent-summary — shows the committed rent once.
pub async fn summary<R: RentRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Response, ApiError> {
    let draft = match state.workflow.view_summary(session).await {
        Ok(draft) => draft,
        Err(e) => return workflow_failure(&state, session, e).await,
    };
    let data = draft_page_data(&draft, ContactForm::default())?;
    render_page(&state, session, templates::RENT_SUMMARY, data).await
}
