//! Request handlers and the helpers they share.

pub mod availability;
pub mod ops;
pub mod pages;
pub mod rent;

use axum::response::{Html, IntoResponse, Redirect, Response};
use rent_store::RentRepository;
use workflow::{SessionId, WorkflowError};

use crate::error::{ApiError, redirect_for};
use crate::render::TemplateData;
use crate::session::{csrf_token, put_error, take_alerts};
use crate::state::AppState;
use crate::templates;

/// Renders a page with the session's pending alerts.
///
/// Only pages with a form get a CSRF token, so browsing static pages does
/// not create a session.
pub(crate) async fn render_page<R: RentRepository>(
    state: &AppState<R>,
    session: SessionId,
    name: &str,
    mut data: TemplateData,
) -> Result<Response, ApiError> {
    let alerts = take_alerts(&state.sessions, session).await?;
    data.flash = data.flash.or(alerts.flash);
    data.warning = data.warning.or(alerts.warning);
    data.error = data.error.or(alerts.error);
    if templates::has_form(name) {
        data.csrf_token = csrf_token(&state.sessions, session).await?;
    }

    let html = state.templates.render(name, &data)?;
    Ok(Html(html).into_response())
}

/// Sends the client to `target` with an error alert waiting there.
pub(crate) async fn redirect_with_error<R: RentRepository>(
    state: &AppState<R>,
    session: SessionId,
    target: &str,
    message: &str,
) -> Result<Response, ApiError> {
    put_error(&state.sessions, session, message).await?;
    Ok(Redirect::to(target).into_response())
}

/// Turns a failed workflow step into a redirect with an error alert.
///
/// Backend failures are logged in full; the client only sees generic text.
pub(crate) async fn workflow_failure<R: RentRepository>(
    state: &AppState<R>,
    session: SessionId,
    err: WorkflowError,
) -> Result<Response, ApiError> {
    if let WorkflowError::Session(e) = err {
        return Err(ApiError::Session(e));
    }
    if err.is_backend_failure() {
        tracing::error!(error = %err, %session, "workflow step failed");
    } else {
        tracing::info!(error = %err, %session, "workflow step rejected");
    }

    let (target, message) = redirect_for(&err);
    redirect_with_error(state, session, target, message).await
}

/// Checks the CSRF token of a form post when protection is on.
pub(crate) async fn check_csrf<R: RentRepository>(
    state: &AppState<R>,
    session: SessionId,
    submitted: &str,
) -> Result<(), ApiError> {
    if !state.csrf_protection {
        return Ok(());
    }
    crate::session::verify_csrf(&state.sessions, session, submitted).await
}
