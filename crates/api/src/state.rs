//! Shared application state.

use rent_store::RentRepository;
use workflow::{InMemorySessionStore, RentWorkflow};

use crate::render::Templates;
use crate::session::CookieSettings;

/// Shared application state accessible from all handlers.
pub struct AppState<R: RentRepository> {
    pub workflow: RentWorkflow<R, InMemorySessionStore>,
    pub sessions: InMemorySessionStore,
    pub templates: Templates,
    pub cookie: CookieSettings,
    pub csrf_protection: bool,
}
