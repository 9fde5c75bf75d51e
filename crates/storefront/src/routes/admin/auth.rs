//! Admin login and logout.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// POST /admin/login
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<StatusCode> {
    if let Err(err) = state.admin_auth().verify(&form.password) {
        tracing::warn!("Rejected admin login attempt");
        return Err(err.into());
    }

    set_current_admin(
        &session,
        &CurrentAdmin {
            logged_in_at: Utc::now(),
        },
    )
    .await?;

    add_breadcrumb("auth", "Admin logged in", &[]);
    tracing::info!("Admin logged in");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
