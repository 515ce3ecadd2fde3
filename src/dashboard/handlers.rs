use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    dashboard::{
        profile::{
            change_password, render_profile, render_sidebar, PasswordChangeForm,
            PasswordChangeOutcome, ProfilePage, SidebarSummary,
        },
        surveillance::{render_surveillances, SurveillancePage},
        view::{Notice, DB_UNAVAILABLE},
    },
    state::AppState,
};

pub const TITLE: &str = "Espace Professeur";

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/surveillances", get(surveillances))
        .route("/dashboard/profile", get(profile))
        .route("/dashboard/profile/password", post(password))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Surveillances,
    Profile,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub section: Section,
}

#[derive(Debug, Serialize)]
pub struct MenuEntry {
    pub section: Section,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Sidebar {
    pub summary: SidebarSummary,
    pub menu: Vec<MenuEntry>,
    pub logout: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "section", rename_all = "lowercase")]
pub enum Content {
    Surveillances(SurveillancePage),
    Profile(ProfilePage),
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub title: &'static str,
    pub banner: Option<Notice>,
    pub sidebar: Sidebar,
    pub active: Section,
    pub content: Content,
}

fn menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry {
            section: Section::Surveillances,
            label: "Mes Surveillances",
        },
        MenuEntry {
            section: Section::Profile,
            label: "Mon Profil",
        },
    ]
}

fn banner(state: &AppState) -> Option<Notice> {
    state
        .db
        .is_none()
        .then(|| Notice::Error(DB_UNAVAILABLE.to_string()))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DashboardQuery>,
) -> Json<DashboardPage> {
    let summary = render_sidebar(state.repo.as_ref(), user_id).await;
    let content = match q.section {
        Section::Surveillances => {
            Content::Surveillances(render_surveillances(state.repo.as_ref(), user_id).await)
        }
        Section::Profile => Content::Profile(render_profile(state.repo.as_ref(), user_id).await),
    };
    Json(DashboardPage {
        title: TITLE,
        banner: banner(&state),
        sidebar: Sidebar {
            summary,
            menu: menu(),
            logout: "/api/v1/auth/logout",
        },
        active: q.section,
        content,
    })
}

#[instrument(skip(state))]
pub async fn surveillances(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<SurveillancePage> {
    Json(render_surveillances(state.repo.as_ref(), user_id).await)
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<ProfilePage> {
    Json(render_profile(state.repo.as_ref(), user_id).await)
}

#[derive(Debug, Serialize)]
pub struct PasswordChangeResponse {
    pub notice: Notice,
}

#[instrument(skip(state, form))]
pub async fn password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(form): Json<PasswordChangeForm>,
) -> (StatusCode, Json<PasswordChangeResponse>) {
    let outcome = change_password(
        state.credentials.as_ref(),
        &state.config.password,
        user_id,
        &form,
    )
    .await;
    let status = match (&outcome, state.db.is_none()) {
        (PasswordChangeOutcome::UpdateFailed, true) => StatusCode::SERVICE_UNAVAILABLE,
        _ => outcome.status(),
    };
    let notice = outcome.notice();
    if notice.is_error() {
        warn!(user_id, ?outcome, "password change refused");
    }
    (status, Json(PasswordChangeResponse { notice }))
}
