use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    auth::{credentials::CredentialStore, password::verify_password_strength},
    config::PasswordConfig,
    dashboard::{
        repo::DashboardRepo,
        view::{Field, Metric, Notice},
    },
};

pub const HEADER: &str = "Mon Profil";
const GENERIC_PREFIX: &str = "Erreur: ";

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub header: &'static str,
    pub notices: Vec<Notice>,
    pub fields: Vec<Field>,
    pub metric: Option<Metric>,
}

/// Professor summary shown next to the navigation.
#[derive(Debug, Clone, Serialize)]
pub struct SidebarSummary {
    pub fields: Vec<Field>,
    pub notices: Vec<Notice>,
}

pub async fn render_sidebar(repo: &dyn DashboardRepo, user_id: i64) -> SidebarSummary {
    match repo.professor_summary(user_id).await {
        Ok(Some(info)) => SidebarSummary {
            fields: vec![
                Field::new("Spécialité", info.specialite.unwrap_or_default()),
                Field::new("Département", info.departement),
                Field::new("Limite/jour", info.nb_max_surveillances_jour),
            ],
            notices: Vec::new(),
        },
        Ok(None) => SidebarSummary {
            fields: Vec::new(),
            notices: Vec::new(),
        },
        Err(e) => {
            warn!(error = %e, user_id, "sidebar summary failed");
            SidebarSummary {
                fields: Vec::new(),
                notices: vec![Notice::from_repo_error(&e, GENERIC_PREFIX)],
            }
        }
    }
}

pub async fn render_profile(repo: &dyn DashboardRepo, user_id: i64) -> ProfilePage {
    let mut page = ProfilePage {
        header: HEADER,
        notices: Vec::new(),
        fields: Vec::new(),
        metric: None,
    };

    let profile = match repo.professor_profile(user_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            page.notices
                .push(Notice::Warning("Aucune information trouvée".to_string()));
            return page;
        }
        Err(e) => {
            error!(error = %e, user_id, "load profile failed");
            page.notices.push(Notice::from_repo_error(&e, GENERIC_PREFIX));
            return page;
        }
    };

    page.fields = vec![
        Field::new("Email", profile.email),
        Field::new("Rôle", profile.role),
        Field::new("Spécialité", profile.specialite.unwrap_or_default()),
        Field::new("Département", profile.departement),
        Field::new(
            "Statut",
            if profile.is_active { "Actif" } else { "Inactif" },
        ),
        Field::new(
            "Limite surveillances/jour",
            profile.nb_max_surveillances_jour,
        ),
    ];
    if let Some(hours) = profile.heures_semaine_max {
        page.fields.push(Field::new("Heures/semaine max", hours));
    }

    match repo.count_planned_surveillances(user_id).await {
        Ok(total) => {
            page.metric = Some(Metric {
                label: "Surveillances planifiées (total)",
                value: total,
            })
        }
        Err(e) => {
            error!(error = %e, user_id, "count surveillances failed");
            page.notices.push(Notice::from_repo_error(&e, GENERIC_PREFIX));
        }
    }

    page
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordChangeOutcome {
    MissingFields,
    Mismatch,
    Weak(String),
    WrongCurrentPassword,
    Updated,
    UpdateFailed,
}

impl PasswordChangeOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            Self::MissingFields => Notice::Error("Tous les champs sont obligatoires".into()),
            Self::Mismatch => Notice::Error("Les mots de passe ne correspondent pas".into()),
            Self::Weak(msg) => Notice::Error(msg.clone()),
            Self::WrongCurrentPassword => Notice::Error("Ancien mot de passe incorrect".into()),
            Self::Updated => Notice::Success("Mot de passe modifié avec succès".into()),
            Self::UpdateFailed => Notice::Error("Erreur lors de la mise à jour".into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Updated => StatusCode::OK,
            Self::UpdateFailed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Validates the form in order (presence, confirmation, strength, optionally the
/// current password) and only then asks the store to update.
pub async fn change_password(
    credentials: &dyn CredentialStore,
    policy: &PasswordConfig,
    user_id: i64,
    form: &PasswordChangeForm,
) -> PasswordChangeOutcome {
    if form.old_password.is_empty()
        || form.new_password.is_empty()
        || form.confirm_password.is_empty()
    {
        return PasswordChangeOutcome::MissingFields;
    }
    if form.new_password != form.confirm_password {
        return PasswordChangeOutcome::Mismatch;
    }
    if let Err(weak) = verify_password_strength(&form.new_password, policy) {
        return PasswordChangeOutcome::Weak(weak.to_string());
    }
    if policy.verify_current {
        match credentials
            .verify_current_password(user_id, &form.old_password)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id, "password change with wrong current password");
                return PasswordChangeOutcome::WrongCurrentPassword;
            }
            Err(e) => {
                error!(error = %e, user_id, "verify current password failed");
                return PasswordChangeOutcome::UpdateFailed;
            }
        }
    }

    if credentials
        .update_user_password(user_id, &form.new_password)
        .await
    {
        info!(user_id, "password changed");
        PasswordChangeOutcome::Updated
    } else {
        PasswordChangeOutcome::UpdateFailed
    }
}
