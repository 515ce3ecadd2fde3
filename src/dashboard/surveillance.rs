use serde::Serialize;
use time::macros::format_description;
use tracing::{error, warn};

use crate::dashboard::{
    clock::time_range,
    error::RepoError,
    repo::DashboardRepo,
    repo_types::PlannedSurveillance,
    view::{Metric, Notice},
};

pub const HEADER: &str = "Mes Surveillances";
const NOTHING_PLANNED: &str = "Aucune surveillance planifiée pour le moment.";
const LOAD_ERROR_PREFIX: &str = "Erreur lors du chargement des surveillances : ";

/// Table row as displayed to the professor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveillanceRow {
    pub examen_id: i64,
    pub module: String,
    pub formation: String,
    pub date: String,
    pub horaire: String,
    pub salle: String,
    pub groupe: String,
    pub session: String,
    pub effectif: i32,
    pub surveillants: i64,
}

impl From<&PlannedSurveillance> for SurveillanceRow {
    fn from(s: &PlannedSurveillance) -> Self {
        let date = s
            .date_surveillance
            .format(format_description!("[day]/[month]/[year]"))
            .unwrap_or_else(|_| "-".to_string());
        Self {
            examen_id: s.examen_id,
            module: s.module_nom.clone(),
            formation: s.formation_nom.clone(),
            date,
            horaire: time_range(s.heure_debut, i64::from(s.duree_minutes)),
            salle: s.room().to_string(),
            groupe: s.groupe_nom.clone().unwrap_or_else(|| "-".to_string()),
            session: s.session_nom.clone().unwrap_or_else(|| "-".to_string()),
            effectif: s.effectif.unwrap_or(0),
            surveillants: s.nb_surveillants,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveillancePage {
    pub header: &'static str,
    pub notices: Vec<Notice>,
    pub metric: Option<Metric>,
    pub rows: Vec<SurveillanceRow>,
}

impl SurveillancePage {
    fn with_notice(notice: Notice) -> Self {
        Self {
            header: HEADER,
            notices: vec![notice],
            metric: None,
            rows: Vec::new(),
        }
    }
}

/// Confirmed, dated surveillances of the professor linked to `user_id`.
pub async fn render_surveillances(repo: &dyn DashboardRepo, user_id: i64) -> SurveillancePage {
    let planned = match load(repo, user_id).await {
        Ok(rows) => rows,
        Err(e) => {
            match &e {
                RepoError::ProfessorNotFound(_) => warn!(user_id, "no professor profile"),
                RepoError::Unavailable => warn!(user_id, "surveillances requested without database"),
                RepoError::Query(err) => error!(error = %err, user_id, "load surveillances failed"),
            }
            return SurveillancePage::with_notice(Notice::from_repo_error(&e, LOAD_ERROR_PREFIX));
        }
    };

    if planned.is_empty() {
        return SurveillancePage::with_notice(Notice::Info(NOTHING_PLANNED.to_string()));
    }

    let rows: Vec<SurveillanceRow> = planned.iter().map(SurveillanceRow::from).collect();
    SurveillancePage {
        header: HEADER,
        notices: Vec::new(),
        metric: Some(Metric {
            label: "Total surveillances planifiées",
            value: rows.len() as i64,
        }),
        rows,
    }
}

async fn load(repo: &dyn DashboardRepo, user_id: i64) -> Result<Vec<PlannedSurveillance>, RepoError> {
    let professor_id = repo.professor_id(user_id).await?;
    repo.planned_surveillances(professor_id).await
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::dashboard::{
        clock::ClockMinutes, repo::testing::FakeRepo, repo_types::UNASSIGNED_ROOM,
        view::DB_UNAVAILABLE,
    };

    fn slot(start: Option<&str>, duration: i32) -> PlannedSurveillance {
        PlannedSurveillance {
            examen_id: 12,
            module_nom: "Bases de données".into(),
            formation_nom: "L3 Informatique".into(),
            groupe_nom: Some("G1".into()),
            effectif: Some(32),
            session_nom: Some("Session normale".into()),
            date_surveillance: date!(2025 - 01 - 14),
            heure_debut: start.map(|s| s.parse::<ClockMinutes>().unwrap()),
            duree_minutes: duration,
            salle_surveillance: None,
            salle_examen: Some("Amphi A".into()),
            nb_surveillants: 1,
        }
    }

    #[tokio::test]
    async fn missing_professor_yields_error_and_no_rows() {
        let repo = FakeRepo::default();
        let page = render_surveillances(&repo, 4).await;
        assert_eq!(
            page.notices,
            vec![Notice::Error("Profil professeur non trouvé".into())]
        );
        assert!(page.rows.is_empty());
        assert!(page.metric.is_none());
        assert!(repo.asked_for.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_schedule_is_informational() {
        let repo = FakeRepo {
            professor_id: Some(9),
            ..Default::default()
        };
        let page = render_surveillances(&repo, 4).await;
        assert_eq!(page.notices, vec![Notice::Info(NOTHING_PLANNED.into())]);
        assert!(page.notices.iter().all(|n| !n.is_error()));
        assert!(page.rows.is_empty());
        assert_eq!(*repo.asked_for.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn rows_are_formatted_with_metric() {
        let mut overnight = slot(Some("23:30:00"), 90);
        overnight.salle_surveillance = Some("B204".into());
        let mut undated_time = slot(None, 120);
        undated_time.salle_examen = None;
        undated_time.groupe_nom = None;
        undated_time.effectif = None;
        undated_time.session_nom = None;

        let repo = FakeRepo {
            professor_id: Some(9),
            rows: vec![slot(Some("08:30"), 90), overnight, undated_time],
            ..Default::default()
        };
        let page = render_surveillances(&repo, 4).await;

        assert!(page.notices.is_empty());
        assert_eq!(
            page.metric,
            Some(Metric {
                label: "Total surveillances planifiées",
                value: 3
            })
        );

        let first = &page.rows[0];
        assert_eq!(first.date, "14/01/2025");
        assert_eq!(first.horaire, "08:30 - 10:00");
        assert_eq!(first.salle, "Amphi A");
        assert_eq!(first.groupe, "G1");
        assert_eq!(first.effectif, 32);

        assert_eq!(page.rows[1].horaire, "23:30 - 01:00");
        assert_eq!(page.rows[1].salle, "B204");

        let last = &page.rows[2];
        assert_eq!(last.horaire, "-");
        assert_eq!(last.salle, UNASSIGNED_ROOM);
        assert_eq!(last.groupe, "-");
        assert_eq!(last.session, "-");
        assert_eq!(last.effectif, 0);
    }

    #[tokio::test]
    async fn query_failure_is_reported_inline() {
        let repo = FakeRepo {
            professor_id: Some(9),
            fail_queries: true,
            ..Default::default()
        };
        let page = render_surveillances(&repo, 4).await;
        assert_eq!(page.notices.len(), 1);
        match &page.notices[0] {
            Notice::Error(text) => assert!(text.starts_with(LOAD_ERROR_PREFIX)),
            other => panic!("unexpected notice {other:?}"),
        }
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn unavailable_database_degrades() {
        let repo = FakeRepo {
            unavailable: true,
            ..Default::default()
        };
        let page = render_surveillances(&repo, 4).await;
        assert_eq!(page.notices, vec![Notice::Error(DB_UNAVAILABLE.into())]);
    }
}
