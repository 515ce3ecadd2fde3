use async_trait::async_trait;
use sqlx::PgPool;

use crate::dashboard::{
    error::RepoError,
    repo_types::{PlannedSurveillance, ProfessorProfile, ProfessorSummary},
};

/// Read side of the dashboard. Only confirmed exams with a dated surveillance count as planned.
#[async_trait]
pub trait DashboardRepo: Send + Sync {
    async fn professor_summary(&self, user_id: i64)
        -> Result<Option<ProfessorSummary>, RepoError>;

    async fn professor_profile(&self, user_id: i64)
        -> Result<Option<ProfessorProfile>, RepoError>;

    async fn count_planned_surveillances(&self, user_id: i64) -> Result<i64, RepoError>;

    async fn professor_id(&self, user_id: i64) -> Result<i64, RepoError>;

    async fn planned_surveillances(
        &self,
        professor_id: i64,
    ) -> Result<Vec<PlannedSurveillance>, RepoError>;
}

pub(crate) const PROFESSOR_SUMMARY_SQL: &str = r#"
    SELECT p.specialite,
           d.nom AS departement,
           p.nb_max_surveillances_jour
    FROM professeurs p
    JOIN departements d ON p.departement_id = d.id
    WHERE p.user_id = $1
"#;

pub(crate) const PROFESSOR_PROFILE_SQL: &str = r#"
    SELECT u.email,
           u.role,
           u.is_active,
           p.specialite,
           d.nom AS departement,
           p.nb_max_surveillances_jour,
           p.heures_semaine_max
    FROM users u
    JOIN professeurs p ON u.id = p.user_id
    JOIN departements d ON p.departement_id = d.id
    WHERE u.id = $1
"#;

pub(crate) const COUNT_PLANNED_SQL: &str = r#"
    SELECT COUNT(*)
    FROM surveillances s
    JOIN examens e ON s.examen_id = e.id
    JOIN professeurs p ON s.prof_id = p.id
    WHERE p.user_id = $1
      AND e.statut = 'CONFIRME'
      AND s.date_surveillance IS NOT NULL
"#;

pub(crate) const PROFESSOR_ID_SQL: &str = r#"
    SELECT id FROM professeurs WHERE user_id = $1
"#;

// sa: room set on the surveillance itself, sa2: room assigned to the exam.
pub(crate) const PLANNED_SURVEILLANCES_SQL: &str = r#"
    SELECT e.id AS examen_id,
           m.nom AS module_nom,
           f.nom AS formation_nom,
           g.nom AS groupe_nom,
           g.effectif,
           se.nom AS session_nom,
           s.date_surveillance,
           s.heure_debut,
           e.duree_minutes,
           MAX(sa.nom) AS salle_surveillance,
           MAX(sa2.nom) AS salle_examen,
           COUNT(DISTINCT s.prof_id) AS nb_surveillants
    FROM surveillances s
    JOIN examens e ON s.examen_id = e.id
    JOIN modules m ON e.module_id = m.id
    JOIN formations f ON e.formation_id = f.id
    JOIN groupes g ON e.groupe_id = g.id
    JOIN sessions_examens se ON e.session_id = se.id
    LEFT JOIN salles sa ON s.salle_id = sa.id
    LEFT JOIN salles sa2 ON e.salle_id = sa2.id
    WHERE s.prof_id = $1
      AND e.statut = 'CONFIRME'
      AND s.date_surveillance IS NOT NULL
    GROUP BY e.id, m.nom, f.nom, g.nom, g.effectif, se.nom,
             s.date_surveillance, s.heure_debut, e.duree_minutes,
             COALESCE(s.salle_id, e.salle_id),
             COALESCE(sa.nom, sa2.nom)
    ORDER BY s.date_surveillance, s.heure_debut NULLS FIRST
"#;

/// PostgreSQL implementation. Holds no pool when the database was unreachable at startup.
#[derive(Clone)]
pub struct PgDashboardRepo {
    db: Option<PgPool>,
}

impl PgDashboardRepo {
    pub fn new(db: Option<PgPool>) -> Self {
        Self { db }
    }

    fn pool(&self) -> Result<&PgPool, RepoError> {
        self.db.as_ref().ok_or(RepoError::Unavailable)
    }
}

#[async_trait]
impl DashboardRepo for PgDashboardRepo {
    async fn professor_summary(
        &self,
        user_id: i64,
    ) -> Result<Option<ProfessorSummary>, RepoError> {
        let row = sqlx::query_as::<_, ProfessorSummary>(PROFESSOR_SUMMARY_SQL)
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row)
    }

    async fn professor_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<ProfessorProfile>, RepoError> {
        let row = sqlx::query_as::<_, ProfessorProfile>(PROFESSOR_PROFILE_SQL)
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row)
    }

    async fn count_planned_surveillances(&self, user_id: i64) -> Result<i64, RepoError> {
        let total = sqlx::query_scalar::<_, i64>(COUNT_PLANNED_SQL)
            .bind(user_id)
            .fetch_one(self.pool()?)
            .await?;
        Ok(total)
    }

    async fn professor_id(&self, user_id: i64) -> Result<i64, RepoError> {
        let id = sqlx::query_scalar::<_, i64>(PROFESSOR_ID_SQL)
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?;
        id.ok_or(RepoError::ProfessorNotFound(user_id))
    }

    async fn planned_surveillances(
        &self,
        professor_id: i64,
    ) -> Result<Vec<PlannedSurveillance>, RepoError> {
        let rows = sqlx::query_as::<_, PlannedSurveillance>(PLANNED_SURVEILLANCES_SQL)
            .bind(professor_id)
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn planned_filters_are_present_in_both_queries() {
        for sql in [PLANNED_SURVEILLANCES_SQL, COUNT_PLANNED_SQL] {
            let sql = squash(sql);
            assert!(sql.contains("e.statut = 'CONFIRME'"), "{sql}");
            assert!(sql.contains("s.date_surveillance IS NOT NULL"), "{sql}");
        }
    }

    #[test]
    fn planned_rows_are_ordered_by_date_then_start() {
        let sql = squash(PLANNED_SURVEILLANCES_SQL);
        assert!(sql.ends_with("ORDER BY s.date_surveillance, s.heure_debut NULLS FIRST"));
        assert!(sql.contains("COUNT(DISTINCT s.prof_id) AS nb_surveillants"));
    }

    #[tokio::test]
    async fn missing_pool_reports_unavailable() {
        let repo = PgDashboardRepo::new(None);
        assert!(matches!(
            repo.professor_id(4).await,
            Err(RepoError::Unavailable)
        ));
        assert!(matches!(
            repo.planned_surveillances(1).await,
            Err(RepoError::Unavailable)
        ));
    }

    mod pg {
        use sqlx::{Executor, PgPool};
        use time::macros::date;

        use super::*;
        use crate::dashboard::{clock::ClockMinutes, repo_types::UNASSIGNED_ROOM};

        // Professor 10 belongs to user 1, professor 20 to user 2.
        // Exam 100 sits in room B3, the other exams have no room.
        const REFERENCE: &str = r#"
            INSERT INTO users (id, email, password_hash) VALUES
                (1, 'prof@univ.dz', 'x'),
                (2, 'autre@univ.dz', 'x');
            INSERT INTO departements (id, nom) VALUES (1, 'Informatique');
            INSERT INTO professeurs (id, user_id, specialite, departement_id, heures_semaine_max) VALUES
                (10, 1, 'Algorithmique', 1, 18),
                (20, 2, NULL, 1, NULL);
            INSERT INTO modules (id, nom) VALUES
                (1, 'Algorithmique'), (2, 'Réseaux'), (3, 'Bases de données');
            INSERT INTO formations (id, nom) VALUES (1, 'L3 Informatique');
            INSERT INTO groupes (id, nom, effectif) VALUES (1, 'G1', 32);
            INSERT INTO sessions_examens (id, nom) VALUES (1, 'Normale');
            INSERT INTO salles (id, nom) VALUES (1, 'A12'), (2, 'B3');
            INSERT INTO examens (id, module_id, formation_id, groupe_id, session_id, statut, duree_minutes, salle_id) VALUES
                (100, 1, 1, 1, 1, 'CONFIRME', 90, 2),
                (101, 2, 1, 1, 1, 'BROUILLON', 60, NULL),
                (102, 3, 1, 1, 1, 'CONFIRME', 60, NULL),
                (103, 3, 1, 1, 1, 'CONFIRME', 120, NULL);
        "#;

        async fn seed(pool: &PgPool, surveillances: &str) -> sqlx::Result<()> {
            pool.execute(REFERENCE).await?;
            pool.execute(surveillances).await?;
            Ok(())
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn only_confirmed_dated_rows_are_planned(pool: PgPool) -> sqlx::Result<()> {
            seed(
                &pool,
                r#"
                INSERT INTO surveillances (examen_id, prof_id, date_surveillance, heure_debut, salle_id) VALUES
                    (100, 10, '2025-01-15', '09:00', NULL),
                    (101, 10, '2025-01-10', '08:00', NULL),
                    (102, 10, NULL, '10:00', NULL);
                "#,
            )
            .await?;
            let repo = PgDashboardRepo::new(Some(pool));

            assert_eq!(repo.count_planned_surveillances(1).await.unwrap(), 1);
            let rows = repo.planned_surveillances(10).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].examen_id, 100);
            assert_eq!(rows[0].module_nom, "Algorithmique");
            assert_eq!(rows[0].date_surveillance, date!(2025 - 01 - 15));
            assert_eq!(rows[0].heure_debut, Some(ClockMinutes::new(9 * 60)));
            assert_eq!(rows[0].duree_minutes, 90);
            assert_eq!(rows[0].nb_surveillants, 1);
            Ok(())
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn rows_are_deduplicated_ordered_and_roomed(pool: PgPool) -> sqlx::Result<()> {
            seed(
                &pool,
                r#"
                INSERT INTO surveillances (examen_id, prof_id, date_surveillance, heure_debut, salle_id) VALUES
                    (100, 10, '2025-01-15', '09:00', 1),
                    (100, 10, '2025-01-15', '09:00', 1),
                    (100, 20, '2025-01-15', '09:00', 1),
                    (100, 10, '2025-01-14', '14:00', NULL),
                    (103, 10, '2025-01-14', NULL, NULL);
                "#,
            )
            .await?;
            let repo = PgDashboardRepo::new(Some(pool));

            let rows = repo.planned_surveillances(10).await.unwrap();
            let seen: Vec<_> = rows
                .iter()
                .map(|r| (r.examen_id, r.date_surveillance, r.heure_debut, r.room()))
                .collect();
            assert_eq!(
                seen,
                vec![
                    (103, date!(2025 - 01 - 14), None, UNASSIGNED_ROOM),
                    (100, date!(2025 - 01 - 14), Some(ClockMinutes::new(14 * 60)), "B3"),
                    (100, date!(2025 - 01 - 15), Some(ClockMinutes::new(9 * 60)), "A12"),
                ]
            );
            assert!(rows.iter().all(|r| r.nb_surveillants == 1));
            assert_eq!(rows[1].salle_surveillance, None);
            assert_eq!(rows[1].salle_examen.as_deref(), Some("B3"));

            // The count is taken over raw rows, before deduplication.
            assert_eq!(repo.count_planned_surveillances(1).await.unwrap(), 4);
            assert_eq!(repo.count_planned_surveillances(2).await.unwrap(), 1);
            Ok(())
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn professor_lookups(pool: PgPool) -> sqlx::Result<()> {
            seed(&pool, "SELECT 1").await?;
            let repo = PgDashboardRepo::new(Some(pool));

            assert_eq!(repo.professor_id(1).await.unwrap(), 10);
            assert!(matches!(
                repo.professor_id(99).await,
                Err(RepoError::ProfessorNotFound(99))
            ));

            let summary = repo.professor_summary(1).await.unwrap().unwrap();
            assert_eq!(summary.departement, "Informatique");
            assert_eq!(summary.nb_max_surveillances_jour, 3);

            let profile = repo.professor_profile(2).await.unwrap().unwrap();
            assert_eq!(profile.email, "autre@univ.dz");
            assert_eq!(profile.role, "PROF");
            assert!(profile.is_active);
            assert_eq!(profile.specialite, None);
            assert_eq!(profile.heures_semaine_max, None);
            assert!(repo.professor_profile(99).await.unwrap().is_none());
            Ok(())
        }
    }
}
