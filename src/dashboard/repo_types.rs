use sqlx::FromRow;
use time::Date;

use crate::dashboard::clock::ClockMinutes;

pub const UNASSIGNED_ROOM: &str = "Non assignée";

/// Sidebar projection of a professor.
#[derive(Debug, Clone, FromRow)]
pub struct ProfessorSummary {
    pub specialite: Option<String>,
    pub departement: String,
    pub nb_max_surveillances_jour: i32,
}

/// Account and professor details shown on the profile page.
#[derive(Debug, Clone, FromRow)]
pub struct ProfessorProfile {
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub specialite: Option<String>,
    pub departement: String,
    pub nb_max_surveillances_jour: i32,
    pub heures_semaine_max: Option<i32>,
}

/// One confirmed, dated surveillance slot, deduplicated per exam occurrence and room.
#[derive(Debug, Clone, FromRow)]
pub struct PlannedSurveillance {
    pub examen_id: i64,
    pub module_nom: String,
    pub formation_nom: String,
    pub groupe_nom: Option<String>,
    pub effectif: Option<i32>,
    pub session_nom: Option<String>,
    pub date_surveillance: Date,
    pub heure_debut: Option<ClockMinutes>,
    pub duree_minutes: i32,
    pub salle_surveillance: Option<String>,
    pub salle_examen: Option<String>,
    pub nb_surveillants: i64,
}

impl PlannedSurveillance {
    pub fn room(&self) -> &str {
        resolve_room(
            self.salle_surveillance.as_deref(),
            self.salle_examen.as_deref(),
        )
    }
}

/// Surveillance-specific room, else the exam's room, else unassigned.
pub fn resolve_room<'a>(surveillance: Option<&'a str>, exam: Option<&'a str>) -> &'a str {
    surveillance.or(exam).unwrap_or(UNASSIGNED_ROOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_falls_back_in_order() {
        assert_eq!(resolve_room(Some("A12"), Some("B3")), "A12");
        assert_eq!(resolve_room(None, Some("B3")), "B3");
        assert_eq!(resolve_room(None, None), UNASSIGNED_ROOM);
        assert_eq!(resolve_room(Some("A12"), None), "A12");
    }
}
