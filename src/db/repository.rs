use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::enums::RiskLabel;
use crate::models::RiskReport;

/// Persistence collaborator for the risk pipeline. One atomic insert per
/// successful prediction; reads serve the doctor-facing report views.
pub trait ReportStore: Send + Sync {
    fn create_report(&self, report: &RiskReport) -> Result<Uuid, DatabaseError>;
    fn get_report(&self, id: &Uuid) -> Result<Option<RiskReport>, DatabaseError>;
    fn list_reports_for_patient(&self, patient_id: &Uuid) -> Result<Vec<RiskReport>, DatabaseError>;
}

// ═══════════════════════════════════════════
// Report Repository
// ═══════════════════════════════════════════

pub fn insert_report(conn: &Connection, report: &RiskReport) -> Result<Uuid, DatabaseError> {
    conn.execute(
        "INSERT INTO gene_reports (id, patient_id, risk_percentage, result_label, file_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            report.id.to_string(),
            report.patient_id.to_string(),
            report.risk_percentage,
            report.result_label.as_str(),
            report.file_name,
            report.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(report.id)
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<RiskReport>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, risk_percentage, result_label, file_name, created_at
         FROM gene_reports WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(ReportRow {
            id: row.get::<_, String>(0)?,
            patient_id: row.get::<_, String>(1)?,
            risk_percentage: row.get::<_, f64>(2)?,
            result_label: row.get::<_, String>(3)?,
            file_name: row.get::<_, String>(4)?,
            created_at: row.get::<_, String>(5)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(report_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_reports_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<RiskReport>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, risk_percentage, result_label, file_name, created_at
         FROM gene_reports WHERE patient_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(ReportRow {
            id: row.get::<_, String>(0)?,
            patient_id: row.get::<_, String>(1)?,
            risk_percentage: row.get::<_, f64>(2)?,
            result_label: row.get::<_, String>(3)?,
            file_name: row.get::<_, String>(4)?,
            created_at: row.get::<_, String>(5)?,
        })
    })?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row?)?);
    }
    Ok(reports)
}

// Internal row type for RiskReport mapping
struct ReportRow {
    id: String,
    patient_id: String,
    risk_percentage: f64,
    result_label: String,
    file_name: String,
    created_at: String,
}

fn report_from_row(row: ReportRow) -> Result<RiskReport, DatabaseError> {
    Ok(RiskReport {
        id: parse_uuid("id", &row.id)?,
        patient_id: parse_uuid("patient_id", &row.patient_id)?,
        risk_percentage: row.risk_percentage,
        result_label: RiskLabel::from_str(&row.result_label)?,
        file_name: row.file_name,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| DatabaseError::InvalidEnum {
                field: "created_at".into(),
                value: row.created_at.clone(),
            })?,
    })
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidEnum {
        field: field.into(),
        value: value.into(),
    })
}

/// SQLite-backed [`ReportStore`]. The connection sits behind a Mutex because
/// rusqlite connections are not Sync and the pipelines are shared across
/// request handlers.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
}

impl SqliteReportStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ReportStore for SqliteReportStore {
    fn create_report(&self, report: &RiskReport) -> Result<Uuid, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        insert_report(&conn, report)
    }

    fn get_report(&self, id: &Uuid) -> Result<Option<RiskReport>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        get_report(&conn, id)
    }

    fn list_reports_for_patient(&self, patient_id: &Uuid) -> Result<Vec<RiskReport>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        list_reports_for_patient(&conn, patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sample_report(patient_id: Uuid, pct: f64) -> RiskReport {
        RiskReport::new(patient_id, pct, RiskLabel::from_percentage(pct), "expr.csv")
    }

    #[test]
    fn insert_then_get_round_trips() {
        let conn = open_memory_database().unwrap();
        let report = sample_report(Uuid::new_v4(), 73.25);

        let id = insert_report(&conn, &report).unwrap();
        let fetched = get_report(&conn, &id).unwrap().unwrap();

        assert_eq!(fetched.id, report.id);
        assert_eq!(fetched.patient_id, report.patient_id);
        assert_eq!(fetched.risk_percentage, 73.25);
        assert_eq!(fetched.result_label, RiskLabel::HighRisk);
        assert_eq!(fetched.file_name, "expr.csv");
    }

    #[test]
    fn get_missing_report_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_report(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_filters_by_patient_newest_first() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut first = sample_report(patient, 10.0);
        first.created_at = NaiveDateTime::from_str("2025-01-01T08:00:00").unwrap();
        let mut second = sample_report(patient, 60.0);
        second.created_at = NaiveDateTime::from_str("2025-03-01T08:00:00").unwrap();

        insert_report(&conn, &first).unwrap();
        insert_report(&conn, &second).unwrap();
        insert_report(&conn, &sample_report(other, 99.0)).unwrap();

        let reports = list_reports_for_patient(&conn, &patient).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, second.id);
        assert_eq!(reports[1].id, first.id);
    }

    #[test]
    fn store_trait_creates_reports() {
        let store = SqliteReportStore::new(open_memory_database().unwrap());
        let report = sample_report(Uuid::new_v4(), 42.0);
        let id = store.create_report(&report).unwrap();
        assert_eq!(store.get_report(&id).unwrap().unwrap().id, report.id);
    }
}
