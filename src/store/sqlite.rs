//! SQLite-backed store.
//!
//! Every transaction starts with `BEGIN IMMEDIATE`, taking the database write
//! lock up front so a shift read inside the transaction stays current until
//! commit. Status transitions are `UPDATE ... WHERE status = ?` statements
//! whose changed-row count is returned to the caller. A partial unique index
//! keeps at most one open segment per shift even against writers that bypass
//! this crate.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior, params,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, KpiTemplate, OfferStatus, PayrollPeriod, ReplacementOffer, ReplacementStatus,
    ScheduledShift, ShiftAssignment, UnknownVariant, WorkSegment,
};

use super::{ShiftStore, StoreTx};

const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

CREATE TABLE IF NOT EXISTS employees (
  id BLOB PRIMARY KEY,
  partner_id BLOB NOT NULL,
  branch_id BLOB NOT NULL,
  position TEXT NOT NULL,
  status TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS branch_managers (
  branch_id BLOB NOT NULL,
  manager_id BLOB NOT NULL,
  PRIMARY KEY (branch_id, manager_id)
);

CREATE TABLE IF NOT EXISTS scheduled_shifts (
  id BLOB PRIMARY KEY,
  employee_id BLOB,
  branch_id BLOB NOT NULL,
  position TEXT NOT NULL,
  date TEXT NOT NULL,
  planned_start TEXT NOT NULL,
  planned_end TEXT NOT NULL,
  status TEXT NOT NULL,
  attendance_status TEXT NOT NULL,
  actual_start_at TEXT,
  actual_end_at TEXT,
  late_minutes INTEGER NOT NULL DEFAULT 0,
  no_show_at TEXT,
  no_show_employee_id BLOB,
  no_show_reason_json TEXT,
  confirmation_status TEXT NOT NULL,
  confirmed_at TEXT,
  decline_json TEXT,
  is_replacement INTEGER NOT NULL DEFAULT 0,
  original_shift_id BLOB,
  replacement_status TEXT NOT NULL DEFAULT 'none'
);

CREATE INDEX IF NOT EXISTS idx_shifts_employee_date ON scheduled_shifts(employee_id, date);
CREATE INDEX IF NOT EXISTS idx_shifts_date ON scheduled_shifts(date);
CREATE INDEX IF NOT EXISTS idx_shifts_original ON scheduled_shifts(original_shift_id);

CREATE TABLE IF NOT EXISTS work_segments (
  id BLOB PRIMARY KEY,
  shift_id BLOB NOT NULL,
  segment_start_at TEXT NOT NULL,
  segment_end_at TEXT,
  start_location_valid INTEGER,
  end_location_valid INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_segments_one_open
  ON work_segments(shift_id) WHERE segment_end_at IS NULL;

CREATE TABLE IF NOT EXISTS shift_assignments (
  id BLOB PRIMARY KEY,
  shift_id BLOB NOT NULL,
  employee_id BLOB NOT NULL,
  status TEXT NOT NULL,
  confirmed_at TEXT,
  declined_at TEXT,
  decline_reason_id BLOB,
  decline_comment TEXT
);

CREATE INDEX IF NOT EXISTS idx_assignments_shift ON shift_assignments(shift_id);

CREATE TABLE IF NOT EXISTS replacement_offers (
  id BLOB PRIMARY KEY,
  shift_id BLOB NOT NULL,
  employee_id BLOB NOT NULL,
  status TEXT NOT NULL,
  offered_at TEXT NOT NULL,
  responded_at TEXT,
  eta_minutes INTEGER,
  seq INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_offers_shift ON replacement_offers(shift_id, seq);

CREATE TABLE IF NOT EXISTS payroll_periods (
  id BLOB PRIMARY KEY,
  partner_id BLOB NOT NULL,
  period_start TEXT NOT NULL,
  period_end TEXT NOT NULL,
  status TEXT NOT NULL,
  closed_at TEXT
);

CREATE TABLE IF NOT EXISTS kpi_templates (
  id BLOB PRIMARY KEY,
  partner_id BLOB NOT NULL,
  body_json TEXT NOT NULL
);
"#;

const SHIFT_COLUMNS: &str = "id, employee_id, branch_id, position, date, planned_start, \
     planned_end, status, attendance_status, actual_start_at, actual_end_at, late_minutes, \
     no_show_at, no_show_employee_id, no_show_reason_json, confirmation_status, confirmed_at, \
     decline_json, is_replacement, original_shift_id, replacement_status";

const SEGMENT_COLUMNS: &str =
    "id, shift_id, segment_start_at, segment_end_at, start_location_valid, end_location_valid";

const ASSIGNMENT_COLUMNS: &str = "id, shift_id, employee_id, status, confirmed_at, declined_at, \
     decline_reason_id, decline_comment";

const OFFER_COLUMNS: &str =
    "id, shift_id, employee_id, status, offered_at, responded_at, eta_minutes";

/// A [`ShiftStore`] persisted in a SQLite database.
#[derive(Debug)]
pub struct SqliteShiftStore {
    conn: Mutex<Connection>,
}

impl SqliteShiftStore {
    /// Opens (or creates) a database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> EngineResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ShiftStore for SqliteShiftStore {
    fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> EngineResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| EngineError::storage("sqlite connection lock poisoned"))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = {
            let mut store_tx = SqliteTx { tx: &tx };
            f(&mut store_tx)?
        };
        tx.commit()?;
        Ok(value)
    }
}

struct SqliteTx<'a, 'c> {
    tx: &'a Transaction<'c>,
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn status_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| serde_json::from_str(&t).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn to_json<T: Serialize>(value: Option<&T>) -> EngineResult<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(EngineError::storage)
}

fn map_shift(row: &Row<'_>) -> rusqlite::Result<ScheduledShift> {
    Ok(ScheduledShift {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        branch_id: row.get(2)?,
        position: row.get(3)?,
        date: row.get(4)?,
        planned_start: row.get(5)?,
        planned_end: row.get(6)?,
        status: status_column(row, 7)?,
        attendance_status: status_column(row, 8)?,
        actual_start_at: row.get(9)?,
        actual_end_at: row.get(10)?,
        late_minutes: row.get(11)?,
        no_show_at: row.get(12)?,
        no_show_employee_id: row.get(13)?,
        no_show_reason: json_column(row, 14)?,
        confirmation_status: status_column(row, 15)?,
        confirmed_at: row.get(16)?,
        decline: json_column(row, 17)?,
        is_replacement: row.get(18)?,
        original_shift_id: row.get(19)?,
        replacement_status: status_column(row, 20)?,
    })
}

fn map_segment(row: &Row<'_>) -> rusqlite::Result<WorkSegment> {
    Ok(WorkSegment {
        id: row.get(0)?,
        shift_id: row.get(1)?,
        segment_start_at: row.get(2)?,
        segment_end_at: row.get(3)?,
        start_location_valid: row.get(4)?,
        end_location_valid: row.get(5)?,
    })
}

fn map_assignment(row: &Row<'_>) -> rusqlite::Result<ShiftAssignment> {
    Ok(ShiftAssignment {
        id: row.get(0)?,
        shift_id: row.get(1)?,
        employee_id: row.get(2)?,
        status: status_column(row, 3)?,
        confirmed_at: row.get(4)?,
        declined_at: row.get(5)?,
        decline_reason_id: row.get(6)?,
        decline_comment: row.get(7)?,
    })
}

fn map_offer(row: &Row<'_>) -> rusqlite::Result<ReplacementOffer> {
    Ok(ReplacementOffer {
        id: row.get(0)?,
        shift_id: row.get(1)?,
        employee_id: row.get(2)?,
        status: status_column(row, 3)?,
        offered_at: row.get(4)?,
        responded_at: row.get(5)?,
        eta_minutes: row.get(6)?,
    })
}

impl SqliteTx<'_, '_> {
    fn query_shifts(
        &self,
        where_clause: &str,
        params: impl rusqlite::Params,
    ) -> EngineResult<Vec<ScheduledShift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM scheduled_shifts WHERE {where_clause} \
             ORDER BY date, planned_start, id"
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params, map_shift)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn write_shift(&self, sql: &str, shift: &ScheduledShift) -> EngineResult<usize> {
        let changed = self.tx.execute(
            sql,
            params![
                shift.id,
                shift.employee_id,
                shift.branch_id,
                shift.position,
                shift.date,
                shift.planned_start,
                shift.planned_end,
                shift.status.as_str(),
                shift.attendance_status.as_str(),
                shift.actual_start_at,
                shift.actual_end_at,
                shift.late_minutes,
                shift.no_show_at,
                shift.no_show_employee_id,
                to_json(shift.no_show_reason.as_ref())?,
                shift.confirmation_status.as_str(),
                shift.confirmed_at,
                to_json(shift.decline.as_ref())?,
                shift.is_replacement,
                shift.original_shift_id,
                shift.replacement_status.as_str(),
            ],
        )?;
        Ok(changed)
    }
}

impl StoreTx for SqliteTx<'_, '_> {
    fn shift_for_update(&mut self, shift_id: Uuid) -> EngineResult<ScheduledShift> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM scheduled_shifts WHERE id = ?1");
        self.tx
            .query_row(&sql, params![shift_id], map_shift)
            .optional()?
            .ok_or(EngineError::ShiftNotFound { shift_id })
    }

    fn insert_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()> {
        let sql = format!(
            "INSERT INTO scheduled_shifts ({SHIFT_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?21)"
        );
        self.write_shift(&sql, shift)?;
        Ok(())
    }

    fn update_shift(&mut self, shift: &ScheduledShift) -> EngineResult<()> {
        let sql = r#"
            UPDATE scheduled_shifts SET
              employee_id = ?2, branch_id = ?3, position = ?4, date = ?5, planned_start = ?6,
              planned_end = ?7, status = ?8, attendance_status = ?9, actual_start_at = ?10,
              actual_end_at = ?11, late_minutes = ?12, no_show_at = ?13,
              no_show_employee_id = ?14, no_show_reason_json = ?15, confirmation_status = ?16,
              confirmed_at = ?17, decline_json = ?18, is_replacement = ?19,
              original_shift_id = ?20, replacement_status = ?21
            WHERE id = ?1
        "#;
        match self.write_shift(sql, shift)? {
            0 => Err(EngineError::ShiftNotFound { shift_id: shift.id }),
            _ => Ok(()),
        }
    }

    fn delete_shift(&mut self, shift_id: Uuid) -> EngineResult<()> {
        self.tx.execute(
            "DELETE FROM work_segments WHERE shift_id = ?1",
            params![shift_id],
        )?;
        self.tx.execute(
            "DELETE FROM shift_assignments WHERE shift_id = ?1",
            params![shift_id],
        )?;
        self.tx.execute(
            "DELETE FROM replacement_offers WHERE shift_id = ?1",
            params![shift_id],
        )?;
        let deleted = self.tx.execute(
            "DELETE FROM scheduled_shifts WHERE id = ?1",
            params![shift_id],
        )?;
        if deleted == 0 {
            return Err(EngineError::ShiftNotFound { shift_id });
        }
        Ok(())
    }

    fn shifts_for_employee_on(
        &mut self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Vec<ScheduledShift>> {
        self.query_shifts("employee_id = ?1 AND date = ?2", params![employee_id, date])
    }

    fn shifts_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ScheduledShift>> {
        self.query_shifts("date >= ?1 AND date <= ?2", params![from, to])
    }

    fn shifts_referencing(&mut self, original_shift_id: Uuid) -> EngineResult<Vec<ScheduledShift>> {
        self.query_shifts("original_shift_id = ?1", params![original_shift_id])
    }

    fn segments_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<WorkSegment>> {
        let sql = format!(
            "SELECT {SEGMENT_COLUMNS} FROM work_segments WHERE shift_id = ?1 \
             ORDER BY segment_start_at"
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params![shift_id], map_segment)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_open_segment(&mut self, segment: &WorkSegment) -> EngineResult<()> {
        let result = self.tx.execute(
            &format!(
                "INSERT INTO work_segments ({SEGMENT_COLUMNS}) VALUES (?1, ?2, ?3, NULL, ?4, NULL)"
            ),
            params![
                segment.id,
                segment.shift_id,
                segment.segment_start_at,
                segment.start_location_valid,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(EngineError::SegmentAlreadyOpen {
                    shift_id: segment.shift_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn close_open_segment(
        &mut self,
        shift_id: Uuid,
        end_at: NaiveDateTime,
        end_location_valid: Option<bool>,
    ) -> EngineResult<usize> {
        let changed = self.tx.execute(
            r#"
            UPDATE work_segments
            SET segment_end_at = ?2, end_location_valid = ?3
            WHERE shift_id = ?1 AND segment_end_at IS NULL AND segment_start_at <= ?2
            "#,
            params![shift_id, end_at, end_location_valid],
        )?;
        Ok(changed)
    }

    fn active_assignment(&mut self, shift_id: Uuid) -> EngineResult<Option<ShiftAssignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE shift_id = ?1 AND status <> 'declined' LIMIT 1"
        );
        Ok(self
            .tx
            .query_row(&sql, params![shift_id], map_assignment)
            .optional()?)
    }

    fn save_assignment(&mut self, assignment: &ShiftAssignment) -> EngineResult<()> {
        self.tx.execute(
            &format!(
                "INSERT OR REPLACE INTO shift_assignments ({ASSIGNMENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                assignment.id,
                assignment.shift_id,
                assignment.employee_id,
                assignment.status.as_str(),
                assignment.confirmed_at,
                assignment.declined_at,
                assignment.decline_reason_id,
                assignment.decline_comment,
            ],
        )?;
        Ok(())
    }

    fn insert_offer(&mut self, offer: &ReplacementOffer) -> EngineResult<()> {
        self.tx.execute(
            &format!(
                "INSERT INTO replacement_offers ({OFFER_COLUMNS}, seq) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, \
                  (SELECT COALESCE(MAX(seq), 0) + 1 FROM replacement_offers))"
            ),
            params![
                offer.id,
                offer.shift_id,
                offer.employee_id,
                offer.status.as_str(),
                offer.offered_at,
                offer.responded_at,
                offer.eta_minutes,
            ],
        )?;
        Ok(())
    }

    fn offer(&mut self, offer_id: Uuid) -> EngineResult<Option<ReplacementOffer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM replacement_offers WHERE id = ?1");
        Ok(self
            .tx
            .query_row(&sql, params![offer_id], map_offer)
            .optional()?)
    }

    fn offers_for_shift(&mut self, shift_id: Uuid) -> EngineResult<Vec<ReplacementOffer>> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM replacement_offers WHERE shift_id = ?1 ORDER BY seq"
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params![shift_id], map_offer)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn transition_offer(
        &mut self,
        offer_id: Uuid,
        from: OfferStatus,
        to: OfferStatus,
        at: NaiveDateTime,
        eta_minutes: Option<u32>,
    ) -> EngineResult<usize> {
        let changed = self.tx.execute(
            r#"
            UPDATE replacement_offers
            SET status = ?3, responded_at = ?4, eta_minutes = COALESCE(?5, eta_minutes)
            WHERE id = ?1 AND status = ?2
            "#,
            params![offer_id, from.as_str(), to.as_str(), at, eta_minutes],
        )?;
        Ok(changed)
    }

    fn transition_replacement(
        &mut self,
        shift_id: Uuid,
        from: ReplacementStatus,
        to: ReplacementStatus,
    ) -> EngineResult<usize> {
        let changed = self.tx.execute(
            "UPDATE scheduled_shifts SET replacement_status = ?3 \
             WHERE id = ?1 AND replacement_status = ?2",
            params![shift_id, from.as_str(), to.as_str()],
        )?;
        Ok(changed)
    }

    fn employee(&mut self, employee_id: Uuid) -> EngineResult<Option<Employee>> {
        Ok(self
            .tx
            .query_row(
                "SELECT id, partner_id, branch_id, position, status FROM employees WHERE id = ?1",
                params![employee_id],
                |row| {
                    Ok(Employee {
                        id: row.get(0)?,
                        partner_id: row.get(1)?,
                        branch_id: row.get(2)?,
                        position: row.get(3)?,
                        status: status_column(row, 4)?,
                    })
                },
            )
            .optional()?)
    }

    fn save_employee(&mut self, employee: &Employee) -> EngineResult<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO employees (id, partner_id, branch_id, position, status) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                employee.id,
                employee.partner_id,
                employee.branch_id,
                employee.position,
                employee.status.as_str(),
            ],
        )?;
        Ok(())
    }

    fn responsible_managers(&mut self, branch_id: Uuid) -> EngineResult<Vec<Uuid>> {
        let mut stmt = self.tx.prepare(
            "SELECT manager_id FROM branch_managers WHERE branch_id = ?1 ORDER BY manager_id",
        )?;
        let rows = stmt.query_map(params![branch_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<Uuid>>>()?)
    }

    fn add_responsible_manager(&mut self, branch_id: Uuid, manager_id: Uuid) -> EngineResult<()> {
        self.tx.execute(
            "INSERT OR IGNORE INTO branch_managers (branch_id, manager_id) VALUES (?1, ?2)",
            params![branch_id, manager_id],
        )?;
        Ok(())
    }

    fn payroll_period(&mut self, period_id: Uuid) -> EngineResult<Option<PayrollPeriod>> {
        Ok(self
            .tx
            .query_row(
                "SELECT id, partner_id, period_start, period_end, status, closed_at \
                 FROM payroll_periods WHERE id = ?1",
                params![period_id],
                |row| {
                    Ok(PayrollPeriod {
                        id: row.get(0)?,
                        partner_id: row.get(1)?,
                        period_start: row.get(2)?,
                        period_end: row.get(3)?,
                        status: status_column(row, 4)?,
                        closed_at: row.get(5)?,
                    })
                },
            )
            .optional()?)
    }

    fn save_payroll_period(&mut self, period: &PayrollPeriod) -> EngineResult<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO payroll_periods \
             (id, partner_id, period_start, period_end, status, closed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                period.id,
                period.partner_id,
                period.period_start,
                period.period_end,
                period.status.as_str(),
                period.closed_at,
            ],
        )?;
        Ok(())
    }

    fn kpi_templates(&mut self, partner_id: Uuid) -> EngineResult<Vec<KpiTemplate>> {
        let mut stmt = self
            .tx
            .prepare("SELECT body_json FROM kpi_templates WHERE partner_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![partner_id], |row| row.get::<_, String>(0))?;
        let mut templates = Vec::new();
        for body in rows {
            templates.push(serde_json::from_str(&body?).map_err(EngineError::storage)?);
        }
        Ok(templates)
    }

    fn save_kpi_template(&mut self, template: &KpiTemplate) -> EngineResult<()> {
        let body = serde_json::to_string(template).map_err(EngineError::storage)?;
        self.tx.execute(
            "INSERT OR REPLACE INTO kpi_templates (id, partner_id, body_json) VALUES (?1, ?2, ?3)",
            params![template.id, template.partner_id, body],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, NoShowReason, ReasonStatus};
    use chrono::NaiveTime;

    fn create_shift() -> ScheduledShift {
        ScheduledShift::new(
            Uuid::new_v4(),
            "courier",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .assigned_to(Uuid::new_v4())
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_shift_round_trips_through_sqlite() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let mut shift = create_shift();
        shift.no_show_at = Some(at(10));
        shift.no_show_reason = Some(NoShowReason {
            text: "sick".to_string(),
            submitted_at: at(11),
            status: ReasonStatus::Pending,
            decided_by: None,
            decided_at: None,
        });
        shift.late_minutes = 7;

        store.transaction(|tx| tx.insert_shift(&shift)).unwrap();
        let stored = store
            .transaction(|tx| tx.shift_for_update(shift.id))
            .unwrap();
        assert_eq!(stored, shift);
    }

    #[test]
    fn test_update_missing_shift_is_not_found() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let result = store.transaction(|tx| tx.update_shift(&create_shift()));
        assert!(matches!(result, Err(EngineError::ShiftNotFound { .. })));
    }

    #[test]
    fn test_partial_index_rejects_second_open_segment() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let shift = create_shift();
        store
            .transaction(|tx| {
                tx.insert_shift(&shift)?;
                tx.insert_open_segment(&WorkSegment::open(shift.id, at(9), None))
            })
            .unwrap();

        let second = store
            .transaction(|tx| tx.insert_open_segment(&WorkSegment::open(shift.id, at(10), None)));
        assert!(matches!(
            second,
            Err(EngineError::SegmentAlreadyOpen { .. })
        ));

        let segments = store
            .transaction(|tx| tx.segments_for_shift(shift.id))
            .unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_close_before_segment_start_changes_nothing() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let shift = create_shift();
        store
            .transaction(|tx| {
                tx.insert_shift(&shift)?;
                tx.insert_open_segment(&WorkSegment::open(shift.id, at(12), None))
            })
            .unwrap();

        let early = store
            .transaction(|tx| tx.close_open_segment(shift.id, at(9), None))
            .unwrap();
        assert_eq!(early, 0);
        let on_time = store
            .transaction(|tx| tx.close_open_segment(shift.id, at(12), None))
            .unwrap();
        assert_eq!(on_time, 1);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let shift = create_shift();
        let result: EngineResult<()> = store.transaction(|tx| {
            tx.insert_shift(&shift)?;
            Err(EngineError::storage("boom"))
        });
        assert!(result.is_err());
        let found = store.transaction(|tx| tx.shift_for_update(shift.id));
        assert!(matches!(found, Err(EngineError::ShiftNotFound { .. })));
    }

    #[test]
    fn test_replacement_transition_is_conditional() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let mut shift = create_shift();
        shift.replacement_status = ReplacementStatus::Offered;
        store.transaction(|tx| tx.insert_shift(&shift)).unwrap();

        let claim = |store: &SqliteShiftStore| {
            store
                .transaction(|tx| {
                    tx.transition_replacement(
                        shift.id,
                        ReplacementStatus::Offered,
                        ReplacementStatus::Accepted,
                    )
                })
                .unwrap()
        };
        assert_eq!(claim(&store), 1);
        assert_eq!(claim(&store), 0);
    }

    #[test]
    fn test_offers_keep_insertion_order() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let shift_id = Uuid::new_v4();
        let offers: Vec<ReplacementOffer> = (0..4)
            .map(|_| ReplacementOffer::new(shift_id, Uuid::new_v4(), at(9)))
            .collect();
        store
            .transaction(|tx| {
                for offer in &offers {
                    tx.insert_offer(offer)?;
                }
                Ok(())
            })
            .unwrap();

        let stored = store
            .transaction(|tx| tx.offers_for_shift(shift_id))
            .unwrap();
        let ids: Vec<Uuid> = stored.iter().map(|o| o.id).collect();
        let expected: Vec<Uuid> = offers.iter().map(|o| o.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_assignment_upsert_and_active_lookup() {
        let store = SqliteShiftStore::open_in_memory().unwrap();
        let shift_id = Uuid::new_v4();
        let mut assignment = ShiftAssignment::pending(shift_id, Uuid::new_v4());
        store
            .transaction(|tx| tx.save_assignment(&assignment))
            .unwrap();

        assignment.status = AssignmentStatus::Declined;
        store
            .transaction(|tx| tx.save_assignment(&assignment))
            .unwrap();

        let active = store
            .transaction(|tx| tx.active_assignment(shift_id))
            .unwrap();
        assert!(active.is_none());
    }
}
