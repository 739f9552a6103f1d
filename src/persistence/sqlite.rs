use super::{
    PersistenceError, PersistenceResult, WorkbookSnapshot, WorkbookStore, ensure_rows_belong_to,
    validate_rows,
};
use crate::Workbook;
use crate::config::ExpansionConfig;
use crate::timetable::{EquipmentRow, ScheduleRow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;

pub struct SqliteWorkbookStore {
    connection: Mutex<Connection>,
}

impl SqliteWorkbookStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS workbook_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                config_json TEXT NOT NULL,
                teacher_name TEXT NOT NULL,
                current_week INTEGER NOT NULL,
                view_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS timetable_slots (
                position INTEGER PRIMARY KEY,
                slot_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS curriculum_entries (
                position INTEGER PRIMARY KEY,
                entry_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS equipment_config_entries (
                position INTEGER PRIMARY KEY,
                entry_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS schedule_rows (
                id TEXT PRIMARY KEY,
                teacher_name TEXT NOT NULL,
                week INTEGER NOT NULL,
                row_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS schedule_rows_teacher_week
                ON schedule_rows (teacher_name, week);
            CREATE TABLE IF NOT EXISTS equipment_rows (
                id TEXT PRIMARY KEY,
                teacher_name TEXT NOT NULL,
                week INTEGER NOT NULL,
                row_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS equipment_rows_teacher_week
                ON equipment_rows (teacher_name, week);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_state(&self, tx: &Transaction, snapshot: &WorkbookSnapshot) -> PersistenceResult<()> {
        let config_json = serde_json::to_string(&snapshot.config)?;
        tx.execute("DELETE FROM workbook_state", [])?;
        tx.execute(
            "INSERT INTO workbook_state (id, config_json, teacher_name, current_week, view_date)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                config_json,
                snapshot.teacher_name,
                snapshot.current_week,
                snapshot.view_date.format("%Y-%m-%d").to_string()
            ],
        )?;
        Ok(())
    }

    fn save_list<T: Serialize>(
        &self,
        tx: &Transaction,
        table: &str,
        column: &str,
        items: &[T],
    ) -> PersistenceResult<()> {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (position, {column}) VALUES (?1, ?2)"
        ))?;
        for (position, item) in items.iter().enumerate() {
            let json = serde_json::to_string(item)?;
            stmt.execute(params![position as i64, json])?;
        }
        Ok(())
    }

    fn insert_rows(
        tx: &Transaction,
        schedule: &[ScheduleRow],
        equipment: &[EquipmentRow],
    ) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO schedule_rows (id, teacher_name, week, row_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in schedule {
            let json = serde_json::to_string(row)?;
            stmt.execute(params![row.id, row.teacher_name, row.week, json])?;
        }
        let mut stmt = tx.prepare(
            "INSERT INTO equipment_rows (id, teacher_name, week, row_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in equipment {
            let json = serde_json::to_string(row)?;
            stmt.execute(params![row.id, row.teacher_name, row.week, json])?;
        }
        Ok(())
    }

    fn load_list<T: DeserializeOwned>(
        conn: &Connection,
        sql: &str,
    ) -> PersistenceResult<Vec<T>> {
        Self::load_list_with(conn, sql, params![])
    }

    fn load_list_with<T: DeserializeOwned, P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for json in rows {
            items.push(serde_json::from_str(&json?)?);
        }
        Ok(items)
    }

    /// Stored rows of one teacher and week, without loading the rest of the workbook.
    pub fn load_week_rows(
        &self,
        teacher_name: &str,
        week: u32,
    ) -> PersistenceResult<(Vec<ScheduleRow>, Vec<EquipmentRow>)> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let schedule = Self::load_list_with(
            &conn,
            "SELECT row_json FROM schedule_rows WHERE teacher_name = ?1 AND week = ?2
             ORDER BY rowid ASC",
            params![teacher_name, week],
        )?;
        let equipment = Self::load_list_with(
            &conn,
            "SELECT row_json FROM equipment_rows WHERE teacher_name = ?1 AND week = ?2
             ORDER BY rowid ASC",
            params![teacher_name, week],
        )?;
        Ok((schedule, equipment))
    }
}

impl WorkbookStore for SqliteWorkbookStore {
    fn save_workbook(&self, workbook: &Workbook) -> PersistenceResult<()> {
        let snapshot = WorkbookSnapshot::from_workbook(workbook)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_state(&tx, &snapshot)?;
        self.save_list(&tx, "timetable_slots", "slot_json", &snapshot.timetable)?;
        self.save_list(&tx, "curriculum_entries", "entry_json", &snapshot.curriculum)?;
        self.save_list(
            &tx,
            "equipment_config_entries",
            "entry_json",
            &snapshot.equipment_config,
        )?;
        tx.execute("DELETE FROM schedule_rows", [])?;
        tx.execute("DELETE FROM equipment_rows", [])?;
        Self::insert_rows(&tx, &snapshot.schedule, &snapshot.equipment)?;
        tx.commit()?;
        Ok(())
    }

    fn load_workbook(&self) -> PersistenceResult<Option<Workbook>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare(
            "SELECT config_json, teacher_name, current_week, view_date FROM workbook_state WHERE id = 1",
        )?;
        let state: Option<(String, String, u32, String)> = stmt
            .query_row([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()?;
        let Some((config_json, teacher_name, current_week, view_date)) = state else {
            return Ok(None);
        };

        let config: ExpansionConfig = serde_json::from_str(&config_json)?;
        let view_date = NaiveDate::parse_from_str(&view_date, "%Y-%m-%d").map_err(|err| {
            PersistenceError::InvalidData(format!("invalid view date '{view_date}': {err}"))
        })?;

        let snapshot = WorkbookSnapshot {
            config,
            timetable: Self::load_list(
                &conn,
                "SELECT slot_json FROM timetable_slots ORDER BY position ASC",
            )?,
            curriculum: Self::load_list(
                &conn,
                "SELECT entry_json FROM curriculum_entries ORDER BY position ASC",
            )?,
            equipment_config: Self::load_list(
                &conn,
                "SELECT entry_json FROM equipment_config_entries ORDER BY position ASC",
            )?,
            schedule: Self::load_list(&conn, "SELECT row_json FROM schedule_rows ORDER BY rowid ASC")?,
            equipment: Self::load_list(
                &conn,
                "SELECT row_json FROM equipment_rows ORDER BY rowid ASC",
            )?,
            teacher_name,
            current_week,
            view_date,
        };
        snapshot.into_workbook().map(Some)
    }

    fn replace_teacher_rows(
        &self,
        teacher_name: &str,
        schedule: &[ScheduleRow],
        equipment: &[EquipmentRow],
    ) -> PersistenceResult<()> {
        validate_rows(schedule, equipment)?;
        ensure_rows_belong_to(teacher_name, schedule, equipment)?;

        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM schedule_rows WHERE teacher_name = ?1",
            params![teacher_name],
        )?;
        tx.execute(
            "DELETE FROM equipment_rows WHERE teacher_name = ?1",
            params![teacher_name],
        )?;
        Self::insert_rows(&tx, schedule, equipment)?;
        tx.commit()?;
        Ok(())
    }
}
