use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ApplyReport, CurriculumEntry, EquipmentConfigEntry, EquipmentRow, ExpansionConfig,
    ScheduleRow, TimetableSlot, Workbook, WorkbookError,
};

#[derive(Clone)]
pub struct AppState {
    workbook: Arc<RwLock<Workbook>>,
}

impl AppState {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook: Arc::new(RwLock::new(workbook)),
        }
    }

    fn workbook(&self) -> Arc<RwLock<Workbook>> {
        self.workbook.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<WorkbookError> for ApiError {
    fn from(value: WorkbookError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

/// Optional template for an apply call; without it the stored timetable slots are used.
#[derive(Debug, Default, Deserialize)]
struct ApplyPayload {
    #[serde(default)]
    slots: Option<Vec<TimetableSlot>>,
}

#[derive(Debug, Deserialize)]
struct WeekPayload {
    week: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Position {
    teacher_name: String,
    current_week: u32,
    view_date: NaiveDate,
    week1_anchor: NaiveDate,
}

impl Position {
    fn of(workbook: &Workbook) -> Self {
        Self {
            teacher_name: workbook.teacher_name().to_string(),
            current_week: workbook.current_week(),
            view_date: workbook.view_date(),
            week1_anchor: workbook.week1_anchor(),
        }
    }
}

/// Defaults to the selected teacher and the current week.
#[derive(Debug, Default, Deserialize)]
struct RowsQuery {
    teacher: Option<String>,
    week: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config).put(update_config))
        .route("/timetable", get(get_timetable).put(update_timetable))
        .route("/curriculum", get(get_curriculum).put(update_curriculum))
        .route(
            "/equipment-config",
            get(get_equipment_config).put(update_equipment_config),
        )
        .route("/teachers", get(list_teachers))
        .route("/teachers/:teacher/apply", post(apply_teacher))
        .route("/teachers/:teacher/select", post(select_teacher))
        .route("/teachers/:teacher/subjects", get(teacher_subjects))
        .route("/apply-all", post(apply_all))
        .route("/week", get(get_position).put(change_week))
        .route("/schedule", get(get_schedule).put(update_schedule))
        .route("/equipment", get(get_equipment).put(update_equipment))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, workbook: Workbook) -> std::io::Result<()> {
    let state = AppState::new(workbook);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<ExpansionConfig> {
    let workbook = state.workbook();
    let config = {
        let guard = workbook.read();
        guard.config().clone()
    };
    Json(config)
}

async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<ExpansionConfig>,
) -> Result<Json<ExpansionConfig>, ApiError> {
    let workbook = state.workbook();
    {
        let mut guard = workbook.write();
        guard.set_config(config)?;
    }
    let current = {
        let guard = workbook.read();
        guard.config().clone()
    };
    Ok(Json(current))
}

async fn get_timetable(State(state): State<AppState>) -> Json<Vec<TimetableSlot>> {
    let workbook = state.workbook();
    let slots = {
        let guard = workbook.read();
        guard.timetable().to_vec()
    };
    Json(slots)
}

async fn update_timetable(
    State(state): State<AppState>,
    Json(slots): Json<Vec<TimetableSlot>>,
) -> Result<Json<Vec<TimetableSlot>>, ApiError> {
    if let Some(slot) = slots.iter().find(|slot| slot.subject.trim().is_empty()) {
        return Err(ApiError::invalid(format!(
            "slot '{} period {}' has no subject",
            slot.day_of_week, slot.period
        )));
    }
    let workbook = state.workbook();
    {
        let mut guard = workbook.write();
        guard.set_timetable(slots.clone());
    }
    Ok(Json(slots))
}

async fn get_curriculum(State(state): State<AppState>) -> Json<Vec<CurriculumEntry>> {
    let workbook = state.workbook();
    let entries = {
        let guard = workbook.read();
        guard.curriculum().entries().to_vec()
    };
    Json(entries)
}

async fn update_curriculum(
    State(state): State<AppState>,
    Json(entries): Json<Vec<CurriculumEntry>>,
) -> Json<Vec<CurriculumEntry>> {
    let workbook = state.workbook();
    {
        let mut guard = workbook.write();
        guard.set_curriculum(entries.clone());
    }
    Json(entries)
}

async fn get_equipment_config(State(state): State<AppState>) -> Json<Vec<EquipmentConfigEntry>> {
    let workbook = state.workbook();
    let entries = {
        let guard = workbook.read();
        guard.equipment_config().entries().to_vec()
    };
    Json(entries)
}

async fn update_equipment_config(
    State(state): State<AppState>,
    Json(entries): Json<Vec<EquipmentConfigEntry>>,
) -> Json<Vec<EquipmentConfigEntry>> {
    let workbook = state.workbook();
    {
        let mut guard = workbook.write();
        guard.set_equipment_config(entries.clone());
    }
    Json(entries)
}

async fn list_teachers(State(state): State<AppState>) -> Json<Vec<String>> {
    let workbook = state.workbook();
    let teachers = {
        let guard = workbook.read();
        guard.teachers()
    };
    Json(teachers)
}

async fn apply_teacher(
    State(state): State<AppState>,
    Path(teacher): Path<String>,
    payload: Option<Json<ApplyPayload>>,
) -> Result<Json<ApplyReport>, ApiError> {
    if teacher.trim().is_empty() {
        return Err(ApiError::invalid("teacher name must not be blank"));
    }
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let workbook = state.workbook();
    let report = {
        let mut guard = workbook.write();
        let slots = match payload.slots {
            Some(slots) => slots,
            None => guard.slots_for_teacher(&teacher),
        };
        guard.apply_template(&slots, Some(&teacher))
    };
    Ok(Json(report))
}

async fn select_teacher(
    State(state): State<AppState>,
    Path(teacher): Path<String>,
) -> Json<ApplyReport> {
    let workbook = state.workbook();
    let report = {
        let mut guard = workbook.write();
        guard.select_teacher(&teacher)
    };
    Json(report)
}

async fn teacher_subjects(
    State(state): State<AppState>,
    Path(teacher): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let workbook = state.workbook();
    let subjects = {
        let guard = workbook.read();
        if !guard.timetable().iter().any(|slot| slot.taught_by(&teacher)) {
            return Err(ApiError::not_found(format!(
                "teacher '{teacher}' has no timetable slots"
            )));
        }
        guard.teacher_subjects(&teacher)
    };
    Ok(Json(subjects))
}

async fn apply_all(State(state): State<AppState>) -> Json<ApplyReport> {
    let workbook = state.workbook();
    let report = {
        let mut guard = workbook.write();
        guard.apply_all_teachers()
    };
    Json(report)
}

async fn get_position(State(state): State<AppState>) -> Json<Position> {
    let workbook = state.workbook();
    let position = {
        let guard = workbook.read();
        Position::of(&guard)
    };
    Json(position)
}

async fn change_week(
    State(state): State<AppState>,
    Json(payload): Json<WeekPayload>,
) -> Result<Json<Position>, ApiError> {
    let workbook = state.workbook();
    let position = {
        let mut guard = workbook.write();
        guard.change_week(payload.week)?;
        Position::of(&guard)
    };
    Ok(Json(position))
}

fn resolve_rows_query(workbook: &Workbook, query: RowsQuery) -> (String, u32) {
    let teacher = query
        .teacher
        .unwrap_or_else(|| workbook.teacher_name().to_string());
    let week = query.week.unwrap_or(workbook.current_week());
    (teacher, week)
}

async fn get_schedule(
    State(state): State<AppState>,
    Query(query): Query<RowsQuery>,
) -> Json<Vec<ScheduleRow>> {
    let workbook = state.workbook();
    let rows = {
        let guard = workbook.read();
        let (teacher, week) = resolve_rows_query(&guard, query);
        guard.week_schedule(&teacher, week)
    };
    Json(rows)
}

async fn get_equipment(
    State(state): State<AppState>,
    Query(query): Query<RowsQuery>,
) -> Json<Vec<EquipmentRow>> {
    let workbook = state.workbook();
    let rows = {
        let guard = workbook.read();
        let (teacher, week) = resolve_rows_query(&guard, query);
        guard.week_equipment(&teacher, week)
    };
    Json(rows)
}

fn check_week_rows<'a>(
    workbook: &Workbook,
    rows: impl IntoIterator<Item = (&'a str, &'a str, u32)>,
) -> Result<(), ApiError> {
    if workbook.teacher_name().trim().is_empty() {
        return Err(ApiError::invalid("no teacher selected"));
    }
    for (id, teacher, week) in rows {
        if teacher != workbook.teacher_name() || week != workbook.current_week() {
            return Err(ApiError::invalid(format!(
                "row {id} is not in week {} of '{}'",
                workbook.current_week(),
                workbook.teacher_name()
            )));
        }
    }
    Ok(())
}

async fn update_schedule(
    State(state): State<AppState>,
    Json(rows): Json<Vec<ScheduleRow>>,
) -> Result<Json<Vec<ScheduleRow>>, ApiError> {
    let workbook = state.workbook();
    let current = {
        let mut guard = workbook.write();
        check_week_rows(
            &guard,
            rows.iter()
                .map(|row| (row.id.as_str(), row.teacher_name.as_str(), row.week)),
        )?;
        guard.replace_week_schedule(rows);
        let (teacher, week) = (guard.teacher_name().to_string(), guard.current_week());
        guard.week_schedule(&teacher, week)
    };
    Ok(Json(current))
}

async fn update_equipment(
    State(state): State<AppState>,
    Json(rows): Json<Vec<EquipmentRow>>,
) -> Result<Json<Vec<EquipmentRow>>, ApiError> {
    let workbook = state.workbook();
    let current = {
        let mut guard = workbook.write();
        check_week_rows(
            &guard,
            rows.iter()
                .map(|row| (row.id.as_str(), row.teacher_name.as_str(), row.week)),
        )?;
        guard.replace_week_equipment(rows);
        let (teacher, week) = (guard.teacher_name().to_string(), guard.current_week());
        guard.week_equipment(&teacher, week)
    };
    Ok(Json(current))
}
