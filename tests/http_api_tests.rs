#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use teaching_schedule::{
    ApplyReport, CurriculumEntry, ScheduleRow, TimetableSlot, Workbook, http_api,
};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let mut workbook = Workbook::new(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    workbook.set_timetable(vec![
        TimetableSlot::new("Thứ 2", 1, "Toán", "7A1").with_teacher("Cô Lan"),
        TimetableSlot::new("Thứ 3", 2, "Vật lý", "8B").with_teacher("Thầy Minh"),
    ]);
    workbook.set_curriculum(vec![CurriculumEntry::new("toán", "1", "Tập hợp")]);
    let state = http_api::AppState::new(workbook);
    http_api::router(state)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let response = app.oneshot(request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn select_teacher_applies_and_week_view_lists_rows() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(request("POST", "/teachers/C%C3%B4%20Lan/select", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: ApplyReport = read_json(response).await;
    assert!(report.is_applied());
    assert_eq!(report.summaries[0].generated_rows, 35);

    let response = app
        .clone()
        .oneshot(request("GET", "/schedule", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rows: Vec<ScheduleRow> = read_json(response).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].week, 1);
    assert_eq!(rows[0].lesson_name, "Tập hợp");
    assert_eq!(rows[0].subject, "Toán 7");

    let response = app
        .oneshot(request("GET", "/schedule?week=2", None))
        .await
        .unwrap();
    let rows: Vec<ScheduleRow> = read_json(response).await;
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 9, 8).unwrap());
    assert_eq!(rows[0].ppct_number, "2");
}

#[tokio::test]
async fn apply_accepts_explicit_slots() {
    let app = new_router();
    let payload = json!({
        "slots": [
            {"dayOfWeek": "Thursday", "period": 3, "subject": "Sinh học", "className": "9A"}
        ]
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/teachers/Hoa/apply", Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: ApplyReport = read_json(response).await;
    assert_eq!(report.summaries[0].teacher_name, "Hoa");

    let response = app
        .oneshot(request("GET", "/schedule?teacher=Hoa&week=1", None))
        .await
        .unwrap();
    let rows: Vec<ScheduleRow> = read_json(response).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].day_of_week, "Thứ 5");
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 9, 4).unwrap());
}

#[tokio::test]
async fn apply_without_body_uses_stored_timetable() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request("POST", "/teachers/Th%E1%BA%A7y%20Minh/apply", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: ApplyReport = read_json(response).await;
    assert_eq!(report.summaries[0].generated_rows, 35);
}

#[tokio::test]
async fn apply_all_and_teacher_listing() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request("GET", "/teachers", None))
        .await
        .unwrap();
    let teachers: Vec<String> = read_json(response).await;
    assert_eq!(teachers, vec!["Cô Lan", "Thầy Minh"]);

    let response = app
        .oneshot(request("POST", "/apply-all", None))
        .await
        .unwrap();
    let report: ApplyReport = read_json(response).await;
    assert_eq!(report.summaries.len(), 2);
}

#[tokio::test]
async fn out_of_range_weeks_are_rejected() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request("PUT", "/week", Some(json!({"week": 0}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");

    let response = app
        .clone()
        .oneshot(request("PUT", "/week", Some(json!({"week": 4294967295u64}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("PUT", "/week", Some(json!({"week": 3}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["currentWeek"], 3);
    assert_eq!(body["viewDate"], "2025-09-15");
    assert_eq!(body["week1Anchor"], "2025-09-01");
}

#[tokio::test]
async fn week_edits_replace_the_current_week() {
    let app = new_router();
    app.clone()
        .oneshot(request("POST", "/teachers/C%C3%B4%20Lan/select", None))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/schedule", None))
        .await
        .unwrap();
    let mut rows: Vec<ScheduleRow> = read_json(response).await;
    rows[0].notes = "Dự giờ".to_string();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/schedule",
            Some(serde_json::to_value(&rows).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Vec<ScheduleRow> = read_json(response).await;
    assert_eq!(updated[0].notes, "Dự giờ");

    let mut foreign = updated.clone();
    foreign[0].week = 7;
    let response = app
        .oneshot(request(
            "PUT",
            "/schedule",
            Some(serde_json::to_value(&foreign).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subjects_of_unknown_teacher_are_not_found() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request("GET", "/teachers/C%C3%B4%20Lan/subjects", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let subjects: Vec<String> = read_json(response).await;
    assert_eq!(subjects, vec!["Toán 7"]);

    let response = app
        .oneshot(request("GET", "/teachers/Nobody/subjects", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/config",
            Some(json!({"first_week": 50000000})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request(
            "PUT",
            "/config",
            Some(json!({"week_count": 0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
