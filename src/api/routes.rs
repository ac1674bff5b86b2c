use crate::config::Config;
use crate::db::{Database, HabitRow};
use crate::stats::HabitStats;
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/habits", get(habit_list).post(habit_create))
        .route("/api/v1/habit/:id", get(habit_detail).delete(habit_delete))
        .route("/api/v1/habit/:id/toggle/:date", post(habit_toggle))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HabitCreatePayload {
    name: String,
    #[serde(default)]
    is_bad: bool,
}

#[derive(Debug, Serialize)]
struct HabitSummary {
    id: i64,
    name: String,
    is_bad: bool,
    completed: bool,
    current_streak: u32,
    longest_streak: u32,
    streak_text: String,
}

#[derive(Debug, Serialize)]
struct HabitListPayload {
    date: String,
    prev_date: String,
    next_date: Option<String>,
    habits: Vec<HabitSummary>,
}

#[derive(Debug, Serialize)]
struct HabitDetailPayload {
    id: i64,
    name: String,
    is_bad: bool,
    date_created: String,
    date: String,
    longest_streak: u32,
    streak_text: String,
    stats: HabitStats,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    db_path: String,
    api_port: u16,
    habit_count: usize,
    latest_completion: Option<String>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = Database::open(&state.config.db_path)?;

    let payload = StatusPayload {
        db_path: state.config.db_path.display().to_string(),
        api_port: state.config.api_port,
        habit_count: database.habit_count()?,
        latest_completion: database
            .latest_completion()?
            .map(|date| date.format("%Y-%m-%d").to_string()),
    };

    Ok(Json(payload))
}

async fn habit_list(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<HabitListPayload>> {
    let today = Local::now().date_naive();
    let date = resolve_query_date(query.date.as_deref(), today)?;

    let database = Database::open(&state.config.db_path)?;
    let habits = database
        .list_habits()?
        .into_iter()
        .map(|habit| summarize(&database, &habit, date))
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(HabitListPayload {
        date: format_date(date),
        prev_date: format_date(date - Duration::days(1)),
        next_date: (date < today).then(|| format_date(date + Duration::days(1))),
        habits,
    }))
}

async fn habit_create(
    State(state): State<ApiState>,
    Json(payload): Json<HabitCreatePayload>,
) -> ApiResult<Json<HabitSummary>> {
    let today = Local::now().date_naive();
    let database = Database::open(&state.config.db_path)?;

    validate_new_habit(&database, &payload.name)?;
    let habit = database.create_habit(&payload.name, today, payload.is_bad)?;

    let summary = summarize(&database, &habit, today)?;
    Ok(Json(summary))
}

// Caller mistakes (empty or duplicate name) are 400s; anything the store
// fails on past this point surfaces as a 500.
fn validate_new_habit(database: &Database, name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(
            "Habit name must not be empty".to_string(),
        ));
    }
    if database.habit_by_name(trimmed)?.is_some() {
        return Err(ApiError::BadRequest(format!(
            "A habit named '{trimmed}' already exists"
        )));
    }

    Ok(())
}

async fn habit_detail(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<HabitDetailPayload>> {
    let today = Local::now().date_naive();
    let date = resolve_query_date(query.date.as_deref(), today)?;

    let database = Database::open(&state.config.db_path)?;
    let habit = find_habit(&database, id)?;

    let completions = database.completions_for_habit(habit.id)?;
    let stats = HabitStats::compute(habit.is_bad, habit.date_created, &completions, date);

    Ok(Json(HabitDetailPayload {
        id: habit.id,
        name: habit.name,
        is_bad: habit.is_bad,
        date_created: format_date(habit.date_created),
        date: format_date(date),
        longest_streak: stats.longest_streak(),
        streak_text: stats.streak_text(),
        stats,
    }))
}

async fn habit_toggle(
    State(state): State<ApiState>,
    Path((id, date)): Path<(i64, String)>,
) -> ApiResult<Json<HabitSummary>> {
    let today = Local::now().date_naive();
    let date = parse_path_date(&date, today)?;

    let database = Database::open(&state.config.db_path)?;
    let habit = find_habit(&database, id)?;

    database.toggle_completion(habit.id, date)?;

    // Stats are always recomputed from the full history after a toggle;
    // there is no incremental update path.
    let summary = summarize(&database, &habit, date)?;
    Ok(Json(summary))
}

async fn habit_delete(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let database = Database::open(&state.config.db_path)?;

    if !database.delete_habit(id)? {
        return Err(ApiError::NotFound(format!("No habit with id {id}")));
    }

    Ok(Json(json!({ "deleted": true, "id": id })))
}

fn summarize(database: &Database, habit: &HabitRow, date: NaiveDate) -> Result<HabitSummary> {
    let completed = database.is_completed(habit.id, date)?;
    let completions = database.completions_for_habit(habit.id)?;
    let stats = HabitStats::compute(habit.is_bad, habit.date_created, &completions, date);

    Ok(HabitSummary {
        id: habit.id,
        name: habit.name.clone(),
        is_bad: habit.is_bad,
        completed,
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak(),
        streak_text: stats.streak_text(),
    })
}

fn find_habit(database: &Database, id: i64) -> Result<HabitRow, ApiError> {
    database
        .habit_by_id(id)?
        .ok_or_else(|| ApiError::NotFound(format!("No habit with id {id}")))
}

/// As-of date from a query string: anything missing or unparsable means
/// today. A date after today is still a usage error.
fn resolve_query_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let date = input
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or(today);

    reject_future(date, today)?;
    Ok(date)
}

/// Toggle dates arrive as a path segment and must be well-formed; there is
/// no sensible fallback for a write.
fn parse_path_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date format: {raw}. Example: 2026-02-18"))
    })?;

    reject_future(date, today)?;
    Ok(date)
}

fn reject_future(date: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if date > today {
        return Err(ApiError::BadRequest(format!(
            "Requested date {} is in the future",
            format_date(date)
        )));
    }

    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, parse_path_date, resolve_query_date, validate_new_habit};
    use crate::db::Database;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")
    }

    #[test]
    fn missing_query_date_falls_back_to_today() {
        assert_eq!(resolve_query_date(None, today()).expect("date"), today());
    }

    #[test]
    fn malformed_query_date_falls_back_to_today() {
        assert_eq!(
            resolve_query_date(Some("not-a-date"), today()).expect("date"),
            today()
        );
        assert_eq!(
            resolve_query_date(Some("10/03/2026"), today()).expect("date"),
            today()
        );
    }

    #[test]
    fn future_dates_are_rejected() {
        assert!(resolve_query_date(Some("2026-03-11"), today()).is_err());
        assert!(resolve_query_date(Some("2026-03-10"), today()).is_ok());
        assert!(parse_path_date("2026-03-11", today()).is_err());
    }

    #[test]
    fn malformed_toggle_path_date_is_rejected() {
        assert!(parse_path_date("10/03/2026", today()).is_err());
        assert_eq!(parse_path_date("2026-03-09", today()).expect("date"), today() - chrono::Duration::days(1));
    }

    #[test]
    fn habit_validation_separates_caller_mistakes() {
        let dir = tempdir().expect("tempdir");
        let database = Database::open(&dir.path().join("habits.db")).expect("open database");
        database
            .create_habit("Read", today(), false)
            .expect("create habit");

        assert!(matches!(
            validate_new_habit(&database, "  "),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_new_habit(&database, "Read"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(validate_new_habit(&database, "Write").is_ok());
    }
}
