use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{ActionStatus, InspectionStatus, ItemResult, NewInspection, ReinspectionScope};
use super::query::{ActionFilter, InspectionFilter, Sort};
use super::service::InspectionTracker;
use crate::directory::Actor;
use crate::error::{LifecycleError, ValidationError};
use crate::ids::{ActionId, InspectionId, SchoolId, UserId};
use crate::repository::TrackerRepository;

/// Header carrying the acting user's id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Router builder exposing inspection and corrective action endpoints.
pub fn tracker_router<R>(tracker: Arc<InspectionTracker<R>>) -> Router
where
    R: TrackerRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/inspections",
            get(list_inspections::<R>).post(create_inspection::<R>),
        )
        .route("/api/v1/inspections/:id", get(inspection_detail::<R>))
        .route("/api/v1/inspections/:id/results", post(record_results::<R>))
        .route("/api/v1/inspections/:id/reinspection", post(reinspect::<R>))
        .route("/api/v1/corrective-actions", get(list_actions::<R>))
        .route("/api/v1/corrective-actions/:id/assign", post(assign_action::<R>))
        .route("/api/v1/corrective-actions/:id/start", post(start_action::<R>))
        .route("/api/v1/corrective-actions/:id/resolve", post(resolve_action::<R>))
        .route(
            "/api/v1/corrective-actions/:id/request-reinspection",
            post(request_reinspection::<R>),
        )
        .with_state(tracker)
}

type Tracker<R> = State<Arc<InspectionTracker<R>>>;

/// Raw list parameters; parsed by hand so bad values surface as field errors.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    school: Option<String>,
    status: Option<String>,
    date: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn school(&self) -> Result<Option<SchoolId>, ValidationError> {
        non_empty(&self.school)
            .map(|raw| {
                raw.parse::<i64>().map(SchoolId).map_err(|_| {
                    ValidationError::new("school", format!("'{raw}' is not a school id"))
                })
            })
            .transpose()
    }

    fn status<S>(&self) -> Result<Option<S>, ValidationError>
    where
        S: FromStr,
        S::Err: std::fmt::Display,
    {
        non_empty(&self.status)
            .map(|raw| {
                raw.parse::<S>()
                    .map_err(|err| ValidationError::new("status", err.to_string()))
            })
            .transpose()
    }

    fn date(&self) -> Result<Option<NaiveDate>, ValidationError> {
        non_empty(&self.date)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    ValidationError::new("date", format!("'{raw}' is not a YYYY-MM-DD date"))
                })
            })
            .transpose()
    }

    fn sort(&self) -> Result<Sort, ValidationError> {
        non_empty(&self.sort)
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// `scope=all_unresolved` or `scope=<action id>` opens the detail in a reinspection scope.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailParams {
    scope: Option<String>,
}

impl DetailParams {
    fn scope(&self) -> Result<Option<ReinspectionScope>, ValidationError> {
        non_empty(&self.scope)
            .map(|raw| match raw {
                "all_unresolved" => Ok(ReinspectionScope::AllUnresolved),
                _ => raw
                    .parse::<i64>()
                    .map(|id| ReinspectionScope::Action(ActionId(id)))
                    .map_err(|_| {
                        ValidationError::new(
                            "scope",
                            format!("'{raw}' is neither an action id nor all_unresolved"),
                        )
                    }),
            })
            .transpose()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsRequest {
    #[serde(default)]
    items: Vec<ItemResult>,
    #[serde(default)]
    complete: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReinspectionRequest {
    scope: ReinspectionScope,
    #[serde(default)]
    items: Vec<ItemResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    assigned_to: Option<UserId>,
}

fn authenticate<R>(
    tracker: &InspectionTracker<R>,
    headers: &HeaderMap,
) -> Result<Actor, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let id = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or(LifecycleError::Unauthenticated)?;
    tracker.actor(UserId(id))
}

pub(crate) async fn create_inspection<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Json(request): Json<NewInspection>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let record = tracker.create_inspection(request, &actor)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn list_inspections<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let filter = InspectionFilter {
        school_id: params.school()?,
        status: params.status::<InspectionStatus>()?,
        date: params.date()?,
    };
    let rows = tracker.visible_inspections(filter, params.sort()?, &actor)?;
    Ok(Json(rows).into_response())
}

pub(crate) async fn inspection_detail<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<DetailParams>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let scope = params.scope()?;
    let view = tracker.inspection_in_scope(InspectionId(id), scope, &actor)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn record_results<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<ResultsRequest>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let record =
        tracker.record_results(InspectionId(id), &request.items, request.complete, &actor)?;
    Ok(Json(record).into_response())
}

pub(crate) async fn reinspect<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<ReinspectionRequest>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let reinspection =
        tracker.reinspect(InspectionId(id), request.scope, &request.items, &actor)?;
    Ok(Json(reinspection).into_response())
}

pub(crate) async fn list_actions<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let filter = ActionFilter {
        school_id: params.school()?,
        status: params.status::<ActionStatus>()?,
        date: params.date()?,
    };
    let rows = tracker.visible_actions(filter, params.sort()?, &actor)?;
    Ok(Json(rows).into_response())
}

pub(crate) async fn assign_action<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<AssignRequest>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let action = tracker.assign_action(ActionId(id), request.assigned_to, &actor)?;
    Ok(Json(action).into_response())
}

pub(crate) async fn start_action<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let action = tracker.start_action(ActionId(id), &actor)?;
    Ok(Json(action).into_response())
}

pub(crate) async fn resolve_action<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let action = tracker.resolve_action(ActionId(id), &actor)?;
    Ok(Json(action).into_response())
}

pub(crate) async fn request_reinspection<R>(
    State(tracker): Tracker<R>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, LifecycleError>
where
    R: TrackerRepository + 'static,
{
    let actor = authenticate(&tracker, &headers)?;
    let action = tracker.request_reinspection(ActionId(id), &actor)?;
    Ok(Json(action).into_response())
}
