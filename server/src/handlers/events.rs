use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use crate::auth::{AuthenticatedAccount, MaybeAccount};
use crate::models::{Event, EventId, EventRequest, PageParams, PageRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::hal::{links, EntityModel, Links, PagedModel};
use crate::utils::response::hal_at;

const EVENT_LIST: &str = "eventList";

fn persisted_id(event: &Event) -> Result<EventId, AppError> {
    event
        .id
        .ok_or_else(|| AppError::InternalServerError("event was stored without an id".to_string()))
}

fn event_model(event: Event, id: EventId) -> EntityModel<Event> {
    EntityModel::new(event, Links::new().with("self", links::event(id)))
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;

    let event = state.events.create(request, &account).await?;
    let id = persisted_id(&event)?;

    let mut model = event_model(event, id);
    model.add_link("query-events", links::events());
    model.add_link("update-event", links::event(id));
    model.add_link("profile", links::profile("resources-events-create"));

    Ok(hal_at(StatusCode::CREATED, &links::event_path(id), &model))
}

pub async fn query_events(
    State(state): State<AppState>,
    MaybeAccount(account): MaybeAccount,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let request = PageRequest::try_from(params)?;

    let page = state.events.list(&request).await?;
    let page = page.map(|event| match event.id {
        Some(id) => event_model(event, id),
        None => EntityModel::new(event, Links::new()),
    });

    let mut model = PagedModel::new(EVENT_LIST, page, &request, links::events_page);
    model.add_link("profile", links::profile("resources-events-list"));
    if account.is_some() {
        model.add_link("create-event", links::events());
    }

    Ok(hal_at(StatusCode::OK, links::EVENTS, &model))
}

pub async fn get_event(
    State(state): State<AppState>,
    MaybeAccount(account): MaybeAccount,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;

    let event = state.events.find(id).await?;
    let managed = account
        .as_ref()
        .is_some_and(|account| event.is_managed_by(account));

    let mut model = event_model(event, id);
    model.add_link("query-events", links::events());
    model.add_link("profile", links::profile("resources-events-get"));
    if managed {
        model.add_link("update-event", links::event(id));
    }

    Ok(hal_at(StatusCode::OK, &links::event_path(id), &model))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    id: Result<Path<EventId>, PathRejection>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // A missing event is reported before an unreadable body.
            state.events.find(id).await?;
            return Err(rejection.into());
        }
    };

    let event = state.events.update(id, request, &account).await?;

    let mut model = event_model(event, id);
    model.add_link("query-events", links::events());
    model.add_link("get-event", links::event(id));
    model.add_link("profile", links::profile("resources-events-update"));

    Ok(hal_at(StatusCode::OK, &links::event_path(id), &model))
}
