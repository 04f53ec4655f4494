//! Readings API endpoints.

use api_types::reading::{
    DisputeResolution, DisputeStatus as ApiDisputeStatus, DisputeView, ReadingCancelled,
    ReadingCreate, ReadingCreated, ReadingOptionBody, ReadingPatch, ReadingResponse,
    ReadingStatus as ApiStatus, ReadingUpdated, ReadingView, ReadingsResponse,
    SessionKind as ApiKind, TimeSpanBody,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::{
    CancelReadingCmd, CreateReadingCmd, EditReadingCmd, Reading, TimeSpan, TransitionCmd,
};

fn map_kind(kind: ApiKind) -> engine::SessionKind {
    match kind {
        ApiKind::PhoneCall => engine::SessionKind::PhoneCall,
        ApiKind::VideoMessage => engine::SessionKind::VideoMessage,
        ApiKind::LiveVideo => engine::SessionKind::LiveVideo,
    }
}

fn view_kind(kind: engine::SessionKind) -> ApiKind {
    match kind {
        engine::SessionKind::PhoneCall => ApiKind::PhoneCall,
        engine::SessionKind::VideoMessage => ApiKind::VideoMessage,
        engine::SessionKind::LiveVideo => ApiKind::LiveVideo,
    }
}

fn map_status(status: ApiStatus) -> engine::ReadingStatus {
    match status {
        ApiStatus::InstantQueue => engine::ReadingStatus::InstantQueue,
        ApiStatus::Scheduled => engine::ReadingStatus::Scheduled,
        ApiStatus::MessageQueue => engine::ReadingStatus::MessageQueue,
        ApiStatus::InProgress => engine::ReadingStatus::InProgress,
        ApiStatus::Archived => engine::ReadingStatus::Archived,
        ApiStatus::Disputed => engine::ReadingStatus::Disputed,
        ApiStatus::Refunded => engine::ReadingStatus::Refunded,
    }
}

fn view_status(status: engine::ReadingStatus) -> ApiStatus {
    match status {
        engine::ReadingStatus::InstantQueue => ApiStatus::InstantQueue,
        engine::ReadingStatus::Scheduled => ApiStatus::Scheduled,
        engine::ReadingStatus::MessageQueue => ApiStatus::MessageQueue,
        engine::ReadingStatus::InProgress => ApiStatus::InProgress,
        engine::ReadingStatus::Archived => ApiStatus::Archived,
        engine::ReadingStatus::Disputed => ApiStatus::Disputed,
        engine::ReadingStatus::Refunded => ApiStatus::Refunded,
    }
}

fn map_time_span(body: &TimeSpanBody) -> Result<TimeSpan, ServerError> {
    TimeSpan::new(body.duration_minutes, body.label.clone(), body.multiplier)
        .map_err(ServerError::Engine)
}

fn reading_view(reading: Reading) -> ReadingView {
    ReadingView {
        id: reading.id,
        client_id: reading.client_id,
        reader_id: reading.reader_id,
        topic: reading.topic,
        question: reading.question,
        reading_option: ReadingOptionBody {
            kind: view_kind(reading.option.kind),
            base_price: reading.option.base_price,
            time_span: TimeSpanBody {
                duration_minutes: reading.option.time_span.duration_minutes,
                label: reading.option.time_span.label,
                multiplier: reading.option.time_span.multiplier,
            },
            final_price: Some(reading.option.final_price),
        },
        credits: reading.credits,
        status: view_status(reading.status),
        scheduled_at: reading.scheduled_at,
        time_zone: reading.time_zone,
        reading_link: reading.reading_link,
        review: reading.review,
        dispute: reading.dispute.map(|d| DisputeView {
            reason: d.reason,
            status: match d.status {
                engine::DisputeStatus::Open => ApiDisputeStatus::Open,
                engine::DisputeStatus::Resolved => ApiDisputeStatus::Resolved,
            },
            admin_response: d.admin_response,
        }),
        created_at: reading.created_at,
        updated_at: reading.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ReadingCreate>,
) -> Result<(StatusCode, Json<ReadingCreated>), ServerError> {
    let time_span = map_time_span(&payload.reading_option.time_span)?;

    let mut cmd = CreateReadingCmd::new(
        user.id,
        payload.reader_id,
        payload.topic,
        map_kind(payload.reading_option.kind),
        payload.reading_option.base_price,
        time_span,
    )
    .wants_scheduled(payload.wants_scheduled);
    cmd.question = payload.question;
    cmd.scheduled_date = payload.scheduled_date;
    cmd.scheduled_time = payload.scheduled_time;

    let (reading, credit_balance) = state.engine.create_reading(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReadingCreated {
            reading: reading_view(reading),
            credit_balance,
        }),
    ))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ReadingsResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let readings = state.engine.readings_for(&actor).await?;

    Ok(Json(ReadingsResponse {
        readings: readings.into_iter().map(reading_view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReadingResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let reading = state.engine.reading(id, &actor).await?;

    Ok(Json(ReadingResponse {
        reading: reading_view(reading),
    }))
}

/// PATCH dispatch: a body with `status` is a transition (reader/admin), a
/// body with only `review` records the client review, anything else is a
/// client edit settled through the ledger.
pub async fn patch(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReadingPatch>,
) -> Result<Response, ServerError> {
    if let Some(status) = payload.status {
        if payload.question.is_some()
            || payload.reading_option.is_some()
            || payload.scheduled_date.is_some()
            || payload.scheduled_time.is_some()
            || payload.review.is_some()
        {
            return Err(ServerError::Generic(
                "a status transition cannot be combined with field edits".to_string(),
            ));
        }

        let actor = user::actor_for(&user)?;
        let mut cmd = TransitionCmd::new(id, actor, map_status(status));
        cmd.reading_link = payload.reading_link;
        cmd.dispute_reason = payload.dispute_reason;

        let reading = state.engine.transition_reading(cmd).await?;
        return Ok(Json(ReadingResponse {
            reading: reading_view(reading),
        })
        .into_response());
    }

    if payload.reading_link.is_some() || payload.dispute_reason.is_some() {
        return Err(ServerError::Generic(
            "reading_link and dispute_reason require a status".to_string(),
        ));
    }

    if let Some(review) = payload.review {
        if payload.question.is_some()
            || payload.reading_option.is_some()
            || payload.scheduled_date.is_some()
            || payload.scheduled_time.is_some()
        {
            return Err(ServerError::Generic(
                "a review cannot be combined with field edits".to_string(),
            ));
        }
        let reading = state.engine.record_review(id, &user.id, &review).await?;
        return Ok(Json(ReadingResponse {
            reading: reading_view(reading),
        })
        .into_response());
    }

    let mut cmd = EditReadingCmd::new(id, user.id);
    cmd.question = payload.question;
    if let Some(option) = payload.reading_option {
        let time_span = map_time_span(&option.time_span)?;
        cmd = cmd.option(map_kind(option.kind), option.base_price, time_span);
    }
    cmd.scheduled_date = payload.scheduled_date;
    cmd.scheduled_time = payload.scheduled_time;

    let (reading, credit_balance, credit_difference) = state.engine.edit_reading(cmd).await?;

    Ok(Json(ReadingUpdated {
        reading: reading_view(reading),
        credit_balance,
        credit_difference,
    })
    .into_response())
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReadingCancelled>, ServerError> {
    let (_, credit_balance, refunded_credits) = state
        .engine
        .cancel_reading(CancelReadingCmd::new(id, user.id))
        .await?;

    Ok(Json(ReadingCancelled {
        message: "reading cancelled and credits refunded".to_string(),
        credit_balance,
        refunded_credits,
    }))
}

pub async fn resolve_dispute(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisputeResolution>,
) -> Result<Json<ReadingResponse>, ServerError> {
    let actor = user::actor_for(&user)?;
    let reading = state
        .engine
        .resolve_dispute(id, &actor, &payload.response)
        .await?;

    Ok(Json(ReadingResponse {
        reading: reading_view(reading),
    }))
}
