//! Reader availability endpoint.

use api_types::slots::{SlotsQuery, SlotsResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{ServerError, server::ServerState};

pub async fn slots(
    State(state): State<ServerState>,
    Path(reader_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ServerError> {
    let (available, slots) = state
        .engine
        .reader_slots(&reader_id, query.date, query.duration)
        .await?;

    Ok(Json(SlotsResponse { available, slots }))
}
