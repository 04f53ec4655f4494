//! Caller identity, participant checks, and read access to reading records.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Reading, ResultEngine, readings};

use super::{Engine, normalize_required_text, with_tx};

/// The authenticated caller of an engine operation.
///
/// Reader and client actors are checked against the record's participants;
/// admins bypass ownership checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    Client(String),
    Reader(String),
    Admin(String),
}

impl Actor {
    pub fn id(&self) -> &str {
        match self {
            Self::Client(id) | Self::Reader(id) | Self::Admin(id) => id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }
}

impl Engine {
    pub(super) async fn require_reading_model(
        &self,
        reading_id: Uuid,
    ) -> ResultEngine<readings::Model> {
        readings::Entity::find_by_id(reading_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("reading not exists".to_string()))
    }

    /// Full record for a participant or an admin.
    pub async fn reading(&self, reading_id: Uuid, actor: &Actor) -> ResultEngine<Reading> {
        let reading = Reading::try_from(self.require_reading_model(reading_id).await?)?;
        if !actor.is_admin()
            && actor.id() != reading.client_id
            && actor.id() != reading.reader_id
        {
            return Err(EngineError::Forbidden(
                "caller is not a participant of this reading".to_string(),
            ));
        }
        Ok(reading)
    }

    /// Records the caller participates in, newest first. Admins see all.
    pub async fn readings_for(&self, actor: &Actor) -> ResultEngine<Vec<Reading>> {
        let mut query = readings::Entity::find();
        match actor {
            Actor::Admin(_) => {}
            Actor::Client(id) => {
                query = query.filter(readings::Column::ClientId.eq(id.clone()));
            }
            Actor::Reader(id) => {
                query = query.filter(readings::Column::ReaderId.eq(id.clone()));
            }
        }
        let models = query
            .order_by_desc(readings::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Reading::try_from).collect()
    }

    /// Stores a client's post-hoc review. Only the record's client may
    /// review, and only once the reading has started.
    pub async fn record_review(
        &self,
        reading_id: Uuid,
        client_id: &str,
        review: &str,
    ) -> ResultEngine<Reading> {
        let review = normalize_required_text(review, "review")?;
        let model = self.require_reading_model(reading_id).await?;
        let mut reading = Reading::try_from(model)?;

        if reading.client_id != client_id {
            return Err(EngineError::Forbidden(
                "only the booking client may review".to_string(),
            ));
        }
        if reading.status.is_pre_start() {
            return Err(EngineError::Validation(format!(
                "cannot review a {} reading",
                reading.status.as_str()
            )));
        }

        reading.review = Some(review.clone());
        reading.updated_at = Utc::now();

        with_tx!(self, |db_tx| {
            let active = readings::ActiveModel {
                id: ActiveValue::Set(reading.id.to_string()),
                review: ActiveValue::Set(Some(review)),
                updated_at: ActiveValue::Set(reading.updated_at),
                ..Default::default()
            };
            active.update(&db_tx).await.map_err(EngineError::from)
        })?;

        Ok(reading)
    }

    /// Records an admin response on an open dispute and marks it resolved.
    ///
    /// The reading stays `disputed`; closing it is an explicit admin
    /// transition so the money outcome is never implicit.
    pub async fn resolve_dispute(
        &self,
        reading_id: Uuid,
        actor: &Actor,
        response: &str,
    ) -> ResultEngine<Reading> {
        if !actor.is_admin() {
            return Err(EngineError::Forbidden(
                "only admins resolve disputes".to_string(),
            ));
        }
        let response = normalize_required_text(response, "dispute response")?;

        let model = self.require_reading_model(reading_id).await?;
        let mut reading = Reading::try_from(model)?;
        if reading.status != crate::ReadingStatus::Disputed {
            return Err(EngineError::Validation(format!(
                "cannot resolve a dispute on a {} reading",
                reading.status.as_str()
            )));
        }
        let Some(dispute) = reading.dispute.as_mut() else {
            return Err(EngineError::Validation(
                "reading has no dispute".to_string(),
            ));
        };

        dispute.status = crate::DisputeStatus::Resolved;
        dispute.admin_response = Some(response.clone());
        reading.updated_at = Utc::now();

        with_tx!(self, |db_tx| {
            let active = readings::ActiveModel {
                id: ActiveValue::Set(reading.id.to_string()),
                dispute_status: ActiveValue::Set(Some(
                    crate::DisputeStatus::Resolved.as_str().to_string(),
                )),
                dispute_admin_response: ActiveValue::Set(Some(response)),
                updated_at: ActiveValue::Set(reading.updated_at),
                ..Default::default()
            };
            active.update(&db_tx).await.map_err(EngineError::from)
        })?;

        Ok(reading)
    }
}
