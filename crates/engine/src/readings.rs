//! Reading booking records.
//!
//! A `Reading` is the booking aggregate: who is involved, the priced session
//! option, the escrowed credits, and the lifecycle status. The record is never
//! hard-deleted; cancellation is the `refunded` status.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Session format of a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    PhoneCall,
    VideoMessage,
    LiveVideo,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhoneCall => "phone_call",
            Self::VideoMessage => "video_message",
            Self::LiveVideo => "live_video",
        }
    }
}

impl TryFrom<&str> for SessionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "phone_call" => Ok(Self::PhoneCall),
            "video_message" => Ok(Self::VideoMessage),
            "live_video" => Ok(Self::LiveVideo),
            other => Err(EngineError::Validation(format!(
                "invalid session kind: {other}"
            ))),
        }
    }
}

/// Lifecycle status of a reading.
///
/// This is the canonical closed set. Other vocabularies seen in peripheral
/// tooling (`completed`, `suggested`, `pending`, `cancelled`) are rejected at
/// every boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    InstantQueue,
    Scheduled,
    MessageQueue,
    InProgress,
    Archived,
    Disputed,
    Refunded,
}

impl ReadingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InstantQueue => "instant_queue",
            Self::Scheduled => "scheduled",
            Self::MessageQueue => "message_queue",
            Self::InProgress => "in_progress",
            Self::Archived => "archived",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
        }
    }

    /// Statuses a reading can hold before the reader has started it. Edits
    /// and client cancellation are only legal here.
    pub fn is_pre_start(self) -> bool {
        matches!(self, Self::InstantQueue | Self::Scheduled | Self::MessageQueue)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Archived | Self::Refunded)
    }
}

impl TryFrom<&str> for ReadingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "instant_queue" => Ok(Self::InstantQueue),
            "scheduled" => Ok(Self::Scheduled),
            "message_queue" => Ok(Self::MessageQueue),
            "in_progress" => Ok(Self::InProgress),
            "archived" => Ok(Self::Archived),
            "disputed" => Ok(Self::Disputed),
            "refunded" => Ok(Self::Refunded),
            other => Err(EngineError::Validation(format!(
                "invalid reading status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl TryFrom<&str> for DisputeStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            other => Err(EngineError::Validation(format!(
                "invalid dispute status: {other}"
            ))),
        }
    }
}

/// Client-raised dispute on a reading, resolved out-of-band by an admin.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispute {
    pub reason: String,
    pub status: DisputeStatus,
    pub admin_response: Option<String>,
}

/// Duration tier of a session option.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub duration_minutes: i64,
    pub label: String,
    pub multiplier: f64,
}

impl TimeSpan {
    pub fn new(duration_minutes: i64, label: String, multiplier: f64) -> ResultEngine<Self> {
        if !(15..=120).contains(&duration_minutes) {
            return Err(EngineError::Validation(format!(
                "duration must be between 15 and 120 minutes, got {duration_minutes}"
            )));
        }
        if !(0.0..=2.0).contains(&multiplier) {
            return Err(EngineError::Validation(format!(
                "multiplier must be between 0 and 2, got {multiplier}"
            )));
        }
        Ok(Self {
            duration_minutes,
            label,
            multiplier,
        })
    }
}

/// The priced session option of a reading.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingOption {
    pub kind: SessionKind,
    pub base_price: i64,
    pub time_span: TimeSpan,
    pub final_price: i64,
}

impl ReadingOption {
    /// Builds an option and derives its final price:
    /// `round(round(duration / 30 * base_price) * multiplier)`.
    ///
    /// `base_price` is the per-half-hour credit rate from the category
    /// catalog. Client-supplied final prices are ignored in favor of this.
    pub fn priced(kind: SessionKind, base_price: i64, time_span: TimeSpan) -> ResultEngine<Self> {
        if base_price < 1 {
            return Err(EngineError::Validation(format!(
                "base price must be at least 1, got {base_price}"
            )));
        }

        let per_duration = (time_span.duration_minutes as f64 / 30.0 * base_price as f64).round();
        let final_price = (per_duration * time_span.multiplier).round() as i64;
        if final_price < 1 {
            return Err(EngineError::Validation(format!(
                "final price must be at least 1, got {final_price}"
            )));
        }

        Ok(Self {
            kind,
            base_price,
            time_span,
            final_price,
        })
    }
}

/// The booking aggregate.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub id: Uuid,
    pub client_id: String,
    pub reader_id: String,
    pub topic: String,
    pub question: Option<String>,
    pub option: ReadingOption,
    /// Credits currently escrowed from the client. Equals
    /// `option.final_price` while the escrow is held, zero once refunded.
    pub credits: i64,
    pub status: ReadingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// IANA zone name of the reader at booking time.
    pub time_zone: String,
    pub reading_link: Option<String>,
    pub review: Option<String>,
    pub dispute: Option<Dispute>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reading {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_id: String,
        reader_id: String,
        topic: String,
        question: Option<String>,
        option: ReadingOption,
        status: ReadingStatus,
        scheduled_at: Option<DateTime<Utc>>,
        time_zone: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if client_id == reader_id {
            return Err(EngineError::Validation(
                "client and reader must differ".to_string(),
            ));
        }
        let credits = option.final_price;
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            reader_id,
            topic,
            question,
            option,
            credits,
            status,
            scheduled_at,
            time_zone,
            reading_link: None,
            review: None,
            dispute: None,
            created_at,
            updated_at: created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub reader_id: String,
    pub topic: String,
    pub question: Option<String>,
    pub kind: String,
    pub base_price: i64,
    pub duration_minutes: i64,
    pub time_span_label: String,
    pub multiplier: f64,
    pub final_price: i64,
    pub credits: i64,
    pub status: String,
    pub scheduled_at: Option<DateTimeUtc>,
    pub time_zone: String,
    pub reading_link: Option<String>,
    pub review: Option<String>,
    pub dispute_reason: Option<String>,
    pub dispute_status: Option<String>,
    pub dispute_admin_response: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Reading> for ActiveModel {
    fn from(reading: &Reading) -> Self {
        Self {
            id: ActiveValue::Set(reading.id.to_string()),
            client_id: ActiveValue::Set(reading.client_id.clone()),
            reader_id: ActiveValue::Set(reading.reader_id.clone()),
            topic: ActiveValue::Set(reading.topic.clone()),
            question: ActiveValue::Set(reading.question.clone()),
            kind: ActiveValue::Set(reading.option.kind.as_str().to_string()),
            base_price: ActiveValue::Set(reading.option.base_price),
            duration_minutes: ActiveValue::Set(reading.option.time_span.duration_minutes),
            time_span_label: ActiveValue::Set(reading.option.time_span.label.clone()),
            multiplier: ActiveValue::Set(reading.option.time_span.multiplier),
            final_price: ActiveValue::Set(reading.option.final_price),
            credits: ActiveValue::Set(reading.credits),
            status: ActiveValue::Set(reading.status.as_str().to_string()),
            scheduled_at: ActiveValue::Set(reading.scheduled_at),
            time_zone: ActiveValue::Set(reading.time_zone.clone()),
            reading_link: ActiveValue::Set(reading.reading_link.clone()),
            review: ActiveValue::Set(reading.review.clone()),
            dispute_reason: ActiveValue::Set(
                reading.dispute.as_ref().map(|d| d.reason.clone()),
            ),
            dispute_status: ActiveValue::Set(
                reading
                    .dispute
                    .as_ref()
                    .map(|d| d.status.as_str().to_string()),
            ),
            dispute_admin_response: ActiveValue::Set(
                reading.dispute.as_ref().and_then(|d| d.admin_response.clone()),
            ),
            created_at: ActiveValue::Set(reading.created_at),
            updated_at: ActiveValue::Set(reading.updated_at),
        }
    }
}

impl TryFrom<Model> for Reading {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let dispute = match model.dispute_reason {
            Some(reason) => {
                let status = model
                    .dispute_status
                    .as_deref()
                    .map(DisputeStatus::try_from)
                    .transpose()?
                    .unwrap_or(DisputeStatus::Open);
                Some(Dispute {
                    reason,
                    status,
                    admin_response: model.dispute_admin_response,
                })
            }
            None => None,
        };

        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("reading not exists".to_string()))?,
            client_id: model.client_id,
            reader_id: model.reader_id,
            topic: model.topic,
            question: model.question,
            option: ReadingOption {
                kind: SessionKind::try_from(model.kind.as_str())?,
                base_price: model.base_price,
                time_span: TimeSpan {
                    duration_minutes: model.duration_minutes,
                    label: model.time_span_label,
                    multiplier: model.multiplier,
                },
                final_price: model.final_price,
            },
            credits: model.credits,
            status: ReadingStatus::try_from(model.status.as_str())?,
            scheduled_at: model.scheduled_at,
            time_zone: model.time_zone,
            reading_link: model.reading_link,
            review: model.review,
            dispute,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
