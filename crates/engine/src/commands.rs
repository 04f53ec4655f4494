//! Command structs for engine operations.
//!
//! These types group parameters for the booking write paths (create, edit,
//! transition, cancel), keeping call sites readable and avoiding long
//! argument lists. No shared mutable state carries booking form data; every
//! request builds its own command.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Actor, ReadingStatus, SessionKind, TimeSpan};

/// Create a new reading booking on behalf of a client.
#[derive(Clone, Debug)]
pub struct CreateReadingCmd {
    pub client_id: String,
    pub reader_id: String,
    pub topic: String,
    pub question: Option<String>,
    pub kind: SessionKind,
    /// Per-half-hour credit rate from the category catalog.
    pub base_price: i64,
    pub time_span: TimeSpan,
    pub wants_scheduled: bool,
    pub scheduled_date: Option<NaiveDate>,
    /// `HH:MM` in the reader's local time.
    pub scheduled_time: Option<String>,
}

impl CreateReadingCmd {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        reader_id: impl Into<String>,
        topic: impl Into<String>,
        kind: SessionKind,
        base_price: i64,
        time_span: TimeSpan,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            reader_id: reader_id.into(),
            topic: topic.into(),
            question: None,
            kind,
            base_price,
            time_span,
            wants_scheduled: false,
            scheduled_date: None,
            scheduled_time: None,
        }
    }

    #[must_use]
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    #[must_use]
    pub fn scheduled(mut self, date: NaiveDate, time: impl Into<String>) -> Self {
        self.wants_scheduled = true;
        self.scheduled_date = Some(date);
        self.scheduled_time = Some(time.into());
        self
    }

    /// Marks the client's preference without a concrete slot; the handler
    /// falls back to the instant queue when no valid date/time arrives.
    #[must_use]
    pub fn wants_scheduled(mut self, wants: bool) -> Self {
        self.wants_scheduled = wants;
        self
    }
}

/// Client edit of a not-yet-started reading.
#[derive(Clone, Debug, Default)]
pub struct EditReadingCmd {
    pub reading_id: Uuid,
    pub client_id: String,
    pub question: Option<String>,
    /// Replacement session option; final price is recomputed.
    pub kind: Option<SessionKind>,
    pub base_price: Option<i64>,
    pub time_span: Option<TimeSpan>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
}

impl EditReadingCmd {
    #[must_use]
    pub fn new(reading_id: Uuid, client_id: impl Into<String>) -> Self {
        Self {
            reading_id,
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    #[must_use]
    pub fn option(mut self, kind: SessionKind, base_price: i64, time_span: TimeSpan) -> Self {
        self.kind = Some(kind);
        self.base_price = Some(base_price);
        self.time_span = Some(time_span);
        self
    }

    #[must_use]
    pub fn scheduled(mut self, date: NaiveDate, time: impl Into<String>) -> Self {
        self.scheduled_date = Some(date);
        self.scheduled_time = Some(time.into());
        self
    }

    fn changes_option(&self) -> bool {
        self.kind.is_some() || self.base_price.is_some() || self.time_span.is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.question.is_none()
            && !self.changes_option()
            && self.scheduled_date.is_none()
            && self.scheduled_time.is_none()
    }
}

/// Client cancellation of a not-yet-started reading.
#[derive(Clone, Debug)]
pub struct CancelReadingCmd {
    pub reading_id: Uuid,
    pub client_id: String,
}

impl CancelReadingCmd {
    #[must_use]
    pub fn new(reading_id: Uuid, client_id: impl Into<String>) -> Self {
        Self {
            reading_id,
            client_id: client_id.into(),
        }
    }
}

/// Status transition requested by a participant or an admin.
#[derive(Clone, Debug)]
pub struct TransitionCmd {
    pub reading_id: Uuid,
    pub actor: Actor,
    pub target: ReadingStatus,
    /// Stored when the target is `in_progress`.
    pub reading_link: Option<String>,
    /// Required when the target is `disputed`.
    pub dispute_reason: Option<String>,
}

impl TransitionCmd {
    #[must_use]
    pub fn new(reading_id: Uuid, actor: Actor, target: ReadingStatus) -> Self {
        Self {
            reading_id,
            actor,
            target,
            reading_link: None,
            dispute_reason: None,
        }
    }

    #[must_use]
    pub fn reading_link(mut self, link: impl Into<String>) -> Self {
        self.reading_link = Some(link.into());
        self
    }

    #[must_use]
    pub fn dispute_reason(mut self, reason: impl Into<String>) -> Self {
        self.dispute_reason = Some(reason.into());
        self
    }
}
