use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod reading {
    use super::*;

    /// Session format. Closed set; unknown strings are rejected at the
    /// boundary instead of being passed through.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SessionKind {
        PhoneCall,
        VideoMessage,
        LiveVideo,
    }

    /// Canonical lifecycle status set.
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

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DisputeStatus {
        Open,
        Resolved,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TimeSpanBody {
        /// Minutes, 15 to 120.
        pub duration_minutes: i64,
        pub label: String,
        /// 0 to 2.
        pub multiplier: f64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ReadingOptionBody {
        #[serde(rename = "type")]
        pub kind: SessionKind,
        /// Per-half-hour credit rate from the category catalog.
        pub base_price: i64,
        pub time_span: TimeSpanBody,
        /// Accepted for schema compatibility; the server always recomputes
        /// the final price from duration, base price, and multiplier.
        pub final_price: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingCreate {
        pub reader_id: String,
        pub topic: String,
        pub question: Option<String>,
        pub reading_option: ReadingOptionBody,
        /// Explicit client preference for a scheduled slot. Ignored for
        /// video messages; implied for readers without instant booking.
        #[serde(default)]
        pub wants_scheduled: bool,
        pub scheduled_date: Option<NaiveDate>,
        /// `HH:MM`, reader-local.
        pub scheduled_time: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DisputeView {
        pub reason: String,
        pub status: DisputeStatus,
        pub admin_response: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingView {
        pub id: Uuid,
        pub client_id: String,
        pub reader_id: String,
        pub topic: String,
        pub question: Option<String>,
        pub reading_option: ReadingOptionBody,
        /// Credits escrowed from the client; equals the final price.
        pub credits: i64,
        pub status: ReadingStatus,
        pub scheduled_at: Option<DateTime<Utc>>,
        pub time_zone: String,
        pub reading_link: Option<String>,
        pub review: Option<String>,
        pub dispute: Option<DisputeView>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingCreated {
        pub reading: ReadingView,
        pub credit_balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingsResponse {
        pub readings: Vec<ReadingView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingResponse {
        pub reading: ReadingView,
    }

    /// PATCH body. One request is either a client edit (question/option/
    /// slot), a client review, or a status transition (reader/admin);
    /// unknown fields are rejected.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ReadingPatch {
        pub question: Option<String>,
        pub reading_option: Option<ReadingOptionBody>,
        pub scheduled_date: Option<NaiveDate>,
        pub scheduled_time: Option<String>,
        pub status: Option<ReadingStatus>,
        pub reading_link: Option<String>,
        pub dispute_reason: Option<String>,
        pub review: Option<String>,
    }

    /// Client edit result: the updated record plus the settlement outcome.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingUpdated {
        pub reading: ReadingView,
        pub credit_balance: i64,
        /// Positive: extra credits debited; negative: credits refunded.
        pub credit_difference: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingCancelled {
        pub message: String,
        pub credit_balance: i64,
        pub refunded_credits: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DisputeResolution {
        pub response: String,
    }
}

pub mod slots {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SlotsQuery {
        pub date: NaiveDate,
        /// Session duration in minutes.
        pub duration: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SlotsResponse {
        pub available: bool,
        /// Ascending `HH:MM` start times.
        pub slots: Vec<String>,
    }
}
