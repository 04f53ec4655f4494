//! Reader directory: availability status, instant-booking flag, timezone and
//! the recurring weekly schedule (stored as JSON text).

use sea_orm::entity::prelude::*;

use crate::{EngineError, ResultEngine, schedule::WeeklySchedule};

/// Whether a reader can currently take live sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderStatus {
    Available,
    Busy,
}

impl ReaderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
        }
    }
}

impl TryFrom<&str> for ReaderStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            other => Err(EngineError::Validation(format!(
                "invalid reader status: {other}"
            ))),
        }
    }
}

/// In-memory view of a reader's directory row.
#[derive(Clone, Debug)]
pub struct ReaderProfile {
    pub user_id: String,
    pub status: ReaderStatus,
    pub instant_booking: bool,
    pub time_zone: String,
    pub schedule: WeeklySchedule,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "readers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub status: String,
    pub instant_booking: bool,
    pub time_zone: String,
    pub schedule: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ReaderProfile {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let schedule: WeeklySchedule = serde_json::from_str(&model.schedule).map_err(|err| {
            EngineError::Validation(format!("invalid stored schedule: {err}"))
        })?;
        schedule.validate()?;

        Ok(Self {
            user_id: model.user_id,
            status: ReaderStatus::try_from(model.status.as_str())?,
            instant_booking: model.instant_booking,
            time_zone: model.time_zone,
            schedule,
        })
    }
}

impl ReaderProfile {
    /// Parses the reader's IANA timezone name.
    pub fn tz(&self) -> ResultEngine<chrono_tz::Tz> {
        self.time_zone.parse().map_err(|_| {
            EngineError::Validation(format!("invalid reader timezone: {}", self.time_zone))
        })
    }
}
