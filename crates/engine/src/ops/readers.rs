//! Reader directory access and availability resolution.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{
    EngineError, ReaderProfile, ReaderStatus, ReadingStatus, ResultEngine, readers, readings,
};

use super::Engine;

impl Engine {
    pub async fn reader_profile(&self, reader_id: &str) -> ResultEngine<ReaderProfile> {
        let model = readers::Entity::find_by_id(reader_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("reader not exists".to_string()))?;
        ReaderProfile::try_from(model)
    }

    /// Bookable start times for a reader on a given date.
    ///
    /// Returns `(is_date_available, slots)`; an unconfigured weekday yields
    /// `(false, [])`.
    pub async fn reader_slots(
        &self,
        reader_id: &str,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> ResultEngine<(bool, Vec<String>)> {
        let profile = self.reader_profile(reader_id).await?;
        let available = profile.schedule.is_date_available(date);
        let slots = profile.schedule.slots_for(date, duration_minutes)?;
        Ok((available, slots))
    }

    /// Flips a reader's availability status. Callers on the transition path
    /// treat this as best-effort: a failure is logged, never propagated into
    /// the already-committed transition.
    pub(super) async fn set_reader_status(
        &self,
        reader_id: &str,
        status: ReaderStatus,
    ) -> ResultEngine<()> {
        let active = readers::ActiveModel {
            user_id: ActiveValue::Set(reader_id.to_string()),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }

    /// Whether the reader has an `in_progress` reading other than
    /// `except_reading_id`.
    pub(super) async fn reader_has_other_in_progress(
        &self,
        reader_id: &str,
        except_reading_id: &str,
    ) -> ResultEngine<bool> {
        let count = readings::Entity::find()
            .filter(readings::Column::ReaderId.eq(reader_id.to_string()))
            .filter(readings::Column::Status.eq(ReadingStatus::InProgress.as_str()))
            .filter(readings::Column::Id.ne(except_reading_id.to_string()))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }
}
