//! Client-side edit and cancellation of not-yet-started readings.

use chrono::{Timelike, Utc};
use sea_orm::{ActiveValue, prelude::*};

use crate::{
    CancelReadingCmd, EditReadingCmd, EngineError, Reading, ReadingOption, ReadingStatus,
    ResultEngine, readings,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Edits the question, session option, and/or scheduled slot of a
    /// pre-start reading, reconciling the price delta through the ledger.
    ///
    /// Returns the updated record, the client's balance, and the delta that
    /// was settled (positive: extra debit, negative: partial refund).
    pub async fn edit_reading(&self, cmd: EditReadingCmd) -> ResultEngine<(Reading, i64, i64)> {
        if cmd.is_empty() {
            return Err(EngineError::Validation("nothing to edit".to_string()));
        }

        let model = self.require_reading_model(cmd.reading_id).await?;
        let mut reading = Reading::try_from(model)?;

        if reading.client_id != cmd.client_id {
            return Err(EngineError::Forbidden(
                "only the booking client may edit".to_string(),
            ));
        }
        if !reading.status.is_pre_start() {
            return Err(EngineError::Validation(format!(
                "cannot edit a {} reading",
                reading.status.as_str()
            )));
        }

        if let Some(question) = cmd.question.as_deref() {
            reading.question = Some(normalize_required_text(question, "question")?);
        }

        // Rebuild the option from the edited parts; the final price is always
        // recomputed, never taken from the payload.
        let old_credits = reading.credits;
        let old_duration = reading.option.time_span.duration_minutes;
        if cmd.kind.is_some() || cmd.base_price.is_some() || cmd.time_span.is_some() {
            let kind = cmd.kind.unwrap_or(reading.option.kind);
            let base_price = cmd.base_price.unwrap_or(reading.option.base_price);
            let time_span = cmd
                .time_span
                .clone()
                .unwrap_or_else(|| reading.option.time_span.clone());
            reading.option = ReadingOption::priced(kind, base_price, time_span)?;
        }

        if cmd.scheduled_date.is_some() || cmd.scheduled_time.is_some() {
            if reading.status != ReadingStatus::Scheduled {
                return Err(EngineError::Validation(format!(
                    "a {} reading has no scheduled slot",
                    reading.status.as_str()
                )));
            }
            let (date, time) = cmd
                .scheduled_date
                .zip(cmd.scheduled_time.as_deref())
                .ok_or_else(|| {
                    EngineError::Validation(
                        "rescheduling needs both a date and a time".to_string(),
                    )
                })?;
            let profile = self.reader_profile(&reading.reader_id).await?;
            reading.scheduled_at =
                Some(self.validated_slot(&profile, date, time, &reading.option)?);
        } else if reading.status == ReadingStatus::Scheduled
            && reading.option.time_span.duration_minutes != old_duration
        {
            self.require_slot_still_fits(&reading).await?;
        }

        let delta = reading.option.final_price - old_credits;
        reading.credits = reading.option.final_price;
        reading.updated_at = Utc::now();

        // Ledger first; a failed debit rejects the edit with the record
        // untouched.
        let balance = if delta > 0 {
            self.debit(&cmd.client_id, delta).await?
        } else if delta < 0 {
            self.credit(&cmd.client_id, -delta).await?
        } else {
            self.credit_balance(&cmd.client_id).await?
        };

        let update = with_tx!(self, |db_tx| {
            readings::ActiveModel::from(&reading)
                .update(&db_tx)
                .await
                .map_err(EngineError::from)
        });

        match update {
            Ok(_) => Ok((reading, balance, delta)),
            Err(err) if delta != 0 => Err(self.compensate(&cmd.client_id, delta, err).await),
            Err(err) => Err(err),
        }
    }

    /// Re-checks the stored slot when a duration change arrives without a
    /// reschedule: a longer session may overrun the booked window.
    async fn require_slot_still_fits(&self, reading: &Reading) -> ResultEngine<()> {
        let scheduled_at = reading.scheduled_at.ok_or_else(|| {
            EngineError::Validation("scheduled reading has no slot".to_string())
        })?;
        let profile = self.reader_profile(&reading.reader_id).await?;
        let local = scheduled_at.with_timezone(&profile.tz()?);
        let time = format!("{:02}:{:02}", local.hour(), local.minute());
        let duration = reading.option.time_span.duration_minutes;
        if !profile
            .schedule
            .is_slot_bookable(local.date_naive(), &time, duration)?
        {
            return Err(EngineError::Validation(format!(
                "the booked slot cannot fit a {duration} minute session"
            )));
        }
        Ok(())
    }

    /// Cancels a pre-start reading: refunds the full escrow and moves the
    /// record to `refunded`. Terminal; a second cancel is a validation error.
    pub async fn cancel_reading(
        &self,
        cmd: CancelReadingCmd,
    ) -> ResultEngine<(Reading, i64, i64)> {
        let model = self.require_reading_model(cmd.reading_id).await?;
        let mut reading = Reading::try_from(model)?;

        if reading.client_id != cmd.client_id {
            return Err(EngineError::Forbidden(
                "only the booking client may cancel".to_string(),
            ));
        }
        if !reading.status.is_pre_start() {
            return Err(EngineError::Validation(format!(
                "cannot cancel a {} reading",
                reading.status.as_str()
            )));
        }

        let refunded = reading.credits;
        reading.status = ReadingStatus::Refunded;
        reading.credits = 0;
        reading.updated_at = Utc::now();

        let balance = self.credit(&cmd.client_id, refunded).await?;

        let update = with_tx!(self, |db_tx| {
            let active = readings::ActiveModel {
                id: ActiveValue::Set(reading.id.to_string()),
                status: ActiveValue::Set(reading.status.as_str().to_string()),
                credits: ActiveValue::Set(reading.credits),
                updated_at: ActiveValue::Set(reading.updated_at),
                ..Default::default()
            };
            active.update(&db_tx).await.map_err(EngineError::from)
        });

        match update {
            Ok(_) => Ok((reading, balance, refunded)),
            Err(err) => Err(self.compensate(&cmd.client_id, -refunded, err).await),
        }
    }
}
