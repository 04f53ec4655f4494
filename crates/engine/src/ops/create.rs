//! Booking command handler: queue-type decision, pricing, and settlement.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::prelude::*;

use crate::{
    CreateReadingCmd, EngineError, ReaderProfile, Reading, ReadingOption, ReadingStatus,
    ResultEngine, SessionKind, readings, schedule,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Creates a reading, escrowing its price from the client.
    ///
    /// The debit happens before the record insert; a failed insert is
    /// compensated with an equal credit (see `ops` module docs). Returns the
    /// created record and the client's new balance.
    pub async fn create_reading(
        &self,
        cmd: CreateReadingCmd,
    ) -> ResultEngine<(Reading, i64)> {
        let topic = normalize_required_text(&cmd.topic, "topic")?;
        let question = normalize_optional_text(cmd.question.as_deref());

        let profile = self.reader_profile(&cmd.reader_id).await?;
        let option = ReadingOption::priced(cmd.kind, cmd.base_price, cmd.time_span.clone())?;

        let (status, scheduled_at) = self.decide_queue(&cmd, &profile, &option)?;

        let now = Utc::now();
        let reading = Reading::new(
            cmd.client_id.clone(),
            cmd.reader_id.clone(),
            topic,
            question,
            option,
            status,
            scheduled_at,
            profile.time_zone.clone(),
            now,
        )?;

        let final_price = reading.option.final_price;
        let balance = self.debit(&cmd.client_id, final_price).await?;

        let insert = with_tx!(self, |db_tx| {
            readings::ActiveModel::from(&reading)
                .insert(&db_tx)
                .await
                .map_err(EngineError::from)
        });

        match insert {
            Ok(_) => Ok((reading, balance)),
            Err(err) => Err(self.compensate(&cmd.client_id, final_price, err).await),
        }
    }

    /// Applies the queue-type rules in order:
    /// 1. video messages always join the message queue;
    /// 2. readers without instant booking force a scheduled slot;
    /// 3. an explicit client choice with a valid slot schedules;
    /// 4. otherwise the instant queue.
    fn decide_queue(
        &self,
        cmd: &CreateReadingCmd,
        profile: &ReaderProfile,
        option: &ReadingOption,
    ) -> ResultEngine<(ReadingStatus, Option<DateTime<Utc>>)> {
        if option.kind == SessionKind::VideoMessage {
            return Ok((ReadingStatus::MessageQueue, None));
        }

        if !profile.instant_booking {
            let (date, time) = cmd.scheduled_date.zip(cmd.scheduled_time.as_deref()).ok_or_else(
                || {
                    EngineError::Validation(
                        "this reader requires a scheduled date and time".to_string(),
                    )
                },
            )?;
            let scheduled_at = self.validated_slot(profile, date, time, option)?;
            return Ok((ReadingStatus::Scheduled, Some(scheduled_at)));
        }

        if cmd.wants_scheduled {
            if let Some((date, time)) = cmd.scheduled_date.zip(cmd.scheduled_time.as_deref()) {
                let scheduled_at = self.validated_slot(profile, date, time, option)?;
                return Ok((ReadingStatus::Scheduled, Some(scheduled_at)));
            }
        }

        Ok((ReadingStatus::InstantQueue, None))
    }

    /// Checks the requested slot against the reader's weekly schedule and
    /// converts it from reader-local time to UTC.
    pub(super) fn validated_slot(
        &self,
        profile: &ReaderProfile,
        date: NaiveDate,
        time: &str,
        option: &ReadingOption,
    ) -> ResultEngine<DateTime<Utc>> {
        let duration = option.time_span.duration_minutes;
        if !profile.schedule.is_slot_bookable(date, time, duration)? {
            return Err(EngineError::Validation(format!(
                "{time} on {date} is not an available slot for this reader"
            )));
        }

        let minutes = schedule::parse_hhmm(time)?;
        let local = date
            .and_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
            .ok_or_else(|| EngineError::Validation(format!("invalid time: {time}")))?;
        let tz = profile.tz()?;
        tz.from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "{time} on {date} is ambiguous in {}",
                    profile.time_zone
                ))
            })
    }
}
