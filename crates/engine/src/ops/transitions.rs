//! Reading state machine.
//!
//! Validates and applies status transitions per actor, settles refunds, and
//! drives the best-effort reader-status side effects. No other code path may
//! set a reading's status.

use chrono::Utc;
use sea_orm::prelude::*;

use crate::{
    Dispute, DisputeStatus, EngineError, ReaderStatus, Reading, ReadingStatus, ResultEngine,
    TransitionCmd, readings,
};

use super::{Actor, Engine, normalize_required_text, with_tx};

impl Engine {
    /// Applies a status transition requested by `cmd.actor`.
    ///
    /// Allowed moves:
    /// - reader: pre-start → `in_progress` (stores the optional link),
    ///   `in_progress` → `archived`;
    /// - client: pre-start → `refunded` (full refund), any non-terminal →
    ///   `disputed` (reason required);
    /// - admin: any → any, with the target's side effects applied
    ///   conditionally and ownership checks bypassed.
    pub async fn transition_reading(&self, cmd: TransitionCmd) -> ResultEngine<Reading> {
        let model = self.require_reading_model(cmd.reading_id).await?;
        let mut reading = Reading::try_from(model)?;
        let from = reading.status;
        let target = cmd.target;

        self.authorize_transition(&cmd.actor, &reading, target)?;

        if from == target {
            return Err(EngineError::Validation(format!(
                "reading is already {}",
                target.as_str()
            )));
        }

        let mut refund: Option<i64> = None;
        match target {
            ReadingStatus::InProgress => {
                reading.reading_link = cmd.reading_link.clone();
            }
            ReadingStatus::Refunded => {
                // Escrow goes back exactly once, even via the admin path; a
                // record whose escrow was already paid out has zero credits.
                if reading.credits > 0 {
                    refund = Some(reading.credits);
                }
                reading.credits = 0;
            }
            ReadingStatus::Disputed => {
                let reason = match cmd.dispute_reason.as_deref() {
                    Some(reason) => normalize_required_text(reason, "dispute reason")?,
                    None if cmd.actor.is_admin() => "opened by admin".to_string(),
                    None => {
                        return Err(EngineError::Validation(
                            "a dispute needs a reason".to_string(),
                        ));
                    }
                };
                reading.dispute = Some(Dispute {
                    reason,
                    status: DisputeStatus::Open,
                    admin_response: None,
                });
            }
            _ => {}
        }

        reading.status = target;
        reading.updated_at = Utc::now();

        let balance_moved = match refund {
            Some(amount) => {
                self.credit(&reading.client_id, amount).await?;
                amount
            }
            None => 0,
        };

        let update = with_tx!(self, |db_tx| {
            readings::ActiveModel::from(&reading)
                .update(&db_tx)
                .await
                .map_err(EngineError::from)
        });

        if let Err(err) = update {
            if balance_moved > 0 {
                return Err(self
                    .compensate(&reading.client_id, -balance_moved, err)
                    .await);
            }
            return Err(err);
        }

        self.apply_reader_status_effect(&reading, from).await;

        Ok(reading)
    }

    fn authorize_transition(
        &self,
        actor: &Actor,
        reading: &Reading,
        target: ReadingStatus,
    ) -> ResultEngine<()> {
        let from = reading.status;
        match actor {
            Actor::Admin(_) => Ok(()),
            Actor::Reader(id) => {
                if *id != reading.reader_id {
                    return Err(EngineError::Forbidden(
                        "caller is not the reader of this reading".to_string(),
                    ));
                }
                // Moves outside the actor's row of the table are a permission
                // failure even for the record's own participant.
                match target {
                    ReadingStatus::InProgress if from.is_pre_start() => Ok(()),
                    ReadingStatus::Archived if from == ReadingStatus::InProgress => Ok(()),
                    _ => Err(EngineError::Forbidden(format!(
                        "reader cannot move a {} reading to {}",
                        from.as_str(),
                        target.as_str()
                    ))),
                }
            }
            Actor::Client(id) => {
                if *id != reading.client_id {
                    return Err(EngineError::Forbidden(
                        "caller is not the client of this reading".to_string(),
                    ));
                }
                match target {
                    ReadingStatus::Refunded if from.is_pre_start() => Ok(()),
                    ReadingStatus::Disputed if !from.is_terminal() => Ok(()),
                    _ => Err(EngineError::Forbidden(format!(
                        "client cannot move a {} reading to {}",
                        from.as_str(),
                        target.as_str()
                    ))),
                }
            }
        }
    }

    /// Reader availability side effects. Best-effort by design: the
    /// transition is already committed, so a failure here is logged and
    /// surfaced through tracing rather than rolled back.
    async fn apply_reader_status_effect(&self, reading: &Reading, from: ReadingStatus) {
        let result = match reading.status {
            ReadingStatus::InProgress => {
                self.set_reader_status(&reading.reader_id, ReaderStatus::Busy)
                    .await
            }
            ReadingStatus::Archived if from == ReadingStatus::InProgress => {
                self.release_reader_if_idle(reading).await
            }
            _ => return,
        };

        if let Err(err) = result {
            tracing::warn!(
                reading_id = %reading.id,
                reader_id = %reading.reader_id,
                %err,
                "reader status side effect failed"
            );
        }
    }

    /// Frees the reader only when this was their last `in_progress` reading.
    async fn release_reader_if_idle(&self, reading: &Reading) -> ResultEngine<()> {
        let busy_elsewhere = self
            .reader_has_other_in_progress(&reading.reader_id, &reading.id.to_string())
            .await?;
        if busy_elsewhere {
            return Ok(());
        }
        self.set_reader_status(&reading.reader_id, ReaderStatus::Available)
            .await
    }
}
