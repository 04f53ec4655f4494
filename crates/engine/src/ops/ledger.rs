//! Credit ledger primitives.
//!
//! The only sanctioned mutators of `users.credits`. Both operations are a
//! single SQL statement so that two concurrent settlements against the same
//! account cannot race into a lost update or a double-spend.

use sea_orm::{ConnectionTrait, Statement, prelude::*};

use crate::{EngineError, ResultEngine, users};

use super::Engine;

impl Engine {
    /// Current credit balance of a user.
    pub async fn credit_balance(&self, user_id: &str) -> ResultEngine<i64> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        Ok(model.credits)
    }

    /// Atomically removes `amount` credits from a user's balance.
    ///
    /// The balance check and the decrement are one conditional UPDATE; zero
    /// affected rows means the user is unknown or the balance is too low.
    pub async fn debit(&self, user_id: &str, amount: i64) -> ResultEngine<i64> {
        if amount <= 0 {
            return Err(EngineError::Validation(format!(
                "debit amount must be positive, got {amount}"
            )));
        }

        let backend = self.database.get_database_backend();
        let result = self
            .database
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE users SET credits = credits - ? WHERE id = ? AND credits >= ?",
                vec![amount.into(), user_id.into(), amount.into()],
            ))
            .await?;

        if result.rows_affected() == 0 {
            let balance = self.credit_balance(user_id).await?;
            return Err(EngineError::InsufficientFunds(format!(
                "balance {balance} cannot cover {amount}"
            )));
        }

        self.credit_balance(user_id).await
    }

    /// Atomically adds `amount` credits to a user's balance.
    pub async fn credit(&self, user_id: &str, amount: i64) -> ResultEngine<i64> {
        if amount <= 0 {
            return Err(EngineError::Validation(format!(
                "credit amount must be positive, got {amount}"
            )));
        }

        let backend = self.database.get_database_backend();
        let result = self
            .database
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE users SET credits = credits + ? WHERE id = ?",
                vec![amount.into(), user_id.into()],
            ))
            .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }

        self.credit_balance(user_id).await
    }

    /// Undoes a ledger mutation after a failed record write, then resurfaces
    /// the original error. A failed compensation leaves the two aggregates
    /// diverged and is reported as a settlement conflict instead.
    pub(super) async fn compensate(
        &self,
        user_id: &str,
        signed_amount: i64,
        original: EngineError,
    ) -> EngineError {
        let result = if signed_amount > 0 {
            // The debit succeeded but the record write did not; give it back.
            self.credit(user_id, signed_amount).await
        } else {
            self.debit(user_id, -signed_amount).await
        };

        match result {
            Ok(_) => original,
            Err(err) => {
                tracing::error!(
                    user_id,
                    signed_amount,
                    %err,
                    "compensating ledger mutation failed after record write error: {original}"
                );
                EngineError::Conflict(format!(
                    "settlement could not be rolled back for {user_id}"
                ))
            }
        }
    }
}
