//! Users table (credit accounts).
//!
//! `credits` is only ever mutated through the ledger operations in
//! `ops::ledger`; nothing reads a balance into memory to write it back.

use sea_orm::entity::prelude::*;

use crate::EngineError;

/// Role of an authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Client,
    Reader,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Reader => "reader",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for UserRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "client" => Ok(Self::Client),
            "reader" => Ok(Self::Reader),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub password: String,
    pub role: String,
    pub credits: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
