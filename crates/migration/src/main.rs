use sea_orm::Database;
use sea_orm_migration::prelude::*;

use migration::Migrator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cmd = std::env::args().nth(1);

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./oraculum.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match cmd.as_deref() {
        None | Some("up") => Migrator::up(&db, None).await?,
        Some("down") => Migrator::down(&db, None).await?,
        Some("fresh") => Migrator::fresh(&db).await?,
        Some("status") => Migrator::status(&db).await?,
        Some(other) => {
            eprintln!("unknown command {other:?}; expected up, down, fresh, or status");
            std::process::exit(2);
        }
    }

    Ok(())
}
