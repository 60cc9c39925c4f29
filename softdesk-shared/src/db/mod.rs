/// Database layer for SoftDesk
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Schema migrations embedded from `softdesk-shared/migrations/`
///
/// Models live in [`crate::models`] and are reached through
/// [`crate::store::PgStore`].
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use softdesk_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     })
///     .await?;
///
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
