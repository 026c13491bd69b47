// Leadwatch Infrastructure - SQLite Adapter
// Implements: LeadRepository, ReportRepository, DatasetCatalog, StoreProbe

mod connection;
mod datasets;
mod lead_repository;
mod migration;
mod report_repository;
mod store_probe;

pub use connection::create_pool;
pub use datasets::SqliteDatasetCatalog;
pub use lead_repository::SqliteLeadRepository;
pub use migration::run_migrations;
pub use report_repository::SqliteReportRepository;
pub use store_probe::SqliteStoreProbe;

use leadwatch_core::error::AppError;

// sqlx::Error cannot get a From impl for AppError here (orphan rules), so
// every adapter funnels through this helper.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "787" | "3850" => AppError::Database(format!(
                        "Foreign key constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {col}")),
        _ => AppError::Database(err.to_string()),
    }
}
