use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

/// The store mirrors browser local storage: plain string keys and values,
/// unversioned, each value overwritten wholesale.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    debug!("Session store migrations complete");
    Ok(())
}
