//! Connection pool and schema setup for the review store.

use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
    SqliteConnection,
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS review_items (
        item_id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        item_type TEXT NOT NULL,
        content TEXT NOT NULL,
        ease_factor DOUBLE NOT NULL DEFAULT 2.5,
        interval_days DOUBLE NOT NULL DEFAULT 1.0,
        due_at TIMESTAMP NOT NULL,
        failure_count INTEGER NOT NULL DEFAULT 0,
        review_count INTEGER NOT NULL DEFAULT 0,
        priority INTEGER NOT NULL DEFAULT 0,
        requires_spoken BOOLEAN NOT NULL DEFAULT 0,
        explanation TEXT,
        source_evaluation_id TEXT,
        created_at TIMESTAMP NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_review_items_owner_due
        ON review_items (owner_id, due_at);
";

/// Creates the review tables if they don't exist yet
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute(SCHEMA_SQL)
}

/// Makes concurrent writers wait on the lock instead of failing straight away
#[derive(Debug)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(database_url: &str) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(BusyTimeout))
        .build(manager)
}

#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:").expect("in-memory sqlite");
    init_schema(&mut conn).expect("schema");
    conn
}

/// Single-connection in-memory pool, so every checkout sees the same database
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(BusyTimeout))
        .build(ConnectionManager::<SqliteConnection>::new(":memory:"))
        .expect("in-memory pool");
    init_schema(&mut pool.get().expect("connection")).expect("schema");
    pool
}
