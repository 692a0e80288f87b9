//! Connection handling for the `SQLite` store.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Acquires the connection mutex, recovering from poisoning.
///
/// A panic inside a previous critical section leaves the connection itself
/// usable, so the guard is taken back and a warning is logged.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Applies WAL journaling, NORMAL sync and a 5 second busy timeout.
///
/// In-memory databases silently keep the `memory` journal mode.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row, so pragma_update is used instead of execute_batch
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| Error::failed("configure_synchronous", e))?;
    conn.pragma_update(None, "busy_timeout", "5000")
        .map_err(|e| Error::failed("configure_busy_timeout", e))?;
    Ok(())
}

/// Runs `f` inside `BEGIN IMMEDIATE` / `COMMIT`, rolling back on error.
pub fn in_transaction<T>(conn: &Connection, f: impl FnOnce() -> Result<T>) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])
        .map_err(|e| Error::failed("begin_transaction", e))?;

    match f() {
        Ok(value) => {
            conn.execute("COMMIT", [])
                .map_err(|e| Error::failed("commit_transaction", e))?;
            Ok(value)
        },
        Err(e) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(e)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    *acquire_lock(&mutex) += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*acquire_lock(&mutex), 10);
    }

    #[test]
    fn test_acquire_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(7));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 7);
    }

    #[test]
    fn test_configure_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let synchronous: i32 = conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 1, "Expected NORMAL synchronous mode (1)");

        let busy_timeout: i32 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, 5000);
    }

    #[test]
    fn test_in_transaction_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v INTEGER)", []).unwrap();

        let result: Result<()> = in_transaction(&conn, || {
            conn.execute("INSERT INTO t (v) VALUES (1)", [])
                .map_err(|e| Error::failed("insert", e))?;
            Err(Error::failed("later_step", "boom"))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
