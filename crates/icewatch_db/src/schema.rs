//! Table layout.
//!
//! ```text
//! days       2024-03-01                      products = ["p1","p2"], has_events
//! sessions   2024-03-01 / <session id>      product = "p1"
//! snapshots  2024-03-01 / <session id> / 1   payload = {...}
//!                                      / 2   payload = {...}
//! ```
//!
//! Text keys compare bytewise, so zero-padded dates sort chronologically.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS days (
        date TEXT PRIMARY KEY NOT NULL,
        products TEXT,
        has_events INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        date TEXT NOT NULL REFERENCES days(date),
        session_id TEXT NOT NULL,
        product TEXT,
        PRIMARY KEY (date, session_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS snapshots (
        date TEXT NOT NULL,
        session_id TEXT NOT NULL,
        seq INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (date, session_id, seq),
        FOREIGN KEY (date, session_id) REFERENCES sessions(date, session_id)
    )
    "#,
];
