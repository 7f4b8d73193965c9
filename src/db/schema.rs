//! Database schema and migrations for depot.
//!
//! Each migration is a SQL script executed in order; the schema_version
//! table tracks which migrations have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table with storage accounting
    r#"
-- Users table for authentication and storage accounting
CREATE TABLE users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    username            TEXT NOT NULL UNIQUE,
    email               TEXT NOT NULL UNIQUE,    -- stored case-normalized
    password            TEXT NOT NULL,           -- Argon2 hash
    is_admin            INTEGER NOT NULL DEFAULT 0,
    total_storage_used  REAL NOT NULL DEFAULT 0, -- bytes
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    last_login          TEXT
);

CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_storage ON users(total_storage_used);
"#,
    // v2: Files table
    r#"
-- File metadata; stored_name maps 1:1 to an on-disk object
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    stored_name     TEXT NOT NULL UNIQUE,
    uploaded_name   TEXT NOT NULL,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    content_type    TEXT,
    path            TEXT NOT NULL UNIQUE,
    size            REAL NOT NULL,               -- bytes
    uploaded_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_owner_id ON files(owner_id);
CREATE INDEX idx_files_uploaded_at ON files(uploaded_at);
CREATE INDEX idx_files_content_type ON files(content_type);
"#,
    // v3: Analytics events (append-only)
    r#"
-- Append-only event log; user_id is NULL for system-generated events
CREATE TABLE analytics_events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER REFERENCES users(id) ON DELETE CASCADE,
    event_type  TEXT NOT NULL,
    timestamp   TEXT NOT NULL DEFAULT (datetime('now')),
    details     TEXT                             -- JSON payload
);

CREATE INDEX idx_events_user_id ON analytics_events(user_id);
CREATE INDEX idx_events_event_type ON analytics_events(event_type);
CREATE INDEX idx_events_timestamp ON analytics_events(timestamp);
"#,
];
