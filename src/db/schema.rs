//! Database schema and migrations for Filebox.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: file records
    r#"
CREATE TABLE files (
    public_id         TEXT PRIMARY KEY,
    private_id        TEXT NOT NULL UNIQUE,
    email             TEXT NOT NULL,
    label             TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    file_extension    TEXT NOT NULL DEFAULT '',
    content_type      TEXT NOT NULL,
    file_size         INTEGER NOT NULL CHECK (file_size >= 0),
    created_at        TEXT NOT NULL,
    CHECK (public_id <> private_id)
);

CREATE INDEX idx_files_email ON files(email);
"#,
];
