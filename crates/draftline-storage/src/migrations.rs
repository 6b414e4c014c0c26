// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations (refinery). Applied on every open.

use draftline_core::DraftlineError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. History lives in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), DraftlineError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| DraftlineError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
