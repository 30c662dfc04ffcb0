use anyhow::Error as AnyError;
use sqlx::{Error as SqlxError, error::DatabaseError};
use std::error::Error as StdError;

const SQLITE_UNIQUE_VIOLATION: &str = "2067";
const SQLITE_PRIMARY_KEY_VIOLATION: &str = "1555";

/// Returns `true` if the provided error represents a uniqueness constraint
/// violation. Races on membership attach and invitation tokens are settled
/// by the database; this helper lets callers translate the loser's error
/// into a Conflict.
pub fn is_unique_violation(err: &AnyError) -> bool {
    err.chain().any(is_unique_violation_cause)
}

fn is_unique_violation_cause(cause: &(dyn StdError + 'static)) -> bool {
    if let Some(sqlx_error) = cause.downcast_ref::<SqlxError>() {
        if matches_sqlx_unique(sqlx_error) {
            return true;
        }
    }

    message_indicates_unique(cause)
}

fn matches_sqlx_unique(err: &SqlxError) -> bool {
    match err {
        SqlxError::Database(db_err) => {
            if database_code_is_unique(db_err.as_ref()) {
                return true;
            }

            db_err
                .message()
                .to_ascii_lowercase()
                .contains("unique constraint")
        }
        _ => false,
    }
}

fn database_code_is_unique(err: &(dyn DatabaseError + 'static)) -> bool {
    err.code()
        .map(|code_ref| {
            matches!(
                code_ref.as_ref(),
                SQLITE_UNIQUE_VIOLATION | SQLITE_PRIMARY_KEY_VIOLATION
            )
        })
        .unwrap_or(false)
}

fn message_indicates_unique(err: &(dyn StdError + 'static)) -> bool {
    err.to_string()
        .to_ascii_lowercase()
        .contains("unique constraint failed")
}
