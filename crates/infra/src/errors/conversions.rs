//! Conversions from external infrastructure errors into domain errors.

use encore_common::StorageError;
use encore_domain::EncoreError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub EncoreError);

impl From<InfraError> for EncoreError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<EncoreError> for InfraError {
    fn from(value: EncoreError) -> Self {
        InfraError(value)
    }
}

trait IntoEncoreError {
    fn into_encore(self) -> EncoreError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → EncoreError */
/* -------------------------------------------------------------------------- */

impl IntoEncoreError for SqlError {
    fn into_encore(self) -> EncoreError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => EncoreError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        EncoreError::Database("database is locked".into())
                    }
                    // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        EncoreError::Conflict(message_or_default(message, "record already exists"))
                    }
                    // SQLITE_CONSTRAINT_FOREIGNKEY
                    (ErrorCode::ConstraintViolation, 787) => EncoreError::InvalidInput(
                        message_or_default(message, "referenced record does not exist"),
                    ),
                    _ => EncoreError::database(
                        message,
                        &format!("sqlite failure {:?} (code {})", err.code, err.extended_code),
                    ),
                }
            }
            RE::QueryReturnedNoRows => EncoreError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                EncoreError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                EncoreError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::Utf8Error(..) => EncoreError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                EncoreError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidQuery => EncoreError::Database("invalid SQL query".into()),
            other => EncoreError::Database(other.to_string()),
        }
    }
}

fn message_or_default(message: String, fallback: &str) -> String {
    encore_domain::message_or(message, fallback)
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_encore())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → EncoreError */
/* -------------------------------------------------------------------------- */

impl IntoEncoreError for StorageError {
    fn into_encore(self) -> EncoreError {
        match self {
            StorageError::Rusqlite(err) => err.into_encore(),
            StorageError::PoolExhausted => {
                EncoreError::Database("connection pool exhausted".into())
            }
            StorageError::Timeout(secs) => {
                EncoreError::Database(format!("timed out waiting for a connection after {secs}s"))
            }
            StorageError::InvalidConfig(msg) => EncoreError::Config(msg),
            other => EncoreError::database(other.to_string(), "database operation failed"),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_encore())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → EncoreError */
/* -------------------------------------------------------------------------- */

impl IntoEncoreError for HttpError {
    fn into_encore(self) -> EncoreError {
        if self.is_timeout() {
            return EncoreError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return EncoreError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => EncoreError::Auth(message),
                404 | 410 => EncoreError::NotFound(message),
                429 => EncoreError::Network(message),
                400..=499 => EncoreError::InvalidInput(message),
                _ => EncoreError::Network(message),
            };
        }

        if self.is_decode() {
            return EncoreError::Provider(format!("unexpected response body: {self}"));
        }

        EncoreError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_encore())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use tokio::runtime::Runtime;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sqlite_failure(code: ErrorCode, extended_code: i32, message: &str) -> SqlError {
        SqlError::SqliteFailure(FfiError { code, extended_code }, Some(message.into()))
    }

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = sqlite_failure(ErrorCode::DatabaseBusy, 5, "database is locked");
        let mapped: EncoreError = InfraError::from(err).into();
        assert_eq!(mapped, EncoreError::Database("database is busy".into()));
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = sqlite_failure(
            ErrorCode::ConstraintViolation,
            2067,
            "UNIQUE constraint failed: gig_roles.gig_id, gig_roles.musician_id",
        );
        let mapped: EncoreError = InfraError::from(err).into();
        assert!(matches!(mapped, EncoreError::Conflict(msg) if msg.contains("gig_roles")));
    }

    #[test]
    fn foreign_key_violation_is_invalid_input() {
        let err = sqlite_failure(ErrorCode::ConstraintViolation, 787, "");
        let mapped: EncoreError = InfraError::from(err).into();
        assert_eq!(mapped, EncoreError::InvalidInput("referenced record does not exist".into()));
    }

    #[test]
    fn pool_timeout_maps_to_database_error() {
        let mapped: EncoreError = InfraError::from(StorageError::Timeout(5)).into();
        assert!(matches!(mapped, EncoreError::Database(msg) if msg.contains("5s")));
    }

    fn variant(err: &EncoreError) -> &'static str {
        match err {
            EncoreError::Auth(_) => "auth",
            EncoreError::NotFound(_) => "not_found",
            EncoreError::InvalidInput(_) => "invalid_input",
            EncoreError::Network(_) => "network",
            _ => "other",
        }
    }

    #[test]
    fn http_status_codes_map_to_domain_errors() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let server = MockServer::start().await;
            for (status, expected) in
                [(401_u16, "auth"), (410, "not_found"), (422, "invalid_input"), (503, "network")]
            {
                server.reset().await;
                Mock::given(method("GET"))
                    .respond_with(ResponseTemplate::new(status))
                    .mount(&server)
                    .await;

                let err = Client::new()
                    .get(server.uri())
                    .send()
                    .await
                    .unwrap()
                    .error_for_status()
                    .unwrap_err();
                let mapped: EncoreError = InfraError::from(err).into();
                assert_eq!(variant(&mapped), expected, "status {status} mapped to {mapped:?}");
            }
        });
    }
}
