use actix_web::error::{BlockingError, PathError};
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use bcrypt::BcryptError;
use http_api_problem::ApiError;
use std::fmt::Debug;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DacroqApiError(
    #[source]
    #[from]
    ApiError,
);

impl ResponseError for DacroqApiError {
    fn error_response(&self) -> actix_web::HttpResponse {
        self.0.error_response()
    }
}

impl DacroqApiError {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }
}

pub fn internal_server_error<E: std::fmt::Display>(prefix: &str, error: E) -> DacroqApiError {
    let builder = ApiError::builder(StatusCode::INTERNAL_SERVER_ERROR);
    DacroqApiError(if cfg!(debug_assertions) {
        builder.message(format!("{}: {}", prefix, error)).finish()
    } else {
        builder.finish()
    })
}

pub fn not_found(message: &str) -> DacroqApiError {
    ApiError::builder(StatusCode::NOT_FOUND)
        .message(message)
        .finish()
        .into()
}

pub fn forbidden(message: &str) -> DacroqApiError {
    ApiError::builder(StatusCode::FORBIDDEN)
        .message(message)
        .finish()
        .into()
}

pub fn bad_request(message: impl Into<String>) -> DacroqApiError {
    ApiError::builder(StatusCode::BAD_REQUEST)
        .message(message.into())
        .finish()
        .into()
}

impl From<diesel::result::Error> for DacroqApiError {
    fn from(e: diesel::result::Error) -> Self {
        internal_server_error("DieselError", e)
    }
}

impl From<diesel::r2d2::PoolError> for DacroqApiError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        internal_server_error("PoolError", e)
    }
}

impl From<BlockingError> for DacroqApiError {
    fn from(e: BlockingError) -> Self {
        internal_server_error("ActixBlockingError", e)
    }
}

impl From<BcryptError> for DacroqApiError {
    fn from(e: BcryptError) -> Self {
        internal_server_error("BcryptError", e)
    }
}

impl From<serde_plain::Error> for DacroqApiError {
    fn from(e: serde_plain::Error) -> Self {
        internal_server_error("StoredValueError", e)
    }
}

impl From<serde_json::Error> for DacroqApiError {
    fn from(e: serde_json::Error) -> Self {
        internal_server_error("StoredJsonError", e)
    }
}

impl From<crate::remote::RemoteError> for DacroqApiError {
    fn from(e: crate::remote::RemoteError) -> Self {
        ApiError::builder(StatusCode::BAD_GATEWAY)
            .title("Remote API Error")
            .message(e.to_string())
            .finish()
            .into()
    }
}

impl From<actix_web_validator::Error> for DacroqApiError {
    fn from(e: actix_web_validator::Error) -> Self {
        match e {
            actix_web_validator::Error::Validate(v) => v.into(),
            _ => bad_request(format!("{}", e)),
        }
    }
}

impl From<ValidationErrors> for DacroqApiError {
    fn from(e: ValidationErrors) -> Self {
        DacroqApiError(
            ApiError::builder(StatusCode::BAD_REQUEST)
                .message("One or more fields failed validation")
                .field("invalid-params", e.into_errors())
                .finish(),
        )
    }
}

impl From<PathError> for DacroqApiError {
    fn from(e: PathError) -> Self {
        DacroqApiError(
            ApiError::builder(StatusCode::NOT_FOUND)
                .message(format!("Unable to parse path parameter: {:#}", e))
                .finish(),
        )
    }
}

pub trait MapDieselUniqueViolation<T, F> {
    fn map_unique_violation(self, f: F) -> Result<T, DacroqApiError>;
}

impl<T, F> MapDieselUniqueViolation<T, F> for diesel::QueryResult<T>
where
    F: Fn(&dyn diesel::result::DatabaseErrorInformation) -> ApiError,
{
    fn map_unique_violation(self, f: F) -> Result<T, DacroqApiError> {
        self.map_err(|e| {
            if let diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                m,
            ) = &e
            {
                return f(m.as_ref()).into();
            }
            DacroqApiError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error};

    struct Info;

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("users")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
    }

    fn conflict(_: &dyn DatabaseErrorInformation) -> ApiError {
        ApiError::new(StatusCode::CONFLICT)
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let result: diesel::QueryResult<()> = Err(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info),
        ));
        let err = result.map_unique_violation(conflict).unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_errors_are_internal() {
        let result: diesel::QueryResult<()> = Err(Error::NotFound);
        let err = result.map_unique_violation(conflict).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
