use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use platform_store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("bad request: {}", .0.join("; "))]
    InvalidInput(Vec<String>),
    #[error("transition rejected: {0}")]
    TransitionRejected(String),
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::TransitionRejected(_) => "TRANSITION_REJECTED",
            ApiError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(vec![message.into()])
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { kind, id } => ApiError::NotFound(format!("{} {}", kind, id)),
            StoreError::Rejected(message) => ApiError::PersistenceFailed(message),
            StoreError::Timeout => ApiError::PersistenceFailed("store request timed out".into()),
            other => {
                error!(error = %other, "record store failure");
                ApiError::internal(anyhow::Error::new(other))
            }
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        let mut err = Error::new(self.to_string());
        err = err.extend_with(|_err, e| {
            e.set("code", self.code());
        });
        if let ApiError::InvalidInput(messages) = self {
            let messages = messages.clone();
            err = err.extend_with(move |_err, e| {
                e.set("type", "BAD_REQUEST");
                e.set("messages", messages.clone());
            });
        }
        err
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    fn code_of(err: &Error) -> Option<Value> {
        err.extensions
            .as_ref()
            .and_then(|map| map.get("code"))
            .cloned()
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = internal_error(anyhow::anyhow!("boom"));
        assert_eq!(err.message, "internal server error");
        assert_eq!(code_of(&err), Some(Value::from("INTERNAL")));
    }

    #[test]
    fn store_failures_map_to_codes() {
        let missing: ApiError = StoreError::not_found("deal", 4).into();
        assert_eq!(code_of(&missing.extend()), Some(Value::from("NOT_FOUND")));
        let timeout: ApiError = StoreError::Timeout.into();
        assert_eq!(code_of(&timeout.extend()), Some(Value::from("PERSISTENCE_FAILED")));
        let broken: ApiError = StoreError::Decode("bad".into()).into();
        assert_eq!(broken.extend().message, "internal server error");
    }

    #[test]
    fn validation_errors_list_every_message() {
        let err = ApiError::InvalidInput(vec![
            "Name is required".into(),
            "Email is required".into(),
        ])
        .extend();
        assert_eq!(err.message, "bad request: Name is required; Email is required");
        let messages = err
            .extensions
            .as_ref()
            .and_then(|map| map.get("messages"))
            .cloned();
        assert_eq!(
            messages,
            Some(Value::List(vec![
                Value::from("Name is required"),
                Value::from("Email is required"),
            ]))
        );
    }
}
