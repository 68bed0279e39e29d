/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("no route for activity {activity_type:?} with object {object_type:?}")]
    NoRoute {
        activity_type: String,
        object_type: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("resolve {url:?}: {source:#}")]
    Resolve {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{step}: {source:#}")]
    Store {
        step: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("config: {0}")]
    Config(String),
}

impl InboxError {
    /// Status the HTTP boundary should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            InboxError::NoRoute { .. } => StatusCode::NOT_IMPLEMENTED,
            InboxError::NotFound(_) => StatusCode::NOT_FOUND,
            InboxError::Forbidden(_) => StatusCode::FORBIDDEN,
            InboxError::BadRequest(_) => StatusCode::BAD_REQUEST,
            InboxError::Resolve { .. } => StatusCode::BAD_GATEWAY,
            InboxError::Store { .. } | InboxError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when redelivering the same activity cannot change the outcome.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            InboxError::NoRoute { .. }
                | InboxError::NotFound(_)
                | InboxError::Forbidden(_)
                | InboxError::BadRequest(_)
        )
    }
}

/// Attaches the failing step to a collaborator error.
pub trait StepExt<T> {
    fn step<F, S>(self, f: F) -> Result<T, InboxError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> StepExt<T> for anyhow::Result<T> {
    fn step<F, S>(self, f: F) -> Result<T, InboxError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| InboxError::Store {
            step: f().into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_the_failing_operation() {
        let res: anyhow::Result<()> = Err(anyhow::anyhow!("disk full"));
        let err = res.step(|| "save message user=u1").unwrap_err();
        assert_eq!(err.to_string(), "save message user=u1: disk full");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_permanent());
    }

    #[test]
    fn no_route_names_both_types() {
        let err = InboxError::NoRoute {
            activity_type: "Move".to_string(),
            object_type: "Person".to_string(),
        };
        assert!(err.to_string().contains("\"Move\""));
        assert!(err.to_string().contains("\"Person\""));
        assert!(err.is_permanent());
    }
}
