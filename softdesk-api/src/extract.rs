/// Request extractors that reject with [`ApiError`]
///
/// axum's own `Json` and `Path` answer with plain text. These wrappers
/// route their rejections through `ApiError`, so a body that fails to
/// deserialize becomes a `422` naming the field, and a path segment that is
/// not a valid id becomes a `404`.
///
/// Handlers that must run the authorization gate first take
/// `Result<ApiJson<T>, ApiError>` and apply `?` after the gate.

use crate::error::{ApiError, ValidationErrorDetail};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Field used when a problem concerns the body as a whole
pub const BODY_FIELD: &str = "body";

const DESERIALIZE_PREFIX: &str = "target type: ";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = match &rejection {
            JsonRejection::JsonDataError(_) => data_error_detail(&rejection.body_text()),
            JsonRejection::MissingJsonContentType(_) => ValidationErrorDetail {
                field: BODY_FIELD.to_string(),
                message: "Expected a JSON body with `Content-Type: application/json`".to_string(),
            },
            _ => ValidationErrorDetail {
                field: BODY_FIELD.to_string(),
                message: strip_position(&rejection.body_text()).to_string(),
            },
        };

        tracing::debug!(field = %detail.field, message = %detail.message, "Rejected request body");

        ApiError::ValidationError(vec![detail])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                tracing::debug!(error = %e.body_text(), "Unresolvable path segment");
                ApiError::NotFound("Not found".to_string())
            }
            other => ApiError::InternalError(other.body_text()),
        }
    }
}

/// Turns a serde data error into a field detail
///
/// serde reports `missing field `x`` at the level of the enclosing object,
/// and `path: message` for errors inside a field.
fn data_error_detail(text: &str) -> ValidationErrorDetail {
    let reason = text
        .split_once(DESERIALIZE_PREFIX)
        .map_or(text, |(_, reason)| reason);
    let reason = strip_position(reason);

    let (path, message) = match reason.split_once(": ") {
        Some((path, message)) if is_field_path(path) => (Some(path), message),
        _ => (None, reason),
    };

    if let Some(missing) = missing_field(message) {
        let field = match path {
            Some(path) => format!("{path}.{missing}"),
            None => missing.to_string(),
        };
        return ValidationErrorDetail {
            field,
            message: "This field is required".to_string(),
        };
    }

    ValidationErrorDetail {
        field: path.unwrap_or(BODY_FIELD).to_string(),
        message: message.to_string(),
    }
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name)
}

fn is_field_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// Drops serde_json's trailing ` at line N column M`
fn strip_position(text: &str) -> &str {
    match text.rfind(" at line ") {
        Some(idx) if text[idx..].contains(" column ") => &text[..idx],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_named() {
        let detail = data_error_detail(
            "Failed to deserialize the JSON body into the target type: missing field `title` at line 1 column 21",
        );
        assert_eq!(detail.field, "title");
        assert_eq!(detail.message, "This field is required");
    }

    #[test]
    fn test_bad_value_is_attributed_to_its_field() {
        let detail = data_error_detail(
            "Failed to deserialize the JSON body into the target type: tag: unknown variant `bug`, expected one of `BUG`, `FEATURE`, `TASK` at line 1 column 30",
        );
        assert_eq!(detail.field, "tag");
        assert!(detail.message.starts_with("unknown variant `bug`"));
        assert!(!detail.message.contains("line 1"));
    }

    #[test]
    fn test_unattributable_error_falls_back_to_body() {
        let detail = data_error_detail(
            "Failed to deserialize the JSON body into the target type: invalid type: integer `3`, expected struct CreateProjectRequest at line 1 column 1",
        );
        assert_eq!(detail.field, BODY_FIELD);
        assert_eq!(
            detail.message,
            "invalid type: integer `3`, expected struct CreateProjectRequest"
        );
    }
}
