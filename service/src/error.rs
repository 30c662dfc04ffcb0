use std::fmt;

use anyhow::Error as AnyError;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tracing::error;

#[derive(Debug, Clone, Copy)]
struct ErrorDescriptor {
    status: u16,
    name: &'static str,
    error_type: &'static str,
    default_message: &'static str,
}

const UNAUTHORIZED_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 403,
    name: "ACTION_FORBIDDEN",
    error_type: "NO_PERMISSION",
    default_message: "You are not authorized.",
};

const NOT_FOUND_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 404,
    name: "NOT_FOUND",
    error_type: "RESOURCE_NOT_FOUND",
    default_message: "Resource not found.",
};

const CONFLICT_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 409,
    name: "RESOURCE_ALREADY_EXISTS",
    error_type: "RESOURCE_ALREADY_EXISTS",
    default_message: "Resource already exists.",
};

const GONE_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 410,
    name: "RESOURCE_GONE",
    error_type: "RESOURCE_GONE",
    default_message: "Resource is no longer available.",
};

const VALIDATION_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 422,
    name: "VALIDATION_ERROR",
    error_type: "VALIDATION_ERROR",
    default_message: "Invalid input.",
};

const INTERNAL_SERVER_ERROR_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: 500,
    name: "INTERNAL_SERVER_ERROR",
    error_type: "INTERNAL_SERVER_ERROR",
    default_message: "An internal error occurred.",
};

/// Operation failure with a stable kind and message. Authorization and
/// existence checks surface through here before any mutation runs.
#[derive(Debug)]
pub struct AppError {
    descriptor: &'static ErrorDescriptor,
    name: String,
    error_type: String,
    message: String,
    data: Option<JsonValue>,
    source: Option<AnyError>,
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_descriptor(&UNAUTHORIZED_DESCRIPTOR, Some(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message.into()))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::from_descriptor(&CONFLICT_DESCRIPTOR, Some(message.into()))
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::from_descriptor(&GONE_DESCRIPTOR, Some(message.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::from_descriptor(&VALIDATION_DESCRIPTOR, Some(message.into()))
    }

    pub fn internal(error: AnyError) -> Self {
        error!(?error, "internal service error");
        Self::from_descriptor(&INTERNAL_SERVER_ERROR_DESCRIPTOR, None).with_source(error)
    }

    pub fn from_anyhow(error: AnyError) -> Self {
        Self::internal(error)
    }

    pub fn workspace_not_found(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("Workspace {workspace_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("WORKSPACE_NOT_FOUND")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub fn task_not_found(task_id: &str) -> Self {
        let task_id = task_id.to_owned();
        let message = format!("Task {task_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("TASK_NOT_FOUND")
            .with_data(json!({ "taskId": task_id }))
    }

    pub fn art_not_found(art_id: &str) -> Self {
        let art_id = art_id.to_owned();
        let message = format!("Art {art_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("ART_NOT_FOUND")
            .with_data(json!({ "artId": art_id }))
    }

    pub fn workspace_access_denied(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("You do not have permission to access workspace {workspace_id}.");

        Self::from_descriptor(&UNAUTHORIZED_DESCRIPTOR, Some(message))
            .with_name("WORKSPACE_ACCESS_DENIED")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub fn status(&self) -> u16 {
        self.descriptor.status
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_payload(self) -> ErrorPayload {
        let AppError {
            descriptor,
            name,
            error_type,
            message,
            data,
            source: _,
        } = self;

        ErrorPayload {
            status: descriptor.status,
            error_type,
            name,
            message,
            data,
        }
    }

    fn from_descriptor(descriptor: &'static ErrorDescriptor, message: Option<String>) -> Self {
        Self {
            descriptor,
            name: descriptor.name.to_owned(),
            error_type: descriptor.error_type.to_owned(),
            message: message.unwrap_or_else(|| descriptor.default_message.to_owned()),
            data: None,
            source: None,
        }
    }

    fn with_source(mut self, error: AnyError) -> Self {
        self.source = Some(error);
        self
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

/// Serializable shape of a failed operation, stable across transports.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub status: u16,
    #[serde(rename = "type")]
    pub error_type: String,
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_contract() {
        let payload = AppError::validation("email must not be empty").into_payload();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["type"], "VALIDATION_ERROR");
        assert_eq!(json["name"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "email must not be empty");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn workspace_not_found_carries_domain_metadata() {
        let err = AppError::workspace_not_found("ws-123");
        assert_eq!(err.status(), 404);
        assert_eq!(err.name(), "WORKSPACE_NOT_FOUND");

        let payload = err.into_payload();
        assert_eq!(payload.data.unwrap()["workspaceId"], "ws-123");
    }

    #[test]
    fn status_classes_cover_the_taxonomy() {
        assert_eq!(AppError::unauthorized("x").status(), 403);
        assert_eq!(AppError::not_found("x").status(), 404);
        assert_eq!(AppError::conflict("x").status(), 409);
        assert_eq!(AppError::gone("x").status(), 410);
        assert_eq!(AppError::validation("x").status(), 422);
        assert_eq!(AppError::internal(anyhow::anyhow!("boom")).status(), 500);
    }
}
