//! The `{status, statusCode, message, data}` envelope every collaborator returns.

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub status: bool,
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ServiceResponse<T> {
    pub fn ok(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            status_code,
            message: message.into(),
            data,
        }
    }

    pub fn failed(status_code: u16, message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            status: false,
            status_code,
            message: message.into(),
            data: T::default(),
        }
    }

    /// The payload, or a [`CollaboratorError::Rejected`] carrying the
    /// envelope's message.
    pub fn into_result(self, service: &'static str) -> Result<T, CollaboratorError> {
        if self.status {
            Ok(self.data)
        } else {
            Err(CollaboratorError::Rejected {
                service,
                status_code: self.status_code,
                message: self.message,
            })
        }
    }
}
