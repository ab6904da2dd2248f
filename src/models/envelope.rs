use serde::Deserialize;

use crate::core::error::{non_empty, ApiError};

/// Uniform wrapper around every student endpoint response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Unwrap `data`, propagating `message` when the backend reports failure
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: non_empty(Some(self.message)),
            });
        }

        self.data.ok_or(ApiError::MissingData)
    }

    /// Check `success` only; `data` is allowed to be null
    pub fn into_unit(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: non_empty(Some(self.message)),
            })
        }
    }
}
