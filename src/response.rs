//! JSON payloads and status codes handed back to callers
//!
//! Each operation result maps to an `ApiResponse`: a status code in the HTTP
//! sense and a JSON body, either the data itself or an error object.

use serde::Serialize;
use serde_json::{json, Value};

use crate::data::{Advice, AdviceError, UserError, WeatherInfo};
use crate::lookup::LookupError;

pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const CONFLICT: u16 = 409;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// A status code and JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Serializes `data` as the body
    pub fn data<T: Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }

    /// A `{"error": message}` body
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// A `{"message": message}` body, used by account operations
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl LookupError {
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::RemoteUnavailable(_) | LookupError::MalformedResponse(_) => NOT_FOUND,
            LookupError::Unauthenticated => UNAUTHORIZED,
            LookupError::InvalidCity => BAD_REQUEST,
        }
    }

    /// Message shown to the caller; provider details stay in the logs
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::RemoteUnavailable(_) | LookupError::MalformedResponse(_) => {
                "Weather data not found"
            }
            LookupError::Unauthenticated => "User not authenticated",
            LookupError::InvalidCity => "City name must not be empty",
        }
    }
}

impl AdviceError {
    pub fn status_code(&self) -> u16 {
        match self {
            AdviceError::InvalidMonth(_)
            | AdviceError::NotFound
            | AdviceError::AdviceNotFound(_) => NOT_FOUND,
            AdviceError::Validation(_) => BAD_REQUEST,
        }
    }
}

impl UserError {
    pub fn status_code(&self) -> u16 {
        match self {
            UserError::Validation(_) => BAD_REQUEST,
            UserError::DuplicateEmail(_) => CONFLICT,
            UserError::NotFound(_) => NOT_FOUND,
            UserError::Forbidden => FORBIDDEN,
        }
    }
}

pub fn weather_response(result: &Result<WeatherInfo, LookupError>) -> ApiResponse {
    match result {
        Ok(info) => ApiResponse::data(OK, info),
        Err(e) => ApiResponse::error(e.status_code(), e.user_message()),
    }
}

pub fn advice_list_response(result: &Result<Vec<&Advice>, AdviceError>) -> ApiResponse {
    match result {
        Ok(advices) => ApiResponse::data(OK, advices),
        Err(e) => ApiResponse::error(e.status_code(), e.to_string()),
    }
}

impl From<AdviceError> for ApiResponse {
    fn from(err: AdviceError) -> Self {
        ApiResponse::error(err.status_code(), err.to_string())
    }
}

impl From<UserError> for ApiResponse {
    fn from(err: UserError) -> Self {
        ApiResponse::message(err.status_code(), err.to_string())
    }
}
