//! Web layer errors

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::helpers::html_escape;
use crate::listing::SessionBusy;
use crate::source::FetchError;

/// Everything a request handler can fail with
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Busy(#[from] SessionBusy),

    #[error("failed to render page: {0}")]
    Render(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translation key of the message shown to visitors
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Fetch(_) | Self::Render(_) => "fetch_failed",
            Self::Busy(_) => "load_busy",
        }
    }
}

/// Bare page, used when the themed error page cannot be rendered either
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = format!(
            "<!DOCTYPE html><html><body><p>{}</p></body></html>",
            html_escape(&self.to_string())
        );
        (status, Html(body)).into_response()
    }
}
