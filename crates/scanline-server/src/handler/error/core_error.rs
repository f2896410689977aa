//! Conversions from OCR pipeline errors.

use scanline_core::{ErrorKind as CoreErrorKind, UnsupportedFormat};

use crate::handler::{Error, ErrorKind};

impl From<scanline_core::Error> for Error<'static> {
    fn from(err: scanline_core::Error) -> Self {
        let message = err.display_message().to_owned();

        match err.kind() {
            CoreErrorKind::InvalidInput => ErrorKind::BadRequest.with_message(message),
            CoreErrorKind::UnsupportedFormat => ErrorKind::UnsupportedFormat.with_message(message),
            _ => ErrorKind::OcrFailed.with_message(format!("OCR processing failed: {}", message)),
        }
    }
}

impl From<UnsupportedFormat> for Error<'static> {
    fn from(err: UnsupportedFormat) -> Self {
        ErrorKind::UnsupportedFormat.with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn invalid_input_is_client_error() {
        let error: Error = scanline_core::Error::invalid_input()
            .with_message("Invalid base64 payload: bad padding")
            .into();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), Some("Invalid base64 payload: bad padding"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_failure_is_server_error() {
        let error: Error = scanline_core::Error::network_error()
            .with_message("connection refused")
            .into();

        assert_eq!(error.kind(), ErrorKind::OcrFailed);
        assert_eq!(
            error.message(),
            Some("OCR processing failed: connection refused")
        );
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
