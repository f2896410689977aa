//! Document recognition handlers.
//!
//! `POST /ocr` decodes a base64 upload, detects whether it is an image or a
//! PDF, submits it to the OCR engine and normalizes the engine output into
//! text lines. `POST /reinit` reconnects the engine.

use std::time::Instant;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use scanline_core::{Document, OcrInput, decode_payload, normalize_pages, prepare_image};

use crate::extract::Json;
use crate::handler::request::RecognizeDocument;
use crate::handler::response::{ErrorResponse, Recognition, Reinitialization};
use crate::handler::{ErrorKind, Result};
use crate::service::{OcrHandle, ServiceConfig, ServiceState};

/// Tracing target for document recognition.
const TRACING_TARGET: &str = "scanline_server::handler::ocr";

/// Runs OCR on an uploaded image or PDF.
#[tracing::instrument(skip_all)]
async fn recognize_document(
    State(ocr): State<OcrHandle>,
    State(config): State<ServiceConfig>,
    request: Option<Json<RecognizeDocument>>,
) -> Result<(StatusCode, Json<Recognition>)> {
    let started = Instant::now();

    let Some(provider) = ocr.current().await else {
        tracing::warn!(target: TRACING_TARGET, "OCR request rejected, engine not initialized");
        return Err(ErrorKind::OcrNotInitialized.into_error());
    };

    let Some(file) = request.and_then(|Json(request)| request.file) else {
        return Err(ErrorKind::BadRequest.with_message("No file data provided"));
    };

    let payload = decode_payload(&file)?;
    drop(file);

    tracing::debug!(
        target: TRACING_TARGET,
        size = payload.len(),
        mime_hint = payload.mime_hint.as_deref(),
        "Decoded upload payload",
    );

    let max_side = config.ocr_max_side;
    let (input, page_count) = tokio::task::spawn_blocking(move || {
        match Document::sniff(&payload.bytes)? {
            Document::Image(image) => {
                let prepared = prepare_image(image, max_side)?;
                if prepared.was_downscaled() {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        original_width = prepared.original_width,
                        original_height = prepared.original_height,
                        width = prepared.width,
                        height = prepared.height,
                        "Downscaled image before recognition",
                    );
                }
                Ok::<_, scanline_core::Error>((OcrInput::image(&prepared), None))
            }
            Document::Pdf { bytes, page_count } => {
                Ok((OcrInput::pdf(bytes), Some(page_count)))
            }
        }
    })
    .await
    .map_err(|e| {
        tracing::error!(target: TRACING_TARGET, error = %e, "Document preparation task failed");
        ErrorKind::InternalServerError.into_error()
    })??;

    let file_type = input.kind;
    let pages = provider.predict(input).await.map_err(|e| {
        tracing::error!(target: TRACING_TARGET, error = %e, "OCR engine failed");
        ErrorKind::OcrFailed.with_message(format!("OCR processing failed: {}", e.display_message()))
    })?;

    let results = normalize_pages(file_type, &pages);
    let processing_time = started.elapsed().as_secs_f64();

    tracing::info!(
        target: TRACING_TARGET,
        file_type = %file_type,
        pages = pages.len(),
        lines = results.len(),
        processing_time,
        "Document recognized",
    );

    let mut recognition = Recognition::new(file_type, results, processing_time);
    if let Some(page_count) = page_count {
        recognition = recognition.with_page_count(page_count);
    }

    Ok((StatusCode::OK, Json(recognition)))
}

fn recognize_document_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Recognize document")
        .description(
            "Runs OCR on a base64-encoded image or PDF. The payload may be prefixed with \
             `data:<mime>;base64,`. PDF lines carry a 1-based `page` number.",
        )
        .response::<200, Json<Recognition>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Replaces the current OCR engine connection with a new one.
#[tracing::instrument(skip_all)]
async fn reinitialize_engine(
    State(ocr): State<OcrHandle>,
) -> (StatusCode, Json<Reinitialization>) {
    tracing::info!(target: TRACING_TARGET, "OCR reinitialization requested");

    if ocr.reinitialize().await {
        (StatusCode::OK, Json(Reinitialization::succeeded()))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Reinitialization::failed()),
        )
    }
}

fn reinitialize_engine_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Reinitialize OCR engine")
        .description("Reconnects to the OCR engine, replacing the current connection.")
        .response::<200, Json<Reinitialization>>()
        .response::<500, Json<Reinitialization>>()
}

/// Returns a [`Router`] with all recognition routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/ocr", post_with(recognize_document, recognize_document_docs))
        .api_route(
            "/reinit",
            post_with(reinitialize_engine, reinitialize_engine_docs),
        )
        .with_path_items(|item| item.tag("Recognition"))
}

#[cfg(test)]
mod tests {
    use scanline_core::FileKind;
    use scanline_test::fixtures::{data_url, pdf_base64, pdf_bytes, png_base64};
    use scanline_test::{MockOcrConfig, MockOcrFactory, MockOcrProvider};
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{create_test_server_with_factory, create_test_server_with_router};

    #[tokio::test]
    async fn recognizes_image() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(png_base64(64, 32)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_success();

        let recognition = response.json::<Recognition>();
        assert!(recognition.success);
        assert_eq!(recognition.file_type, FileKind::Image);
        assert_eq!(recognition.results.len(), 1);
        assert_eq!(recognition.results[0].text, "MOCK OCR TEXT");
        assert!(recognition.results[0].page.is_none());
        assert!(recognition.page_count.is_none());
        assert!(recognition.processing_time >= 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn recognizes_data_url_image() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let bytes = scanline_test::fixtures::png_bytes(16, 16);
        let request = RecognizeDocument {
            file: Some(data_url("image/png", &bytes)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_success();
        assert_eq!(response.json::<Recognition>().file_type, FileKind::Image);

        Ok(())
    }

    #[tokio::test]
    async fn recognizes_pdf_pages_from_one() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(pdf_base64(3)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_success();

        let recognition = response.json::<Recognition>();
        assert_eq!(recognition.file_type, FileKind::Pdf);
        assert_eq!(recognition.page_count, Some(3));

        let pages: Vec<_> = recognition.results.iter().filter_map(|line| line.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);

        Ok(())
    }

    #[tokio::test]
    async fn pdf_data_url_is_accepted() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(data_url("application/pdf", &pdf_bytes(1))),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_success();
        assert_eq!(response.json::<Recognition>().page_count, Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server.post("/ocr").json(&json!({})).await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        assert_eq!(body["error"], "No file data provided");
        assert_eq!(body["success"], false);

        Ok(())
    }

    #[tokio::test]
    async fn null_file_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server.post("/ocr").json(&json!({ "file": null })).await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn invalid_base64_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server
            .post("/ocr")
            .json(&json!({ "file": "not base64 at all!" }))
            .await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn unsupported_format_surfaces_both_errors() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(data_url("text/plain", b"just some plain text")),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        let error = body["error"].as_str().unwrap_or_default();
        assert!(error.contains("Image error"));
        assert!(error.contains("PDF error"));

        Ok(())
    }

    #[tokio::test]
    async fn uninitialized_engine_is_reported() -> anyhow::Result<()> {
        let server =
            create_test_server_with_factory(MockOcrFactory::unavailable(), |_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(png_base64(8, 8)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_internal_server_error();
        assert_eq!(response.json::<Value>()["error"], "OCR not initialized");

        Ok(())
    }

    #[tokio::test]
    async fn engine_failure_is_reported() -> anyhow::Result<()> {
        let factory = MockOcrFactory::from_provider(MockOcrProvider::failing("pipeline crashed"));
        let server = create_test_server_with_factory(factory, |_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(png_base64(8, 8)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_internal_server_error();

        let body = response.json::<Value>();
        let error = body["error"].as_str().unwrap_or_default();
        assert!(error.starts_with("OCR processing failed: "));
        assert!(error.contains("pipeline crashed"));
        assert_eq!(body["success"], false);

        Ok(())
    }

    #[tokio::test]
    async fn image_without_text_yields_empty_results() -> anyhow::Result<()> {
        let provider = MockOcrProvider::returning(vec![json!({ "rec_texts": [] })]);
        let factory = MockOcrFactory::from_provider(provider);
        let server = create_test_server_with_factory(factory, |_| routes()).await?;

        let request = RecognizeDocument {
            file: Some(png_base64(8, 8)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["file_type"], "image");
        assert_eq!(body["results"], json!([]));

        Ok(())
    }

    #[tokio::test]
    async fn failed_reinit_keeps_working_engine() -> anyhow::Result<()> {
        let factory = MockOcrFactory::new(MockOcrConfig::default());
        let server = create_test_server_with_factory(factory.clone(), |_| routes()).await?;

        factory.set_unavailable(true);
        server
            .post("/reinit")
            .await
            .assert_status_internal_server_error();

        let request = RecognizeDocument {
            file: Some(png_base64(8, 8)),
        };
        let response = server.post("/ocr").json(&request).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Recognition>().results[0].text, "MOCK OCR TEXT");

        Ok(())
    }

    #[tokio::test]
    async fn reinit_recovers_engine() -> anyhow::Result<()> {
        let factory = MockOcrFactory::unavailable();
        let server = create_test_server_with_factory(factory.clone(), |_| routes()).await?;

        let response = server.post("/reinit").await;
        response.assert_status_internal_server_error();
        let outcome = response.json::<Reinitialization>();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to reinitialize OCR");

        factory.set_unavailable(false);
        let response = server.post("/reinit").await;
        response.assert_status_success();
        assert!(response.json::<Reinitialization>().success);

        let request = RecognizeDocument {
            file: Some(png_base64(8, 8)),
        };
        server.post("/ocr").json(&request).await.assert_status_success();

        Ok(())
    }

    #[tokio::test]
    async fn reinit_replaces_provider() -> anyhow::Result<()> {
        let factory = MockOcrFactory::new(MockOcrConfig::default());
        let server = create_test_server_with_factory(factory.clone(), |_| routes()).await?;
        assert_eq!(factory.created(), 1);

        server.post("/reinit").await.assert_status_success();
        assert_eq!(factory.created(), 2);

        Ok(())
    }
}
