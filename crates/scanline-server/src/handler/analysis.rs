//! ICD-10 code extraction handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::Json;
use crate::handler::request::AnalyzeText;
use crate::handler::response::{CodeExtraction, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{CodingHandle, ServiceState};

/// Tracing target for ICD-10 analysis.
const TRACING_TARGET: &str = "scanline_server::handler::analysis";

/// Extracts ICD-10 codes from clinical text using the configured LLM.
#[tracing::instrument(skip_all)]
async fn analyze_text(
    State(coding): State<CodingHandle>,
    request: Option<Json<AnalyzeText>>,
) -> Result<(StatusCode, Json<CodeExtraction>)> {
    let Some(text) = request.and_then(|Json(request)| request.text) else {
        return Err(ErrorKind::BadRequest.with_message("No text data provided"));
    };

    if text.trim().is_empty() {
        return Err(ErrorKind::BadRequest.with_message("Empty text provided"));
    }

    let Some(service) = coding.get() else {
        tracing::warn!(target: TRACING_TARGET, "Analysis requested without an OpenAI API key");
        return Err(ErrorKind::NotConfigured.with_message(
            "OpenAI API key not configured. Please set OPENAI_API_KEY environment variable.",
        ));
    };

    let text_length = text.chars().count();
    tracing::info!(target: TRACING_TARGET, text_length, "Analyzing text");

    let analysis = service.analyze(&text).await.inspect_err(|e| {
        tracing::error!(target: TRACING_TARGET, error = %e, "ICD-10 analysis failed");
    })?;

    let extraction = CodeExtraction {
        success: true,
        analysis,
        text_length,
    };

    Ok((StatusCode::OK, Json(extraction)))
}

fn analyze_text_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Extract ICD-10 codes")
        .description(
            "Sends the text to an OpenAI-compatible model for ICD-10 extraction. Codes \
             returned without a description are looked up in the NIH Clinical Tables API.",
        )
        .response::<200, Json<CodeExtraction>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all analysis routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/analyze-openai", post_with(analyze_text, analyze_text_docs))
        .with_path_items(|item| item.tag("Analysis"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scanline_openai::CodingService;
    use scanline_test::{MockCodeLookup, MockCompletionProvider, create_mock_coding_service};
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{
        create_test_server_with_router, create_test_server_with_state, create_test_state,
    };

    const REPLY: &str = r#"{
        "icd_codes": [
            {"code": "E11.9", "description": "Type 2 diabetes mellitus without complications", "confidence": "high"},
            {"code": "I10", "confidence": "medium"}
        ],
        "summary": "Diabetes and hypertension",
        "total_codes": 2
    }"#;

    async fn server_with(service: CodingService) -> anyhow::Result<axum_test::TestServer> {
        let state = create_test_state().await?.with_coding_service(service);
        create_test_server_with_state(routes(), state).await
    }

    #[tokio::test]
    async fn missing_text_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server.post("/analyze-openai").json(&json!({})).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "No text data provided");

        Ok(())
    }

    #[tokio::test]
    async fn blank_text_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let response = server
            .post("/analyze-openai")
            .json(&json!({ "text": "   \n" }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "Empty text provided");

        Ok(())
    }

    #[tokio::test]
    async fn missing_api_key_is_reported() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes()).await?;

        let request = AnalyzeText {
            text: Some("Patient has type 2 diabetes.".to_owned()),
        };
        let response = server.post("/analyze-openai").json(&request).await;
        response.assert_status_internal_server_error();

        let error = response.json::<Value>()["error"].as_str().unwrap_or_default().to_owned();
        assert!(error.contains("OPENAI_API_KEY"));

        Ok(())
    }

    #[tokio::test]
    async fn extracts_and_enriches_codes() -> anyhow::Result<()> {
        let lookup = MockCodeLookup::default().with_entry("I10", "Essential (primary) hypertension");
        let service = CodingService::new(
            Arc::new(MockCompletionProvider::new(REPLY)),
            Arc::new(lookup),
        );
        let server = server_with(service).await?;

        let text = "Patient has type 2 diabetes and high blood pressure.";
        let request = AnalyzeText {
            text: Some(text.to_owned()),
        };
        let response = server.post("/analyze-openai").json(&request).await;
        response.assert_status_ok();

        let extraction = response.json::<CodeExtraction>();
        assert!(extraction.success);
        assert_eq!(extraction.text_length, text.chars().count());
        assert_eq!(extraction.analysis.total_codes, 2);
        assert_eq!(
            extraction.analysis.icd_codes[1].description,
            "Essential (primary) hypertension"
        );

        Ok(())
    }

    #[tokio::test]
    async fn text_is_forwarded_untrimmed() -> anyhow::Result<()> {
        let completion = MockCompletionProvider::new(REPLY);
        let service = CodingService::new(
            Arc::new(completion.clone()),
            Arc::new(MockCodeLookup::default()),
        );
        let server = server_with(service).await?;

        let text = "\n  Patient has hypertension.  \n";
        let request = AnalyzeText {
            text: Some(text.to_owned()),
        };
        let response = server.post("/analyze-openai").json(&request).await;
        response.assert_status_ok();
        assert_eq!(response.json::<CodeExtraction>().text_length, text.chars().count());

        let messages = completion.last_request();
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        assert!(prompt.ends_with(text));

        Ok(())
    }

    #[tokio::test]
    async fn unparsed_reply_is_returned_verbatim() -> anyhow::Result<()> {
        let server = server_with(create_mock_coding_service("not json")).await?;

        let request = AnalyzeText {
            text: Some("Headache".to_owned()),
        };
        let response = server.post("/analyze-openai").json(&request).await;
        response.assert_status_ok();

        let extraction = response.json::<CodeExtraction>();
        assert_eq!(extraction.analysis.raw_response.as_deref(), Some("not json"));
        assert!(extraction.analysis.icd_codes.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() -> anyhow::Result<()> {
        let service = CodingService::new(
            Arc::new(MockCompletionProvider::failing("model overloaded")),
            Arc::new(MockCodeLookup::default()),
        );
        let server = server_with(service).await?;

        let request = AnalyzeText {
            text: Some("Chest pain".to_owned()),
        };
        let response = server.post("/analyze-openai").json(&request).await;
        response.assert_status_internal_server_error();

        let error = response.json::<Value>()["error"].as_str().unwrap_or_default().to_owned();
        assert!(error.starts_with("OpenAI analysis failed"));

        Ok(())
    }
}
