//! Mock completion and code lookup providers for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scanline_openai::client::ChatMessage;
use scanline_openai::{CodeLookup, CompletionProvider, Error, Result};

/// Completion provider returning a canned reply.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionProvider {
    reply: String,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Vec<ChatMessage>>>,
}

impl MockCompletionProvider {
    /// Creates a provider that always answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Default::default()
        }
    }

    /// Creates a provider that fails every request with an API error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of the most recent completion request.
    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.last_request
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = messages;
        }

        match &self.failure {
            Some(message) => Err(Error::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(self.reply.clone()),
        }
    }
}

/// In-memory ICD-10 description table.
#[derive(Debug, Clone, Default)]
pub struct MockCodeLookup {
    table: HashMap<String, String>,
}

impl MockCodeLookup {
    /// Adds a description for `code`.
    pub fn with_entry(mut self, code: impl Into<String>, description: impl Into<String>) -> Self {
        self.table.insert(code.into(), description.into());
        self
    }
}

#[async_trait::async_trait]
impl CodeLookup for MockCodeLookup {
    async fn describe(&self, code: &str) -> Option<String> {
        self.table.get(code.trim()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use scanline_openai::CodingService;

    use super::*;

    #[tokio::test]
    async fn coding_service_uses_lookup_for_missing_descriptions() {
        let completion = MockCompletionProvider::new(
            r#"{"icd_codes": [{"code": "E11.9", "description": ""}], "summary": "diabetes"}"#,
        );
        let lookup =
            MockCodeLookup::default().with_entry("E11.9", "Type 2 diabetes mellitus without complications");
        let service = CodingService::new(Arc::new(completion.clone()), Arc::new(lookup));

        let analysis = service.analyze("Patient with type 2 diabetes").await.unwrap();
        assert_eq!(analysis.total_codes, 1);
        assert_eq!(
            analysis.icd_codes[0].description,
            "Type 2 diabetes mellitus without complications"
        );
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn failing_completion_surfaces_error() {
        let provider = MockCompletionProvider::failing("model overloaded");
        let error = provider.complete(Vec::new()).await.unwrap_err();
        assert!(error.to_string().contains("model overloaded"));
    }
}
