use scanline_openai::CodingService;

/// Optional ICD-10 analysis service.
///
/// Empty when no OpenAI API key is configured.
#[derive(Debug, Clone, Default)]
pub struct CodingHandle(Option<CodingService>);

impl CodingHandle {
    /// Wraps an optional coding service.
    pub fn new(service: Option<CodingService>) -> Self {
        Self(service)
    }

    /// Returns the service, if configured.
    pub fn get(&self) -> Option<&CodingService> {
        self.0.as_ref()
    }

    /// Returns whether analysis is available.
    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

impl From<CodingService> for CodingHandle {
    fn from(service: CodingService) -> Self {
        Self(Some(service))
    }
}
