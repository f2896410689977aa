//! Conversions from ICD-10 analysis errors.

use crate::handler::{Error, ErrorKind};

impl From<scanline_openai::Error> for Error<'static> {
    fn from(err: scanline_openai::Error) -> Self {
        ErrorKind::AnalysisFailed.with_message(format!("OpenAI analysis failed: {}", err))
    }
}
