#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for chat-completions client operations.
pub const TRACING_TARGET_CLIENT: &str = "scanline_openai::client";

/// Tracing target for ICD-10 analysis.
pub const TRACING_TARGET_CODING: &str = "scanline_openai::coding";

/// Tracing target for Clinical Tables lookups.
pub const TRACING_TARGET_LOOKUP: &str = "scanline_openai::lookup";

mod error;

pub mod client;
pub mod coding;
pub mod lookup;

pub use client::{
    ChatMessage, ChatRequest, ChatResponse, CompletionProvider, LlmClient, LlmConfig,
    LlmConfigBuilder,
};
pub use coding::{CodeAnalysis, CodingService, DiagnosisCode};
pub use error::{Error, Result};
pub use lookup::{ClinicalTablesClient, ClinicalTablesConfig, CodeLookup};
