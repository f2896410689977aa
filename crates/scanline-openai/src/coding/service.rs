//! ICD-10 analysis pipeline: prompt, complete, parse, enrich.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;

use super::analysis::CodeAnalysis;
use super::prompt::{SYSTEM_PROMPT, user_prompt};
use crate::client::{ChatMessage, CompletionProvider};
use crate::lookup::CodeLookup;
use crate::{Result, TRACING_TARGET_CODING};

/// Extracts ICD-10 codes from free text.
#[derive(Clone)]
pub struct CodingService {
    completion: Arc<dyn CompletionProvider>,
    lookup: Arc<dyn CodeLookup>,
}

impl CodingService {
    /// Creates a service from a completion provider and a description lookup.
    pub fn new(completion: Arc<dyn CompletionProvider>, lookup: Arc<dyn CodeLookup>) -> Self {
        Self { completion, lookup }
    }

    /// Runs the full analysis for `text`.
    pub async fn analyze(&self, text: &str) -> Result<CodeAnalysis> {
        tracing::info!(
            target: TRACING_TARGET_CODING,
            text_length = text.chars().count(),
            "Starting ICD-10 analysis"
        );

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(text)),
        ];

        let reply = self.completion.complete(messages).await?;
        let mut analysis = CodeAnalysis::from_reply(&reply);

        if analysis.raw_response.is_some() {
            tracing::warn!(
                target: TRACING_TARGET_CODING,
                reply_length = reply.len(),
                "Model reply was not valid JSON, returning it verbatim"
            );
        }

        let filled = enrich(&mut analysis, self.lookup.as_ref()).await;

        tracing::info!(
            target: TRACING_TARGET_CODING,
            codes = analysis.icd_codes.len(),
            descriptions_filled = filled,
            "ICD-10 analysis completed"
        );

        Ok(analysis)
    }
}

impl fmt::Debug for CodingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodingService").finish_non_exhaustive()
    }
}

/// Fills in missing code descriptions and returns how many were looked up.
///
/// A description given under an alias (`desc`, `title`, `name`) is promoted
/// to `description`; codes with no description at all are looked up
/// concurrently. Failed lookups leave an empty description.
pub async fn enrich(analysis: &mut CodeAnalysis, lookup: &dyn CodeLookup) -> usize {
    let mut pending = Vec::new();

    for (index, item) in analysis.icd_codes.iter_mut().enumerate() {
        item.code = item.code.trim().to_owned();

        match item.resolved_description().map(str::to_owned) {
            Some(description) => item.description = description,
            None if !item.code.is_empty() => pending.push(index),
            None => item.description.clear(),
        }
    }

    let lookups = pending.iter().map(|&index| {
        let code = analysis.icd_codes[index].code.clone();
        async move { lookup.describe(&code).await }
    });
    let descriptions = join_all(lookups).await;

    let mut filled = 0;
    for (index, description) in pending.into_iter().zip(descriptions) {
        let item = &mut analysis.icd_codes[index];
        match description {
            Some(description) => {
                item.description = description;
                filled += 1;
            }
            None => {
                tracing::debug!(
                    target: TRACING_TARGET_CODING,
                    code = %item.code,
                    "No description found for code"
                );
                item.description.clear();
            }
        }
    }

    filled
}
