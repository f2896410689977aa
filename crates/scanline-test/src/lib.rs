#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod fixtures;
mod mock;

pub use mock::{
    MockCodeLookup, MockCompletionProvider, MockOcrConfig, MockOcrFactory, MockOcrProvider,
    create_mock_coding_service,
};
