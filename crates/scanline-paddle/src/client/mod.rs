//! PaddleX client, configuration and wire types.

mod pd_client;
mod pd_config;
mod pd_types;

pub use pd_client::PdClient;
pub use pd_config::PdConfig;
pub use pd_types::{InferRequest, InferResponse, InferResult, PageResult};
