pub mod config;
pub mod connector;
pub mod encoder;
pub mod errors;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod scan;
pub mod subscriptions;
pub mod supervisor;
pub mod ws;

pub use config::*;
pub use connector::*;
pub use encoder::{EncodedPayload, OutputFormat};
pub use errors::GatewayError;
pub use metrics::*;
pub use pipeline::*;
pub use supervisor::*;
pub use ws::{SessionEnd, WsSession};
