//! Outbound HTTP: the shared client, replayable requests and the
//! authenticated request gateway

pub mod client;
pub mod gateway;
pub mod replay;

pub use client::{HttpClient, HttpClientBuilder};
pub use gateway::{AuthenticatedRequestGateway, GatewayError};
pub use replay::ReplayableRequest;
