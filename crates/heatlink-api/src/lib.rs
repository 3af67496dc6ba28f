// heatlink-api: Async Rust client for the local device control API.
//
// The device speaks JSON over HTTP(S), one resource path per operation,
// with a mandatory `status` envelope field in every response body.
// `heatlink-core` drives this client from its polling engine.

pub mod client;
pub mod error;
pub mod proto;
pub mod transport;

pub use client::LocalClient;
pub use error::Error;
pub use transport::TransportConfig;
