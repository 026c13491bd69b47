//! JSON-RPC API Layer
//!
//! Exposes the Leadwatch application services as versioned JSON-RPC 2.0
//! methods. Params are always a single named-field object.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

mod rate_limiter;

pub use server::{RpcServer, RpcServerConfig};
