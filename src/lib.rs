//! Round-robin HTTP load balancer library.

pub mod config;
pub mod http;
pub mod health;
pub mod load_balancer;
pub mod lifecycle;
pub mod observability;
pub mod admin;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{Backend, DispatchError, Dispatcher};
