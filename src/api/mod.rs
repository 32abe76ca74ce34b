//! HTTP and WebSocket surface
//!
//! Thin pass-through to the store, plus the `/ws` transport that registers a
//! hub subscriber per connection.

pub mod handlers;
pub mod routes;
pub mod state;
pub mod types;
pub mod websocket;

pub use routes::create_router;
pub use state::AppState;
