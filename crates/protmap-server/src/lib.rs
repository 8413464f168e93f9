//! protmap-server: session protocol and HTTP surface for protmap.
//!
//! The [`session`] module is transport-agnostic: it speaks
//! [`protocol`] messages over anything implementing [`session::Transport`].
//! [`ws`] adapts axum WebSockets to that trait and [`routes`] wires the
//! remaining thin HTTP endpoints.

pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod structure;
pub mod ws;

pub use protocol::{ClientMessage, ServerMessage};
pub use routes::router;
pub use session::{Disconnected, SessionContext, SessionSummary, StreamSession, Transport};
pub use state::AppState;
