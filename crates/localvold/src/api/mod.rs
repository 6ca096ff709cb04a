//! HTTP side of the volume plugin protocol.

mod handlers;
pub mod server;
pub mod types;

pub use server::{AppState, app};
