mod auth;
mod connection;
mod events;
mod responder;
mod state;

pub use connection::{Connection, ConnectionOptions};
pub use events::StatusEvent;
pub use responder::{Responder, ResponderMap};
pub use state::ConnectionState;
