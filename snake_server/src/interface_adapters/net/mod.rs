// Network adapter modules split by player sockets vs HTTP inspection routes.

pub mod client;
pub mod internal;

pub use client::ws_handler;
pub use internal::room_status_handler;
