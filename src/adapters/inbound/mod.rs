pub mod channel_transport;
pub mod websocket_transport;

pub use channel_transport::*;
pub use websocket_transport::*;
