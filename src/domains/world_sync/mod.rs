pub mod connection;
pub mod decoder;
pub mod envelope;
pub mod messages;
pub mod payload;
pub mod ports;

pub use connection::*;
pub use decoder::{decode, encode};
pub use envelope::*;
pub use messages::*;
pub use payload::*;
pub use ports::*;
