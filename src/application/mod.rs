pub mod connection_controller;

pub use connection_controller::*;
