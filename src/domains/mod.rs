pub mod logger;
pub mod world_sync;

pub use logger::*;
pub use world_sync::*;
