pub mod block_world;
pub mod file_logger;
pub mod loggers;
pub mod logging_consumer;
pub mod multi_consumer;

pub use block_world::*;
pub use file_logger::*;
pub use loggers::*;
pub use logging_consumer::*;
pub use multi_consumer::*;
