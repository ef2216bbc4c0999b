#[macro_use]
extern crate lazy_static;
extern crate tracing;

pub mod cli;
pub mod logger;
pub mod server;
pub mod settings;
pub mod telemetry;
pub mod transport;
pub mod watcher;
