// Application layer: wires adapters and config into the core at startup.

pub mod bootstrap;

pub use bootstrap::{load_pipeline, StartupReport};
