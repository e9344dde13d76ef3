pub mod app;
pub mod classify;
pub mod config;
pub mod extract;
pub mod interrupt;
pub mod registry;
pub mod render;
pub mod tile;
pub mod trim;
pub mod world;

pub use classify::{classify, Classification, TileClass};
pub use config::TrimSettings;
pub use extract::{ExtractReport, Extractor};
pub use registry::{RegistryStore, TileRegistry};
pub use tile::{TileCoord, TileRecord};
