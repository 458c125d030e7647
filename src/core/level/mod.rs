pub mod catalog;
pub mod layout;
pub mod loader;

pub use catalog::EntityCatalog;
pub use layout::{ActiveLevel, LevelFile, TableBounds};
pub use loader::LevelLoaderPlugin;
