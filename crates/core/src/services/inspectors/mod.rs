#[cfg(feature = "goblin-inspector")]
pub mod goblin;
pub mod readelf;

#[cfg(feature = "goblin-inspector")]
pub use self::goblin::GoblinInspector;
pub use readelf::ReadElfInspector;
