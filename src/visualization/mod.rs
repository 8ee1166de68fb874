pub mod chart;
pub mod map;
pub mod maps;

pub use map::LeafletMap;
pub use maps::MapView;
