pub mod item;
pub mod schematic;
pub mod units;

// Re-export commonly used types at the model level.
pub use item::{ItemId, Layer, LineStyle, PlacedItem, SchItem, Stroke};
pub use schematic::{Schematic, Sheet};
pub use units::{iu_to_mm, mm_to_iu, VecI, IU_PER_MM};
