use serde::{Deserialize, Serialize};

use super::item::{ItemId, PlacedItem, SchItem};

/// Schematic file format version.
pub const SCHEMATIC_VERSION: u32 = 1;

/// One drawing sheet. The sheet the editor currently shows is the surface
/// drafting commands write into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub items: Vec<PlacedItem>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&SchItem> {
        self.items.iter().find(|p| p.id == id).map(|p| &p.item)
    }

    /// Number of items of the given kind (see [`SchItem::kind_name`]).
    pub fn count_kind(&self, kind: &str) -> usize {
        self.items
            .iter()
            .filter(|p| p.item.kind_name() == kind)
            .count()
    }
}

/// A schematic document: an ordered set of sheets plus the id allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub sheets: Vec<Sheet>,
    #[serde(default)]
    next_item_id: u64,
}

fn default_version() -> u32 {
    SCHEMATIC_VERSION
}

impl Schematic {
    /// A new schematic with a single root sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SCHEMATIC_VERSION,
            name: name.into(),
            sheets: vec![Sheet::new("Root")],
            next_item_id: 1,
        }
    }

    /// Append an item to a sheet and return the id it was assigned.
    /// Returns `None` when the sheet does not exist or no id is left.
    pub fn insert(&mut self, sheet_index: usize, item: SchItem) -> Option<ItemId> {
        self.sheets.get(sheet_index)?;
        let id = self.allocate_id()?;
        let sheet = self.sheets.get_mut(sheet_index)?;
        sheet.items.push(PlacedItem { id, item });
        Some(id)
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn item_count(&self) -> usize {
        self.sheets.iter().map(|s| s.items.len()).sum()
    }

    /// The id the next inserted item would get, or `None` when the id space
    /// above the largest existing id is exhausted.
    pub fn next_free_id(&self) -> Option<ItemId> {
        // Files written by hand may omit the counter; never reuse an existing id.
        let max_existing = self
            .sheets
            .iter()
            .flat_map(|s| s.items.iter().map(|p| p.id.0))
            .max()
            .unwrap_or(0);
        let id = self.next_item_id.max(max_existing.checked_add(1)?).max(1);
        Some(ItemId(id))
    }

    fn allocate_id(&mut self) -> Option<ItemId> {
        let id = self.next_free_id()?;
        self.next_item_id = id.0.saturating_add(1);
        Some(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::units::VecI;

    #[test]
    fn insert_appends_in_order_with_fresh_ids() {
        let mut sch = Schematic::new("demo");
        let a = sch.insert(0, SchItem::junction(VecI::new(0, 0))).unwrap();
        let b = sch.insert(0, SchItem::label(VecI::new(1, 1), "VCC")).unwrap();
        assert_ne!(a, b);
        let sheet = sch.sheet(0).unwrap();
        assert_eq!(sheet.items[0].id, a);
        assert_eq!(sheet.items[1].id, b);
        assert_eq!(sheet.count_kind("label"), 1);
    }

    #[test]
    fn insert_into_missing_sheet_fails() {
        let mut sch = Schematic::new("demo");
        assert!(sch.insert(3, SchItem::junction(VecI::default())).is_none());
        assert_eq!(sch.item_count(), 0);
    }

    #[test]
    fn ids_skip_past_items_loaded_without_counter() {
        let json = serde_json::json!({
            "name": "hand written",
            "sheets": [{
                "name": "Root",
                "items": [{ "id": 7, "type": "Junction", "position": { "x": 0, "y": 0 } }]
            }]
        });
        let mut sch: Schematic = serde_json::from_value(json).unwrap();
        let id = sch.insert(0, SchItem::junction(VecI::new(5, 5))).unwrap();
        assert_eq!(id, ItemId(8));
        assert_eq!(sch.version, SCHEMATIC_VERSION);
    }

    #[test]
    fn exhausted_id_space_refuses_inserts() {
        let json = serde_json::json!({
            "name": "maxed",
            "sheets": [{
                "name": "Root",
                "items": [{ "id": u64::MAX, "type": "Junction", "position": { "x": 0, "y": 0 } }]
            }]
        });
        let mut sch: Schematic = serde_json::from_value(json).unwrap();
        assert_eq!(sch.next_free_id(), None);
        assert!(sch.insert(0, SchItem::junction(VecI::new(1, 1))).is_none());
        assert_eq!(sch.item_count(), 1);
    }

    #[test]
    fn last_id_can_be_used_once() {
        let json = serde_json::json!({
            "name": "almost",
            "sheets": [{
                "name": "Root",
                "items": [{ "id": u64::MAX - 1, "type": "Junction", "position": { "x": 0, "y": 0 } }]
            }]
        });
        let mut sch: Schematic = serde_json::from_value(json).unwrap();
        assert_eq!(sch.insert(0, SchItem::junction(VecI::new(1, 1))), Some(ItemId(u64::MAX)));
        assert!(sch.insert(0, SchItem::junction(VecI::new(2, 2))).is_none());
    }
}
