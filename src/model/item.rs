use serde::{Deserialize, Serialize};

use super::units::VecI;

/// Stable identifier of an item within one schematic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Drawing layer an item lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Layer {
    #[default]
    Wire,
    Bus,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LineStyle {
    /// Use the style configured for the item's layer.
    #[default]
    Default,
    Solid,
    Dash,
    Dot,
}

/// Line stroke. A width of 0 means "use the layer default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Stroke {
    pub width: i32,
    pub style: LineStyle,
}

/// A primitive placed on a schematic sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SchItem {
    Junction {
        position: VecI,
    },
    Wire {
        start: VecI,
        end: VecI,
        layer: Layer,
        stroke: Stroke,
    },
    Label {
        position: VecI,
        text: String,
    },
    Text {
        position: VecI,
        text: String,
    },
}

impl SchItem {
    pub fn junction(position: VecI) -> Self {
        SchItem::Junction { position }
    }

    /// A wire on the wire layer with the default stroke.
    pub fn wire(start: VecI, end: VecI) -> Self {
        SchItem::Wire {
            start,
            end,
            layer: Layer::Wire,
            stroke: Stroke::default(),
        }
    }

    pub fn label(position: VecI, text: impl Into<String>) -> Self {
        SchItem::Label {
            position,
            text: text.into(),
        }
    }

    pub fn text(position: VecI, text: impl Into<String>) -> Self {
        SchItem::Text {
            position,
            text: text.into(),
        }
    }

    /// Short type name used in summaries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchItem::Junction { .. } => "junction",
            SchItem::Wire { .. } => "wire",
            SchItem::Label { .. } => "label",
            SchItem::Text { .. } => "text",
        }
    }

    /// Anchor position (start point for wires).
    pub fn position(&self) -> VecI {
        match self {
            SchItem::Junction { position }
            | SchItem::Label { position, .. }
            | SchItem::Text { position, .. } => *position,
            SchItem::Wire { start, .. } => *start,
        }
    }
}

/// An item together with the id it was given when it was added to a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub item: SchItem,
}
