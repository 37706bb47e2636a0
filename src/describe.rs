use crate::history::UndoState;
use crate::model::{iu_to_mm, Layer, SchItem, Schematic, Sheet, VecI};

fn mm(p: VecI) -> String {
    format!("({:.2}, {:.2}) mm", iu_to_mm(p.x), iu_to_mm(p.y))
}

/// One line per item, positions in millimetres.
pub fn describe_item(item: &SchItem) -> String {
    match item {
        SchItem::Junction { position } => format!("junction at {}", mm(*position)),
        SchItem::Wire {
            start, end, layer, ..
        } => {
            let kind = match layer {
                Layer::Wire => "wire",
                Layer::Bus => "bus",
                Layer::Notes => "graphic line",
            };
            format!("{kind} {} -> {}", mm(*start), mm(*end))
        }
        SchItem::Label { position, text } => format!("label \"{text}\" at {}", mm(*position)),
        SchItem::Text { position, text } => format!("text \"{text}\" at {}", mm(*position)),
    }
}

/// Human-readable summary of one sheet: counts per kind, then every item.
pub fn describe_sheet(sheet: &Sheet) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Sheet: {} ({} items: {} junctions, {} wires, {} labels, {} texts)",
        sheet.name,
        sheet.items.len(),
        sheet.count_kind("junction"),
        sheet.count_kind("wire"),
        sheet.count_kind("label"),
        sheet.count_kind("text"),
    ));
    for placed in &sheet.items {
        lines.push(format!("  [{}] {}", placed.id.0, describe_item(&placed.item)));
    }
    lines.join("\n")
}

/// Human-readable summary of the entire schematic.
pub fn describe_schematic(schematic: &Schematic) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Schematic: {}",
        if schematic.name.is_empty() {
            "(untitled)"
        } else {
            &schematic.name
        }
    ));
    lines.push(format!(
        "{} sheet(s), {} item(s)",
        schematic.sheets.len(),
        schematic.item_count()
    ));
    for sheet in &schematic.sheets {
        lines.push(String::new());
        lines.push(describe_sheet(sheet));
    }
    lines.join("\n")
}

pub fn describe_undo_state(state: &UndoState) -> String {
    match (&state.undo_description, &state.redo_description) {
        (None, None) => "Nothing to undo or redo".to_string(),
        (undo, redo) => {
            let mut parts = Vec::new();
            if let Some(u) = undo {
                parts.push(format!("undo: {u}"));
            }
            if let Some(r) = redo {
                parts.push(format!("redo: {r}"));
            }
            parts.join(", ")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn items_are_described_in_millimetres() {
        let wire = SchItem::wire(VecI::from_mm(10.0, 10.0), VecI::from_mm(20.0, 20.0));
        assert_eq!(
            describe_item(&wire),
            "wire (10.00, 10.00) mm -> (20.00, 20.00) mm"
        );
        let label = SchItem::label(VecI::from_mm(5.0, 5.0), "VCC");
        assert_eq!(describe_item(&label), "label \"VCC\" at (5.00, 5.00) mm");
    }

    #[test]
    fn schematic_summary_lists_sheets_and_counts() {
        let mut sch = Schematic::new("psu");
        sch.insert(0, SchItem::junction(VecI::from_mm(1.0, 2.0)));
        sch.insert(0, SchItem::text(VecI::from_mm(0.0, 0.0), "note"));
        let text = describe_schematic(&sch);
        assert!(text.starts_with("Schematic: psu\n1 sheet(s), 2 item(s)"));
        assert!(text.contains("Sheet: Root (2 items: 1 junctions, 0 wires, 0 labels, 1 texts)"));
        assert!(text.contains("junction at (1.00, 2.00) mm"));
    }

    #[test]
    fn undo_state_summary() {
        let state = UndoState {
            can_undo: true,
            can_redo: false,
            undo_description: Some("Added wire".into()),
            redo_description: None,
        };
        assert_eq!(describe_undo_state(&state), "undo: Added wire");
    }
}
