//! Line-oriented interpreter for the drafting command language.
//!
//! ```text
//! JUNCTION <x_mm> <y_mm>
//! WIRE <x1_mm> <y1_mm> <x2_mm> <y2_mm>
//! LABEL <x_mm> <y_mm> ["text"]
//! TEXT <x_mm> <y_mm> ["text"]
//! # comment
//! ```
//!
//! LLM replies are free text, so parsing is best-effort per line: blank lines
//! and comments are skipped, unknown keywords are ignored, and a line with bad
//! numbers or no text contributes nothing. One bad line never stops the rest.

use std::fmt;
use std::str::SplitWhitespace;

use serde::{Deserialize, Serialize};

use crate::model::VecI;

/// A point in millimetres, as written in the command text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointMm {
    pub x: f64,
    pub y: f64,
}

impl PointMm {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert to schematic internal units.
    pub fn to_iu(self) -> VecI {
        VecI::from_mm(self.x, self.y)
    }
}

/// One drafting instruction recovered from text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum DraftingCommand {
    AddJunction { position: PointMm },
    AddWire { start: PointMm, end: PointMm },
    AddLabel { position: PointMm, text: String },
    AddText { position: PointMm, text: String },
}

impl DraftingCommand {
    /// Undo-history description used when the command is committed on its own.
    pub fn description(&self) -> &'static str {
        match self {
            DraftingCommand::AddJunction { .. } => "Added junction",
            DraftingCommand::AddWire { .. } => "Added wire",
            DraftingCommand::AddLabel { .. } => "Added label",
            DraftingCommand::AddText { .. } => "Added text",
        }
    }
}

/// Renders the command back into the command language.
impl fmt::Display for DraftingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftingCommand::AddJunction { position } => {
                write!(f, "JUNCTION {} {}", position.x, position.y)
            }
            DraftingCommand::AddWire { start, end } => {
                write!(f, "WIRE {} {} {} {}", start.x, start.y, end.x, end.y)
            }
            DraftingCommand::AddLabel { position, text } => {
                write!(f, "LABEL {} {} ", position.x, position.y)?;
                write_text(f, text)
            }
            DraftingCommand::AddText { position, text } => {
                write!(f, "TEXT {} {} ", position.x, position.y)?;
                write_text(f, text)
            }
        }
    }
}

/// The language has no escapes, so text that itself holds a quote is written
/// bare and read back through the positional rule.
fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.contains('"') {
        f.write_str(text)
    } else {
        write!(f, "\"{text}\"")
    }
}

/// Why a non-blank, non-comment line produced no command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    UnknownKeyword,
    MalformedNumber,
    EmptyText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the input.
    pub line_number: usize,
    pub reason: SkipReason,
}

/// Result of interpreting a block of text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Interpretation {
    /// Commands in source line order.
    pub commands: Vec<DraftingCommand>,
    pub skipped: Vec<SkippedLine>,
}

impl Interpretation {
    /// True when nothing in the text was understood.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Junction,
    Wire,
    Label,
    Text,
}

impl Keyword {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("JUNCTION") {
            Some(Keyword::Junction)
        } else if token.eq_ignore_ascii_case("WIRE") {
            Some(Keyword::Wire)
        } else if token.eq_ignore_ascii_case("LABEL") {
            Some(Keyword::Label)
        } else if token.eq_ignore_ascii_case("TEXT") {
            Some(Keyword::Text)
        } else {
            None
        }
    }
}

/// Interpret a whole reply, line by line.
pub fn interpret(text: &str) -> Interpretation {
    let mut out = Interpretation::default();

    for (idx, raw) in text.split('\n').enumerate() {
        match parse_line(raw) {
            LineResult::Command(cmd) => out.commands.push(cmd),
            LineResult::Ignored => {}
            LineResult::Skipped(reason) => out.skipped.push(SkippedLine {
                line_number: idx + 1,
                reason,
            }),
        }
    }

    log::debug!(
        "interpreted {} command(s), skipped {} line(s)",
        out.commands.len(),
        out.skipped.len()
    );
    out
}

/// Convenience wrapper returning only the commands.
pub fn parse_commands(text: &str) -> Vec<DraftingCommand> {
    interpret(text).commands
}

#[derive(Debug, PartialEq)]
enum LineResult {
    Command(DraftingCommand),
    /// Blank line or comment.
    Ignored,
    Skipped(SkipReason),
}

fn parse_line(raw: &str) -> LineResult {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return LineResult::Ignored;
    }

    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next().and_then(Keyword::parse) else {
        return LineResult::Skipped(SkipReason::UnknownKeyword);
    };

    let parsed = match keyword {
        Keyword::Junction => scan_numbers::<2>(&mut tokens).map(|[x, y]| {
            DraftingCommand::AddJunction {
                position: PointMm::new(x, y),
            }
        }),
        Keyword::Wire => scan_numbers::<4>(&mut tokens).map(|[x1, y1, x2, y2]| {
            DraftingCommand::AddWire {
                start: PointMm::new(x1, y1),
                end: PointMm::new(x2, y2),
            }
        }),
        Keyword::Label | Keyword::Text => {
            let Some([x, y]) = scan_numbers::<2>(&mut tokens) else {
                return LineResult::Skipped(SkipReason::MalformedNumber);
            };
            let text = extract_text(line);
            if text.is_empty() {
                return LineResult::Skipped(SkipReason::EmptyText);
            }
            let position = PointMm::new(x, y);
            let text = text.to_string();
            Some(if keyword == Keyword::Label {
                DraftingCommand::AddLabel { position, text }
            } else {
                DraftingCommand::AddText { position, text }
            })
        }
    };

    parsed.map_or(
        LineResult::Skipped(SkipReason::MalformedNumber),
        LineResult::Command,
    )
}

/// Read the next `N` tokens as finite floats. Any extra tokens are left alone.
fn scan_numbers<const N: usize>(tokens: &mut SplitWhitespace<'_>) -> Option<[f64; N]> {
    let mut values = [0.0; N];
    for slot in &mut values {
        let value: f64 = tokens.next()?.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    Some(values)
}

/// Payload text for LABEL/TEXT lines.
///
/// Takes what sits between the first two double quotes when a pair exists.
/// Otherwise it is everything after the third single space, so unquoted text
/// preceded by extra spaces keeps them.
fn extract_text(line: &str) -> &str {
    if let Some(open) = line.find('"') {
        let after = line.get(open + 1..).unwrap_or("");
        if let Some(close) = after.find('"') {
            return after.get(..close).unwrap_or("");
        }
    }
    line.splitn(4, ' ').nth(3).unwrap_or("")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comments_and_blank_lines_produce_nothing() {
        let result = interpret("# plan\n\n   # still a comment\n\t\n");
        assert!(result.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn junction_happy_path() {
        let cmds = parse_commands("JUNCTION 100 50");
        assert_eq!(
            cmds,
            vec![DraftingCommand::AddJunction {
                position: PointMm::new(100.0, 50.0)
            }]
        );
        assert_eq!(
            PointMm::new(100.0, 50.0).to_iu(),
            VecI::new(1_000_000, 500_000)
        );
    }

    #[test]
    fn wire_happy_path() {
        assert_eq!(
            parse_commands("WIRE 10 10 20 20"),
            vec![DraftingCommand::AddWire {
                start: PointMm::new(10.0, 10.0),
                end: PointMm::new(20.0, 20.0),
            }]
        );
    }

    #[test]
    fn quoted_and_unquoted_label_text() {
        assert_eq!(
            parse_commands("LABEL 5 5 \"VCC\""),
            vec![DraftingCommand::AddLabel {
                position: PointMm::new(5.0, 5.0),
                text: "VCC".into(),
            }]
        );
        assert_eq!(
            parse_commands("LABEL 5 5 VCC"),
            vec![DraftingCommand::AddLabel {
                position: PointMm::new(5.0, 5.0),
                text: "VCC".into(),
            }]
        );
    }

    #[test]
    fn quoted_text_may_contain_spaces_and_trailing_prose() {
        assert_eq!(
            parse_commands("TEXT 1.5 -2 \"power rail\" (top left)"),
            vec![DraftingCommand::AddText {
                position: PointMm::new(1.5, -2.0),
                text: "power rail".into(),
            }]
        );
    }

    #[test]
    fn unquoted_fallback_keeps_everything_after_third_space() {
        assert_eq!(
            parse_commands("TEXT 0 0 hello world"),
            vec![DraftingCommand::AddText {
                position: PointMm::new(0.0, 0.0),
                text: "hello world".into(),
            }]
        );
        // Extra spaces before the payload are carried into the text.
        assert_eq!(
            parse_commands("LABEL 0 0  GND"),
            vec![DraftingCommand::AddLabel {
                position: PointMm::new(0.0, 0.0),
                text: " GND".into(),
            }]
        );
    }

    #[test]
    fn empty_text_emits_nothing() {
        let result = interpret("LABEL 1 2 \"\"\nTEXT 3 4");
        assert!(result.is_empty());
        assert_eq!(
            result.skipped,
            vec![
                SkippedLine { line_number: 1, reason: SkipReason::EmptyText },
                SkippedLine { line_number: 2, reason: SkipReason::EmptyText },
            ]
        );
    }

    #[test]
    fn malformed_numbers_skip_only_that_line() {
        let result = interpret("JUNCTION abc 50\nWIRE 1 1 2 2");
        assert_eq!(result.commands.len(), 1);
        assert!(matches!(result.commands[0], DraftingCommand::AddWire { .. }));
        assert!(!result.is_empty());
        assert_eq!(
            result.skipped,
            vec![SkippedLine { line_number: 1, reason: SkipReason::MalformedNumber }]
        );
    }

    #[test]
    fn too_few_numbers_and_non_finite_values_are_malformed() {
        assert!(parse_commands("WIRE 1 2 3").is_empty());
        assert!(parse_commands("JUNCTION 5").is_empty());
        assert!(parse_commands("JUNCTION nan 1").is_empty());
        assert!(parse_commands("JUNCTION inf 1").is_empty());
    }

    #[test]
    fn keywords_are_case_insensitive_and_whitespace_trimmed() {
        let cmds = parse_commands("  junction 1 2  \r\nWire 0 0 1 1\nlabel 0 0 \"A\"");
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].description(), "Added junction");
        assert_eq!(cmds[1].description(), "Added wire");
        assert_eq!(cmds[2].description(), "Added label");
    }

    #[test]
    fn surrounding_prose_is_ignored_and_order_preserved() {
        let reply = "Sure! Here are the commands:\n\
                     WIRE 0 0 10 0\n\
                     JUNCTION 10 0\n\
                     LABEL 10 0 \"OUT\"\n\
                     Let me know if you need anything else.";
        let result = interpret(reply);
        let rendered: Vec<String> = result.commands.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["WIRE 0 0 10 0", "JUNCTION 10 0", "LABEL 10 0 \"OUT\""]
        );
        assert_eq!(result.skipped.len(), 2);
        assert!(result
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::UnknownKeyword));
    }

    #[test]
    fn keyword_must_be_a_whole_token() {
        assert!(parse_commands("JUNCTIONS 1 2").is_empty());
        assert!(parse_commands("TEXTBOX 1 2 \"x\"").is_empty());
    }

    #[test]
    fn extra_numeric_tokens_after_wire_are_ignored() {
        assert_eq!(parse_commands("WIRE 0 0 1 1 99").len(), 1);
    }

    #[test]
    fn lone_quote_falls_back_to_positional_text() {
        assert_eq!(
            parse_commands("LABEL 5 5 \"VCC"),
            vec![DraftingCommand::AddLabel {
                position: PointMm::new(5.0, 5.0),
                text: "\"VCC".into(),
            }]
        );
    }

    #[test]
    fn rendered_commands_parse_back_to_themselves() {
        let reply = "LABEL 0 0 say\"hi\nTEXT 1 2 \"two words\"\nLABEL 0 0  GND\nWIRE 0.5 0 1 -1";
        let commands = parse_commands(reply);
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0].to_string(), "LABEL 0 0 say\"hi");

        let rendered: Vec<String> = commands.iter().map(ToString::to_string).collect();
        assert_eq!(parse_commands(&rendered.join("\n")), commands);
    }
}
