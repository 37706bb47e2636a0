/// The command forms the model is told about, one per line.
const COMMAND_FORMS: &[&str] = &[
    "- JUNCTION x y (add junction at position x, y in millimeters)",
    "- WIRE x1 y1 x2 y2 (add wire from x1,y1 to x2,y2 in millimeters)",
    "- LABEL x y \"text\" (add label at x,y with text)",
    "- TEXT x y \"text\" (add text at x,y)",
];

/// Wrap a user request in the fixed instruction template that asks the model
/// to answer in the drafting command language.
pub fn build_prompt(user_request: &str) -> String {
    let mut prompt = String::from(
        "You are an AI assistant helping to create electronic schematics. \
         When the user requests schematic operations, respond with simple commands in this format:\n",
    );
    for form in COMMAND_FORMS {
        prompt.push_str(form);
        prompt.push('\n');
    }
    prompt.push_str("\nUser request: ");
    prompt.push_str(user_request);
    prompt.push_str("\n\nRespond with only the commands, one per line.");
    prompt
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::interpreter::interpret;

    #[test]
    fn request_is_embedded_between_instructions_and_closing_line() {
        let prompt = build_prompt("Add a junction at 100mm, 50mm");
        let request_at = prompt.find("User request: Add a junction at 100mm, 50mm").unwrap();
        assert!(prompt[..request_at].contains("- WIRE x1 y1 x2 y2"));
        assert!(prompt.ends_with("\n\nRespond with only the commands, one per line."));
    }

    #[test]
    fn template_itself_parses_to_nothing() {
        // Instruction lines start with "- ", so echoing the prompt back must
        // not place anything.
        assert!(interpret(&build_prompt("")).commands.is_empty());
    }
}
