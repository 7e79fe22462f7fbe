//! Human-readable rendering of a diff graph's change records.

use gantry_models::models::graph::{ComponentGraph, ACTION_TAG, COMPONENT_TAG};
use gantry_utils::logging::prelude::*;

/// Renders one line per change record, of the form
/// `"<Verb> a <component type> named <name>"`, with underscores in the
/// component type replaced by spaces.
///
/// Change records carrying an unrecognized action tag are skipped with a
/// warning rather than failing the whole rendering.
pub fn render_changes(graph: &ComponentGraph) -> Vec<String> {
    let mut lines = Vec::new();

    for change in graph.changes() {
        let action = change.string(ACTION_TAG);
        let verb = match action.as_str() {
            "create" => "Create",
            "update" => "Update",
            "delete" => "Delete",
            other => {
                warn!("Skipping change with unrecognized action tag {:?}", other);
                continue;
            }
        };

        let component = change.string(COMPONENT_TAG).replace('_', " ");
        let name = change.string("name");

        lines.push(format!("{} a {} named {}", verb, component, name));
    }

    lines
}
