//! # Component Graph Module
//!
//! This module wraps the mapping document produced by the mapping service: a
//! directed graph of loosely-typed component nodes. The gateway never builds
//! or mutates these graphs; it only walks them to project views, so every
//! accessor tolerates missing or mistyped attributes by degrading to an
//! empty default instead of failing.

use serde_json::{Map, Value};

/// Attribute key carrying a node's type tag.
pub const COMPONENT_TAG: &str = "_component";

/// Attribute key carrying a change record's action tag.
pub const ACTION_TAG: &str = "_action";

/// Read-only view over a mapping document.
#[derive(Debug, Clone)]
pub struct ComponentGraph {
    mapping: Value,
}

impl ComponentGraph {
    /// Wraps a raw mapping document. Any JSON value is accepted; a document
    /// without a `components` array simply yields no nodes.
    pub fn new(mapping: Value) -> Self {
        ComponentGraph { mapping }
    }

    /// Returns every component node whose `_component` tag equals `tag`, in
    /// graph iteration order. Order is whatever the document yields; it is
    /// not guaranteed stable across mappings.
    pub fn nodes_of(&self, tag: &str) -> Vec<Component<'_>> {
        self.array("components")
            .iter()
            .filter_map(|v| Component::from_value(v))
            .filter(|c| c.string(COMPONENT_TAG) == tag)
            .collect()
    }

    /// Returns the graph's change records, if any.
    pub fn changes(&self) -> Vec<Component<'_>> {
        self.array("changes")
            .iter()
            .filter_map(|v| Component::from_value(v))
            .collect()
    }

    /// The raw mapping document.
    pub fn raw(&self) -> &Value {
        &self.mapping
    }

    fn array(&self, key: &str) -> &[Value] {
        self.mapping
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One loosely-typed graph node: a type tag plus an open attribute mapping.
#[derive(Debug, Clone, Copy)]
pub struct Component<'a> {
    attrs: &'a Map<String, Value>,
}

impl<'a> Component<'a> {
    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: &'a Value) -> Option<Component<'a>> {
        value.as_object().map(|attrs| Component { attrs })
    }

    /// String attribute, or "" when the key is absent or not a string.
    pub fn string(&self, key: &str) -> String {
        self.attrs
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }

    /// Array attribute, or an empty slice when the key is absent or not an
    /// array.
    pub fn entries(&self, key: &str) -> &'a [Value] {
        self.attrs
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Array attribute narrowed to its string elements; non-string elements
    /// are skipped.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.entries(key)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}
