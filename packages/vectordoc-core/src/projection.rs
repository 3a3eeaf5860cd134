//! Typed domain wrappers over the raw CRDT document: frames, rectangles, text
//! boxes, and free-form paths. Every attribute is stored as a string property on
//! the underlying node (see the module-level encoding rules below) so that
//! serialization and merge stay uniform; the views exist only to save callers
//! from re-deriving the parse/format and dispatch-on-type boilerplate.
//!
//! Numeric properties are decimal-encoded via `to_string`/`parse`. A parse
//! failure on read is treated as absent, never as zero — a half-written or
//! corrupted property should not silently present as a real value.

use crate::document::Document;
use crate::id::Id;

pub const TYPE_FRAME: &str = "frame";
pub const TYPE_RECTANGLE: &str = "rectangle";
pub const TYPE_TEXT: &str = "text";
pub const TYPE_SHAPE: &str = "shape";

const DEFAULT_FILL: &str = "#FFFFFF";

fn read_f64(doc: &Document, id: &Id, key: &str) -> Option<f64> {
    doc.get_node(id)?.get_property(key)?.parse::<f64>().ok()
}

fn write_f64(doc: &mut Document, id: &Id, key: &str, value: f64) {
    doc.set_property(id, key, value.to_string());
}

fn read_point(doc: &Document, id: &Id, key: &str) -> Option<(f64, f64)> {
    let raw = doc.get_node(id)?.get_property(key)?;
    let (x, y) = raw.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn write_point(doc: &mut Document, id: &Id, key: &str, x: f64, y: f64) {
    doc.set_property(id, key, format!("{x},{y}"));
}

/// A rectangular container that groups shapes and clips membership queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameView {
    pub id: Id,
}

impl FrameView {
    pub fn create(doc: &mut Document, x: f64, y: f64, width: f64, height: f64) -> Self {
        let id = doc.create_node(TYPE_FRAME);
        let view = Self { id };
        view.set_position(doc, x, y);
        view.set_size(doc, width, height);
        view
    }

    /// Refuses to instantiate over a node of a different type, or one that is
    /// unknown.
    pub fn from_id(doc: &Document, id: Id) -> Option<Self> {
        let node = doc.get_node(&id)?;
        (node.kind == TYPE_FRAME).then_some(Self { id })
    }

    pub fn set_position(&self, doc: &mut Document, x: f64, y: f64) {
        write_f64(doc, &self.id, "x", x);
        write_f64(doc, &self.id, "y", y);
    }

    pub fn set_size(&self, doc: &mut Document, width: f64, height: f64) {
        write_f64(doc, &self.id, "width", width);
        write_f64(doc, &self.id, "height", height);
    }

    pub fn get_x(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "x")
    }

    pub fn get_y(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "y")
    }

    pub fn get_width(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "width")
    }

    pub fn get_height(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "height")
    }

    pub fn add_shape(&self, doc: &mut Document, shape: &Id) {
        doc.add_child(&self.id, shape);
    }

    pub fn remove_shape(&self, doc: &mut Document, shape: &Id) {
        doc.remove_child(&self.id, shape);
    }

    pub fn shape_ids(&self, doc: &Document) -> Vec<Id> {
        doc.children(&self.id)
    }

    pub fn contains(&self, doc: &Document, px: f64, py: f64) -> bool {
        let x = self.get_x(doc).unwrap_or(0.0);
        let y = self.get_y(doc).unwrap_or(0.0);
        let w = self.get_width(doc).unwrap_or(0.0);
        let h = self.get_height(doc).unwrap_or(0.0);
        px >= x && px <= x + w && py >= y && py <= y + h
    }

    pub fn delete(&self, doc: &mut Document) {
        doc.delete_node(&self.id);
    }
}

/// A filled rectangle. `fill` defaults to opaque white on creation, matching the
/// behavior the embedding bindings rely on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RectangleView {
    pub id: Id,
}

impl RectangleView {
    pub fn create(doc: &mut Document, x: f64, y: f64, width: f64, height: f64) -> Self {
        let id = doc.create_node(TYPE_RECTANGLE);
        let view = Self { id };
        view.set_position(doc, x, y);
        view.set_size(doc, width, height);
        doc.set_property(&view.id, "fill", DEFAULT_FILL);
        view
    }

    pub fn from_id(doc: &Document, id: Id) -> Option<Self> {
        let node = doc.get_node(&id)?;
        (node.kind == TYPE_RECTANGLE).then_some(Self { id })
    }

    pub fn set_position(&self, doc: &mut Document, x: f64, y: f64) {
        write_f64(doc, &self.id, "x", x);
        write_f64(doc, &self.id, "y", y);
    }

    pub fn set_size(&self, doc: &mut Document, width: f64, height: f64) {
        write_f64(doc, &self.id, "width", width);
        write_f64(doc, &self.id, "height", height);
    }

    pub fn set_fill(&self, doc: &mut Document, fill: impl Into<String>) {
        doc.set_property(&self.id, "fill", fill);
    }

    pub fn get_x(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "x")
    }

    pub fn get_y(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "y")
    }

    pub fn get_width(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "width")
    }

    pub fn get_height(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "height")
    }

    pub fn get_fill<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        doc.get_node(&self.id)?.get_property("fill")
    }

    /// Rotation and scale are independent LWW properties, not composed into a
    /// single transform matrix here — how a renderer combines position,
    /// rotation, and scale is outside this layer. Absent reads as the
    /// identity transform: rotation 0, scale 1.
    pub fn set_rotation(&self, doc: &mut Document, rotation: f64) {
        write_f64(doc, &self.id, "rotation", rotation);
    }

    pub fn get_rotation(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "rotation").unwrap_or(0.0)
    }

    pub fn set_scale(&self, doc: &mut Document, scale_x: f64, scale_y: f64) {
        write_f64(doc, &self.id, "scaleX", scale_x);
        write_f64(doc, &self.id, "scaleY", scale_y);
    }

    pub fn get_scale_x(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "scaleX").unwrap_or(1.0)
    }

    pub fn get_scale_y(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "scaleY").unwrap_or(1.0)
    }

    pub fn delete(&self, doc: &mut Document) {
        doc.delete_node(&self.id);
    }
}

/// A positioned, sized text run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBoxView {
    pub id: Id,
}

impl TextBoxView {
    pub fn create(
        doc: &mut Document,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: impl Into<String>,
    ) -> Self {
        let id = doc.create_node(TYPE_TEXT);
        let view = Self { id };
        view.set_position(doc, x, y);
        view.set_size(doc, width, height);
        view.set_text(doc, text);
        view
    }

    pub fn from_id(doc: &Document, id: Id) -> Option<Self> {
        let node = doc.get_node(&id)?;
        (node.kind == TYPE_TEXT).then_some(Self { id })
    }

    pub fn set_position(&self, doc: &mut Document, x: f64, y: f64) {
        write_f64(doc, &self.id, "x", x);
        write_f64(doc, &self.id, "y", y);
    }

    pub fn set_size(&self, doc: &mut Document, width: f64, height: f64) {
        write_f64(doc, &self.id, "width", width);
        write_f64(doc, &self.id, "height", height);
    }

    pub fn set_text(&self, doc: &mut Document, text: impl Into<String>) {
        doc.set_property(&self.id, "text", text);
    }

    pub fn get_text<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        doc.get_node(&self.id)?.get_property("text")
    }

    pub fn get_x(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "x")
    }

    pub fn get_y(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "y")
    }

    pub fn get_width(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "width")
    }

    pub fn get_height(&self, doc: &Document) -> Option<f64> {
        read_f64(doc, &self.id, "height")
    }

    pub fn delete(&self, doc: &mut Document) {
        doc.delete_node(&self.id);
    }
}

/// A free-form point path (polyline or closed polygon), one property per
/// indexed point. Supplements the rectangle/text box pair the distilled
/// surface names with the generic vector shape the original editor supports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathView {
    pub id: Id,
}

impl PathView {
    pub fn create(doc: &mut Document) -> Self {
        let id = doc.create_node(TYPE_SHAPE);
        doc.set_property(&id, "pointCount", "0");
        doc.set_property(&id, "closed", "false");
        Self { id }
    }

    pub fn from_id(doc: &Document, id: Id) -> Option<Self> {
        let node = doc.get_node(&id)?;
        (node.kind == TYPE_SHAPE).then_some(Self { id })
    }

    pub fn set_closed(&self, doc: &mut Document, closed: bool) {
        doc.set_property(&self.id, "closed", closed.to_string());
    }

    pub fn is_closed(&self, doc: &Document) -> bool {
        doc.get_node(&self.id)
            .and_then(|n| n.get_property("closed"))
            .is_some_and(|v| v == "true")
    }

    fn point_count(&self, doc: &Document) -> usize {
        doc.get_node(&self.id)
            .and_then(|n| n.get_property("pointCount"))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// Sets point `index`, extending `pointCount` if needed. Points are never
    /// compacted on removal; callers that need to shrink a path should create a
    /// fresh node, matching the append-only nature of the underlying registers.
    pub fn set_point(&self, doc: &mut Document, index: usize, x: f64, y: f64) {
        write_point(doc, &self.id, &format!("point{index}"), x, y);
        if index >= self.point_count(doc) {
            doc.set_property(&self.id, "pointCount", (index + 1).to_string());
        }
    }

    pub fn get_point(&self, doc: &Document, index: usize) -> Option<(f64, f64)> {
        read_point(doc, &self.id, &format!("point{index}"))
    }

    pub fn points(&self, doc: &Document) -> Vec<(f64, f64)> {
        (0..self.point_count(doc))
            .filter_map(|i| self.get_point(doc, i))
            .collect()
    }

    /// See [`RectangleView::set_rotation`] for the transform-composition caveat.
    pub fn set_rotation(&self, doc: &mut Document, rotation: f64) {
        write_f64(doc, &self.id, "rotation", rotation);
    }

    pub fn get_rotation(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "rotation").unwrap_or(0.0)
    }

    pub fn set_scale(&self, doc: &mut Document, scale_x: f64, scale_y: f64) {
        write_f64(doc, &self.id, "scaleX", scale_x);
        write_f64(doc, &self.id, "scaleY", scale_y);
    }

    pub fn get_scale_x(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "scaleX").unwrap_or(1.0)
    }

    pub fn get_scale_y(&self, doc: &Document) -> f64 {
        read_f64(doc, &self.id, "scaleY").unwrap_or(1.0)
    }

    pub fn delete(&self, doc: &mut Document) {
        doc.delete_node(&self.id);
    }
}
