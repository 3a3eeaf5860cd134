//! The editor-facing entry point: owns a [`Document`] and the replica id that
//! stamps its local operations, and caches the typed views the projection layer
//! exposes over it.

use std::collections::HashMap;

use crate::document::Document;
use crate::id::Id;
use crate::projection::{
    FrameView, PathView, RectangleView, TextBoxView, TYPE_FRAME, TYPE_RECTANGLE, TYPE_SHAPE,
    TYPE_TEXT,
};

#[cfg(feature = "serde")]
use crate::error::Result;

/// Owns one document and the view caches rebuilt from it after every merge.
pub struct Manager {
    document: Document,
    frames: HashMap<String, FrameView>,
    rectangles: HashMap<String, RectangleView>,
    text_boxes: HashMap<String, TextBoxView>,
    shapes: HashMap<String, PathView>,
}

impl Manager {
    pub fn new(site: impl Into<String>) -> Self {
        let document = Document::new(site);
        let mut manager = Self {
            document,
            frames: HashMap::new(),
            rectangles: HashMap::new(),
            text_boxes: HashMap::new(),
            shapes: HashMap::new(),
        };
        manager.rebuild();
        manager
    }

    pub fn site_id(&self) -> &str {
        &self.document.site
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn create_frame(&mut self, x: f64, y: f64, width: f64, height: f64) -> Id {
        let view = FrameView::create(&mut self.document, x, y, width, height);
        let root = self.document.root_id.clone();
        self.document.add_child(&root, &view.id);
        let id = view.id.clone();
        self.frames.insert(id.to_string(), view);
        id
    }

    pub fn frame(&self, id: &Id) -> Option<&FrameView> {
        self.frames.get(&id.to_string())
    }

    pub fn delete_frame(&mut self, id: &Id) {
        self.document.delete_node(id);
        self.frames.remove(&id.to_string());
    }

    pub fn all_frames(&self) -> Vec<&FrameView> {
        self.frames.values().collect()
    }

    /// Creates a rectangle under `parent` (or the document root, when absent) and
    /// adds it as a visible child.
    pub fn create_rectangle(
        &mut self,
        parent: Option<&Id>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Id {
        let view = RectangleView::create(&mut self.document, x, y, width, height);
        let parent = parent.cloned().unwrap_or_else(|| self.document.root_id.clone());
        self.document.add_child(&parent, &view.id);
        let id = view.id.clone();
        self.rectangles.insert(id.to_string(), view);
        id
    }

    pub fn rectangle(&self, id: &Id) -> Option<&RectangleView> {
        self.rectangles.get(&id.to_string())
    }

    pub fn delete_rectangle(&mut self, id: &Id) {
        self.document.delete_node(id);
        self.rectangles.remove(&id.to_string());
    }

    pub fn all_rectangles(&self) -> Vec<&RectangleView> {
        self.rectangles.values().collect()
    }

    pub fn create_text_box(
        &mut self,
        parent: Option<&Id>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: impl Into<String>,
    ) -> Id {
        let view = TextBoxView::create(&mut self.document, x, y, width, height, text);
        let parent = parent.cloned().unwrap_or_else(|| self.document.root_id.clone());
        self.document.add_child(&parent, &view.id);
        let id = view.id.clone();
        self.text_boxes.insert(id.to_string(), view);
        id
    }

    pub fn text_box(&self, id: &Id) -> Option<&TextBoxView> {
        self.text_boxes.get(&id.to_string())
    }

    pub fn delete_text_box(&mut self, id: &Id) {
        self.document.delete_node(id);
        self.text_boxes.remove(&id.to_string());
    }

    pub fn all_text_boxes(&self) -> Vec<&TextBoxView> {
        self.text_boxes.values().collect()
    }

    pub fn create_path(&mut self, parent: Option<&Id>) -> Id {
        let view = PathView::create(&mut self.document);
        let parent = parent.cloned().unwrap_or_else(|| self.document.root_id.clone());
        self.document.add_child(&parent, &view.id);
        let id = view.id.clone();
        self.shapes.insert(id.to_string(), view);
        id
    }

    pub fn path(&self, id: &Id) -> Option<&PathView> {
        self.shapes.get(&id.to_string())
    }

    pub fn all_paths(&self) -> Vec<&PathView> {
        self.shapes.values().collect()
    }

    /// Merges `other`'s document into this one and rebuilds every view cache.
    pub fn merge(&mut self, other: &Manager) {
        self.document.merge(&other.document);
        self.rebuild();
    }

    #[cfg(feature = "serde")]
    pub fn serialize(&self) -> Vec<u8> {
        crate::persistence::serialize(&self.document)
    }

    #[cfg(feature = "serde")]
    pub fn deserialize(bytes: &[u8]) -> Result<Manager> {
        let document = crate::persistence::deserialize(bytes)?;
        let mut manager = Manager {
            document,
            frames: HashMap::new(),
            rectangles: HashMap::new(),
            text_boxes: HashMap::new(),
            shapes: HashMap::new(),
        };
        manager.rebuild();
        Ok(manager)
    }

    /// Rebuilds every cache from the document alone: total and idempotent, never
    /// dependent on pre-merge state. Walks from the root, recursing into frames,
    /// then makes a second pass over the full node map so that orphaned typed
    /// nodes (no reachable parent, e.g. their frame was deleted concurrently on
    /// both sides) are still exposed by type — matching `all_rectangles` /
    /// `all_text_boxes` / `all_frames`, which are defined over the whole map.
    fn rebuild(&mut self) {
        self.frames.clear();
        self.rectangles.clear();
        self.text_boxes.clear();
        self.shapes.clear();

        let root = self.document.root_id.clone();
        self.walk_from(root);

        let remaining: Vec<(Id, String)> = self
            .document
            .nodes
            .values()
            .filter(|n| !n.deleted)
            .map(|n| (n.id.clone(), n.kind.clone()))
            .collect();
        for (id, kind) in remaining {
            self.insert_by_kind(id, &kind);
        }
    }

    fn walk_from(&mut self, parent: Id) {
        for child_id in self.document.children(&parent) {
            let Some(node) = self.document.get_node(&child_id) else {
                continue;
            };
            if node.deleted {
                continue;
            }
            let kind = node.kind.clone();
            self.insert_by_kind(child_id.clone(), &kind);
            if kind == TYPE_FRAME {
                self.walk_from(child_id);
            }
        }
    }

    fn insert_by_kind(&mut self, id: Id, kind: &str) {
        let key = id.to_string();
        match kind {
            TYPE_FRAME => {
                self.frames.entry(key).or_insert(FrameView { id });
            }
            TYPE_RECTANGLE => {
                self.rectangles.entry(key).or_insert(RectangleView { id });
            }
            TYPE_TEXT => {
                self.text_boxes.entry(key).or_insert(TextBoxView { id });
            }
            TYPE_SHAPE => {
                self.shapes.entry(key).or_insert(PathView { id });
            }
            _ => {}
        }
    }
}
