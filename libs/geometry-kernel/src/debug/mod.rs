//! # Debug Overlay
//!
//! Side channel of labels and line segments attached to a geometry for
//! visual inspection. Entries live independently of the mesh and are
//! cleared on their own.

use glam::{Vec3, Vec4};

/// Text label anchored in space.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugText {
    /// Vertex the label describes, if any.
    pub reference_vertex: Option<u32>,
    /// Facet the label describes, if any.
    pub reference_facet: Option<u32>,
    /// Anchor position.
    pub position: Vec3,
    /// Packed ABGR color.
    pub color: u32,
    /// Label text.
    pub text: String,
}

/// End point of a debug line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugVertex {
    /// Position.
    pub position: Vec3,
    /// RGBA color.
    pub color: Vec4,
    /// Line width at this end.
    pub width: f32,
}

/// Line segment between two debug vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Vertex the line describes, if any.
    pub reference_vertex: Option<u32>,
    /// Facet the line describes, if any.
    pub reference_facet: Option<u32>,
    /// End points.
    pub vertices: [DebugVertex; 2],
}

/// Collected debug entries.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::debug::{DebugOverlay, DebugText};
/// use glam::Vec3;
///
/// let mut overlay = DebugOverlay::default();
/// overlay.add_debug_text(DebugText {
///     reference_vertex: Some(0),
///     reference_facet: None,
///     position: Vec3::ZERO,
///     color: 0xffff_ffff,
///     text: "origin".into(),
/// });
/// overlay.access_debug_entries(|texts, lines| {
///     assert_eq!(texts.len(), 1);
///     assert!(lines.is_empty());
/// });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugOverlay {
    texts: Vec<DebugText>,
    lines: Vec<DebugLine>,
}

impl DebugOverlay {
    /// Adds a label.
    pub fn add_debug_text(&mut self, text: DebugText) {
        self.texts.push(text);
    }

    /// Adds a line.
    pub fn add_debug_line(&mut self, line: DebugLine) {
        self.lines.push(line);
    }

    /// Removes every entry.
    pub fn clear_debug(&mut self) {
        self.texts.clear();
        self.lines.clear();
    }

    /// Number of entries of both kinds.
    pub fn len(&self) -> usize {
        self.texts.len() + self.lines.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.lines.is_empty()
    }

    /// Runs `f` with mutable access to both entry lists.
    pub fn access_debug_entries<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Vec<DebugText>, &mut Vec<DebugLine>) -> R,
    {
        f(&mut self.texts, &mut self.lines)
    }
}
