//! Face sinks and the default polygon-soup mesh buffer.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Receives every face the turtle emits, as an ordered list of at least three points.
///
/// The sink owns storage and indexing. Closures taking `&[DVec3]` are sinks too.
pub trait FaceSink {
    fn add_face(&mut self, vertices: &[DVec3]);
}

impl<F: FnMut(&[DVec3])> FaceSink for F {
    fn add_face(&mut self, vertices: &[DVec3]) {
        self(vertices)
    }
}

/// A polygon soup: every face appends its own vertices, no welding.
///
/// This mirrors what a host mesh builder is fed (vertex list plus per-face index lists)
/// and is the usual sink for [`Interpreter`](crate::interpreter::Interpreter) runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    pub vertices: Vec<DVec3>,

    /// Indices into `vertices`, one list per face.
    pub faces: Vec<Vec<u32>>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolves face `index` back into points.
    pub fn face(&self, index: usize) -> Option<Vec<DVec3>> {
        self.faces
            .get(index)
            .map(|face| face.iter().map(|&i| self.vertices[i as usize]).collect())
    }

    /// Axis-aligned bounds of all vertices, or `None` when empty.
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

impl FaceSink for MeshBuffer {
    fn add_face(&mut self, vertices: &[DVec3]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.faces
            .push((start..start + vertices.len() as u32).collect());
    }
}
