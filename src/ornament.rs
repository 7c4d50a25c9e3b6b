//! Decorative meshes (flowers, fruit) stamped onto the turtle path by `*`.

use crate::error::{FloraError, Result};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Something that can be placed at a turtle pose.
pub trait Ornament {
    /// Returns faces oriented so the ornament's reference heading points along
    /// `heading`, translated to `position`.
    fn project(&self, position: DVec3, heading: DVec3) -> Vec<Vec<DVec3>>;
}

/// A triangle mesh loaded from a minimal line-oriented vertex/face list.
///
/// Recognized lines are `v x y z` and `f a b c` with one-based indices (an index may
/// carry `/`-separated suffixes, which are ignored). Anything else is skipped. Vertices
/// are read Y-up and stored Z-up.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrnamentMesh {
    pub vertices: Vec<DVec3>,

    /// Zero-based vertex indices.
    pub faces: Vec<[usize; 3]>,

    /// Direction the mesh "points" in its own space.
    pub heading: DVec3,
}

impl OrnamentMesh {
    pub fn parse(text: &str, scale: f64) -> Result<Self> {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let [x, y, z] = three(parts, line_no, |s| s.parse::<f64>().ok())?;
                    vertices.push(DVec3::new(x, z, y) * scale);
                }
                Some("f") => {
                    let [a, b, c] = three(parts, line_no, |s| {
                        s.split('/').next()?.parse::<usize>().ok().filter(|&k| k > 0)
                    })?;
                    faces.push((line_no, [a - 1, b - 1, c - 1]));
                }
                _ => {}
            }
        }

        for (line, face) in &faces {
            if let Some(&bad) = face.iter().find(|&&k| k >= vertices.len()) {
                return Err(FloraError::OrnamentParse {
                    line: *line,
                    message: format!(
                        "vertex {} referenced but only {} exist",
                        bad + 1,
                        vertices.len()
                    ),
                });
            }
        }

        Ok(Self {
            vertices,
            faces: faces.into_iter().map(|(_, face)| face).collect(),
            heading: DVec3::Z,
        })
    }

    pub fn load(path: impl AsRef<Path>, scale: f64) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, scale)
    }
}

impl Ornament for OrnamentMesh {
    fn project(&self, position: DVec3, heading: DVec3) -> Vec<Vec<DVec3>> {
        let rotation = match (self.heading.try_normalize(), heading.try_normalize()) {
            (Some(from), Some(to)) => DQuat::from_rotation_arc(from, to),
            _ => DQuat::IDENTITY,
        };
        self.faces
            .iter()
            .map(|face| {
                face.iter()
                    .map(|&k| position + rotation * self.vertices[k])
                    .collect()
            })
            .collect()
    }
}

fn three<'a, T>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<[T; 3]> {
    let mut read = || {
        let token = parts.next().ok_or_else(|| FloraError::OrnamentParse {
            line,
            message: "expected three values".to_string(),
        })?;
        parse(token).ok_or_else(|| FloraError::OrnamentParse {
            line,
            message: format!("invalid value '{token}'"),
        })
    };
    Ok([read()?, read()?, read()?])
}
