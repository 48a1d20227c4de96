//! Wavefront OBJ parsing
//!
//! Understands `v`, `vt`, `vn` and `f` records. Faces accept the `v`,
//! `v/vt`, `v/vt/vn` and `v//vn` corner forms with 1-based or negative
//! (relative) indices, and are fan-triangulated around their first corner.
//! Anything else is ignored.

use std::fs;
use std::path::Path;

use super::{FaceCorner, Mesh, Triangle};
use crate::rasterizer::{Vec2, Vec3};

/// Error type for mesh loading
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve a raw OBJ index against the number of records seen so far.
/// Positive indices are 1-based and may point past the end (looked up
/// leniently later); negative ones count back from the last record.
fn resolve_index(raw: i64, count: usize) -> Option<usize> {
    if raw > 0 {
        usize::try_from(raw - 1).ok()
    } else if raw < 0 {
        let back = usize::try_from(-raw).ok()?;
        count.checked_sub(back)
    } else {
        None
    }
}

/// Parse one face corner. `None` means the token is malformed.
fn parse_corner(token: &str, nverts: usize, nuvs: usize) -> Option<FaceCorner> {
    let mut parts = token.split('/');

    let vertex = resolve_index(parts.next()?.parse().ok()?, nverts)?;

    let uv = match parts.next() {
        None | Some("") => 0,
        Some(s) => resolve_index(s.parse().ok()?, nuvs)?,
    };

    // Normal index: must be well formed, but isn't kept
    if let Some(s) = parts.next() {
        if !s.is_empty() {
            s.parse::<i64>().ok()?;
        }
    }

    if parts.next().is_some() {
        return None;
    }

    Some(FaceCorner::new(vertex, uv))
}

fn parse_floats<const N: usize>(fields: &mut std::str::SplitWhitespace<'_>) -> Option<[f32; N]> {
    let mut out = [0.0f32; N];
    for slot in &mut out {
        *slot = fields.next()?.parse().ok()?;
    }
    Some(out)
}

impl Mesh {
    /// Build a mesh from OBJ text. Malformed records are skipped.
    pub fn parse(source: &str) -> Mesh {
        let mut mesh = Mesh::default();

        for (line_no, line) in source.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(tag) = fields.next() else {
                continue;
            };

            match tag {
                "v" => match parse_floats::<3>(&mut fields) {
                    Some([x, y, z]) => mesh.positions.push(Vec3::new(x, y, z)),
                    None => tracing::debug!("line {}: skipping malformed vertex", line_no + 1),
                },
                "vt" => match parse_floats::<2>(&mut fields) {
                    Some([u, v]) => mesh.uvs.push(Vec2::new(u, v)),
                    None => tracing::debug!("line {}: skipping malformed texture coordinate", line_no + 1),
                },
                "vn" => mesh.normal_records += 1,
                "f" => {
                    let corners: Vec<FaceCorner> = fields
                        .filter_map(|token| {
                            let corner = parse_corner(token, mesh.positions.len(), mesh.uvs.len());
                            if corner.is_none() {
                                tracing::debug!("line {}: skipping face token {:?}", line_no + 1, token);
                            }
                            corner
                        })
                        .collect();

                    if corners.len() < 3 {
                        tracing::debug!("line {}: face has fewer than 3 corners", line_no + 1);
                        continue;
                    }

                    // Fan around the first corner
                    for pair in corners[1..].windows(2) {
                        mesh.triangles.push(Triangle {
                            corners: [corners[0], pair[0], pair[1]],
                        });
                    }
                }
                _ => {}
            }
        }

        mesh
    }

    /// Load an OBJ file, surfacing IO errors. Bytes that aren't valid UTF-8
    /// (legacy-encoded comments or names) only spoil the record they're in.
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Mesh, MeshError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let mesh = Mesh::parse(&String::from_utf8_lossy(&bytes));

        tracing::info!(
            "Loaded mesh {}: verts={} uv={} normals={} faces={}",
            path.display(),
            mesh.nverts(),
            mesh.nuvs(),
            mesh.normal_records(),
            mesh.nfaces()
        );
        Ok(mesh)
    }

    /// Load an OBJ file. An unreadable file gives an empty mesh; callers
    /// should check `is_empty()` before rendering.
    pub fn load<P: AsRef<Path>>(path: P) -> Mesh {
        let path = path.as_ref();
        Mesh::try_load(path).unwrap_or_else(|e| {
            tracing::warn!("Cannot open mesh {}: {}", path.display(), e);
            Mesh::default()
        })
    }
}
