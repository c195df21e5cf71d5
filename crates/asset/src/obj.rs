//! Minimal OBJ parser: `v`, `vt`, `vn` and triangular `f p/t/n p/t/n p/t/n` records.
//!
//! Corners are not deduplicated. Every face corner becomes its own vertex and the
//! index buffer is the identity `0..3 * faces`, so the output can be drawn
//! directly as a triangle list with one attribute set per corner.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{DecodeError, DecodeResult},
    mesh::MeshData,
};

/// Load an OBJ mesh from a file path.
pub fn decode(path: impl AsRef<Path>) -> DecodeResult<MeshData> {
    let path = path.as_ref();
    log::info!("Loading OBJ file {}", path.display());

    let file = File::open(path).map_err(|source| DecodeError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    decode_from_reader(BufReader::new(file))
}

/// Convenience helper to parse an OBJ string literal.
pub fn decode_str(contents: &str) -> DecodeResult<MeshData> {
    decode_from_reader(io::Cursor::new(contents))
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn decode_from_reader<R: BufRead>(reader: R) -> DecodeResult<MeshData> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    // (position, texcoord, normal), already zero-based and bounds-checked.
    let mut corners: Vec<[usize; 3]> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let content = line.split_once('#').map_or(line.as_str(), |(head, _)| head);
        let mut parts = content.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => positions.push(parse_floats(parts, line_no, &line)?),
            "vt" => texcoords.push(parse_floats(parts, line_no, &line)?),
            "vn" => normals.push(parse_floats(parts, line_no, &line)?),
            "f" => {
                let malformed = || DecodeError::MalformedFace {
                    line: line_no,
                    text: line.trim().to_string(),
                };
                let face = parse_face(parts).ok_or_else(malformed)?;
                for [p, t, n] in face {
                    corners.push([
                        resolve_index(p, positions.len()).ok_or_else(malformed)?,
                        resolve_index(t, texcoords.len()).ok_or_else(malformed)?,
                        resolve_index(n, normals.len()).ok_or_else(malformed)?,
                    ]);
                }
            }
            _ => {
                // Comments and directives we don't use (o/g/s/usemtl/mtllib).
            }
        }
    }

    let mut mesh = MeshData::with_capacity(corners.len(), corners.len());
    for [p, t, n] in corners {
        let index = mesh.push_vertex(positions[p], texcoords[t], normals[n]);
        mesh.indices.push(index);
    }

    log::info!(
        "Loaded OBJ: {} faces, {} vertices",
        mesh.indices.len() / 3,
        mesh.vertex_count()
    );
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(
    mut parts: impl Iterator<Item = &'a str>,
    line_no: usize,
    line: &str,
) -> DecodeResult<[f32; N]> {
    let mut out = [0.0f32; N];
    for slot in out.iter_mut() {
        *slot = parts
            .next()
            .and_then(|token| token.parse::<f32>().ok())
            .ok_or_else(|| DecodeError::MalformedVertex {
                line: line_no,
                text: line.trim().to_string(),
            })?;
    }
    Ok(out)
}

/// Exactly three `p/t/n` corners, nine integers in total.
fn parse_face<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<[[i64; 3]; 3]> {
    let mut face = [[0i64; 3]; 3];
    for corner in face.iter_mut() {
        let mut fields = parts.next()?.split('/');
        for value in corner.iter_mut() {
            *value = fields.next()?.parse().ok()?;
        }
        if fields.next().is_some() {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    Some(face)
}

/// 1-based index into a table of `len` entries declared so far.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let idx = usize::try_from(raw).ok()?.checked_sub(1)?;
    (idx < len).then_some(idx)
}
