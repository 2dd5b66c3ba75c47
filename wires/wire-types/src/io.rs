//! Reading and writing `.wire` files.
//!
//! # Format
//!
//! ```text
//! # comment
//! v x y z        vertex (two coordinates for planar networks)
//! l i j          edge, 1-based vertex indices
//! ```
//!
//! A file whose vertex lines all carry two coordinates is loaded as a 2D
//! network, anything else as 3D.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use crate::error::{WireError, WireResult};
use crate::network::WireNetwork;

/// Load a wire network from a `.wire` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn load_wire<P: AsRef<Path>>(path: P) -> WireResult<WireNetwork> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WireError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            WireError::Io(e)
        }
    })?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let network = parse_wire(&content)?;
    debug!(
        path = %path.display(),
        vertices = network.num_vertices(),
        edges = network.num_edges(),
        "Loaded wire network"
    );
    Ok(network)
}

/// Parse a wire network from `.wire` text.
///
/// # Errors
///
/// Returns [`WireError::Parse`] for malformed lines and the usual structural
/// errors for invalid edges.
///
/// # Example
///
/// ```
/// use wire_types::parse_wire;
///
/// let network = parse_wire("v 0 0 0\nv 1 0 0\nl 1 2\n").unwrap();
/// assert_eq!(network.num_vertices(), 2);
/// assert_eq!(network.edges(), &[[0, 1]]);
/// ```
pub fn parse_wire(content: &str) -> WireResult<WireNetwork> {
    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    let mut planar = true;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords = tokens
                    .map(|t| {
                        t.parse::<f64>().map_err(|e| {
                            WireError::parse(line_no, format!("bad coordinate {t:?}: {e}"))
                        })
                    })
                    .collect::<WireResult<Vec<_>>>()?;
                match coords.as_slice() {
                    [x, y] => vertices.push(Point3::new(*x, *y, 0.0)),
                    [x, y, z] => {
                        planar = false;
                        vertices.push(Point3::new(*x, *y, *z));
                    }
                    _ => {
                        return Err(WireError::parse(
                            line_no,
                            format!("vertex needs 2 or 3 coordinates, got {}", coords.len()),
                        ))
                    }
                }
            }
            Some("l") => {
                let ids = tokens
                    .map(|t| {
                        t.parse::<usize>()
                            .map_err(|e| WireError::parse(line_no, format!("bad index {t:?}: {e}")))
                    })
                    .collect::<WireResult<Vec<_>>>()?;
                match ids.as_slice() {
                    [a, b] if *a >= 1 && *b >= 1 => edges.push([a - 1, b - 1]),
                    [_, _] => {
                        return Err(WireError::parse(line_no, "edge indices are 1-based"));
                    }
                    _ => {
                        return Err(WireError::parse(
                            line_no,
                            format!("edge needs 2 indices, got {}", ids.len()),
                        ))
                    }
                }
            }
            Some(other) => {
                return Err(WireError::parse(
                    line_no,
                    format!("unknown record type {other:?}"),
                ))
            }
            None => {}
        }
    }

    let dim = if planar && !vertices.is_empty() { 2 } else { 3 };
    WireNetwork::from_parts(dim, vertices, edges)
}

/// Save a wire network to a `.wire` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_wire<P: AsRef<Path>>(network: &WireNetwork, path: P) -> WireResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_wire(network, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a wire network in `.wire` format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_wire<W: Write>(network: &WireNetwork, writer: &mut W) -> WireResult<()> {
    for v in network.vertices() {
        if network.dim() == 2 {
            writeln!(writer, "v {} {}", v.x, v.y)?;
        } else {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
    }
    for [a, b] in network.edges() {
        writeln!(writer, "l {} {}", a + 1, b + 1)?;
    }
    Ok(())
}
