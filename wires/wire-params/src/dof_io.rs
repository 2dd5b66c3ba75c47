//! Reading and writing DOF files.
//!
//! # Format
//!
//! ```text
//! # one tagged value per line, thickness DOFs before offset DOFs
//! thickness 0.5
//! thickness 0.25
//! offset 0.01
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ParamError, ParamResult};

/// A flat DOF vector split into its thickness and offset parts.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DofBuffer {
    /// Thickness DOF values in insertion order.
    pub thickness: Vec<f64>,
    /// Offset DOF values in insertion order.
    pub offset: Vec<f64>,
}

impl DofBuffer {
    /// Total number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thickness.len() + self.offset.len()
    }

    /// Whether the buffer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thickness.is_empty() && self.offset.is_empty()
    }

    /// Thickness values followed by offset values.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.thickness);
        out.extend_from_slice(&self.offset);
        out
    }
}

/// Load a DOF file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn load_dofs<P: AsRef<Path>>(path: P) -> ParamResult<DofBuffer> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ParamError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ParamError::Io(e)
        }
    })?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let buffer = parse_dofs(&content)?;
    debug!(
        path = %path.display(),
        thickness = buffer.thickness.len(),
        offset = buffer.offset.len(),
        "Loaded DOFs"
    );
    Ok(buffer)
}

/// Parse DOF text.
///
/// # Errors
///
/// Returns [`ParamError::Parse`] for unknown tags, malformed numbers, or a
/// thickness value following an offset value.
///
/// # Example
///
/// ```
/// use wire_params::parse_dofs;
///
/// let dofs = parse_dofs("thickness 0.5\noffset -0.1\n").unwrap();
/// assert_eq!(dofs.thickness, vec![0.5]);
/// assert_eq!(dofs.offset, vec![-0.1]);
/// ```
pub fn parse_dofs(content: &str) -> ParamResult<DofBuffer> {
    let mut buffer = DofBuffer::default();
    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or("");
        let value = tokens
            .next()
            .ok_or_else(|| ParamError::parse(line_no, "missing value"))?
            .parse::<f64>()
            .map_err(|e| ParamError::parse(line_no, format!("bad value: {e}")))?;
        if tokens.next().is_some() {
            return Err(ParamError::parse(line_no, "trailing tokens"));
        }
        match tag {
            "thickness" if buffer.offset.is_empty() => buffer.thickness.push(value),
            "thickness" => {
                return Err(ParamError::parse(
                    line_no,
                    "thickness values must precede offset values",
                ))
            }
            "offset" => buffer.offset.push(value),
            other => return Err(ParamError::parse(line_no, format!("unknown tag {other:?}"))),
        }
    }
    Ok(buffer)
}

/// Save a DOF file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_dofs<P: AsRef<Path>>(buffer: &DofBuffer, path: P) -> ParamResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_dofs(buffer, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write DOFs in text form.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_dofs<W: Write>(buffer: &DofBuffer, writer: &mut W) -> ParamResult<()> {
    for value in &buffer.thickness {
        writeln!(writer, "thickness {value}")?;
    }
    for value in &buffer.offset {
        writeln!(writer, "offset {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_comments() {
        let text = "# dofs\nthickness 0.5\n\nthickness 0.25 # outer\noffset 1e-2\n";
        let dofs = parse_dofs(text).unwrap();
        assert_eq!(dofs.thickness, vec![0.5, 0.25]);
        assert_eq!(dofs.offset, vec![0.01]);
        assert_eq!(dofs.to_vec(), vec![0.5, 0.25, 0.01]);
    }

    #[test]
    fn test_write_then_parse() {
        let dofs = DofBuffer {
            thickness: vec![0.3],
            offset: vec![-0.125, 0.0],
        };
        let mut out = Vec::new();
        write_dofs(&dofs, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "thickness 0.3\noffset -0.125\noffset 0\n");
        assert_eq!(parse_dofs(&text).unwrap(), dofs);
    }

    #[test]
    fn test_parse_errors() {
        for (text, line) in [
            ("radius 0.5\n", 1),
            ("thickness\n", 1),
            ("thickness abc\n", 1),
            ("thickness 0.1\noffset 0.2\nthickness 0.3\n", 3),
            ("offset 0.1 0.2\n", 1),
        ] {
            match parse_dofs(text) {
                Err(ParamError::Parse { line: l, .. }) => assert_eq!(l, line, "{text:?}"),
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dofs("/nonexistent/path/params.dof").unwrap_err();
        assert!(matches!(err, ParamError::FileNotFound { .. }));
    }
}
