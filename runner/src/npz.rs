//! Reader for the `.npz` archives written by the fingerprint step.
//!
//! An `.npz` file is a zip archive whose members are `.npy` arrays. Only the
//! subset GROVER produces is supported: one numeric array per member, with
//! little- or big-endian `f4`/`f8`/`i4`/`i8` elements, in C or Fortran order.

use ndarray::{Array2, ShapeBuilder};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Errors while reading an output array.
#[derive(Debug, Error)]
pub enum NpzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid npz archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("array '{0}' not found in archive")]
    MissingArray(String),

    #[error("invalid npy header: {0}")]
    BadHeader(String),

    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),

    #[error("expected a 2-D array, got shape {0:?}")]
    NotTwoDimensional(Vec<usize>),

    #[error("array data truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Float,
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    kind: Kind,
    size: usize,
    little_endian: bool,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, NpzError> {
        let unsupported = || NpzError::UnsupportedDtype(descr.to_string());
        let mut chars = descr.chars();
        let little_endian = match chars.next() {
            Some('<') | Some('|') => true,
            Some('>') => false,
            Some('=') => cfg!(target_endian = "little"),
            _ => return Err(unsupported()),
        };
        let kind = match chars.next() {
            Some('f') => Kind::Float,
            Some('i') => Kind::Int,
            _ => return Err(unsupported()),
        };
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        match (kind, size) {
            (Kind::Float, 4 | 8) | (Kind::Int, 4 | 8) => Ok(Self { kind, size, little_endian }),
            _ => Err(unsupported()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Vec<f64> {
        let le = self.little_endian;
        match (self.kind, self.size) {
            (Kind::Float, 4) => bytes
                .chunks_exact(4)
                .map(|c| {
                    let b = [c[0], c[1], c[2], c[3]];
                    f64::from(if le { f32::from_le_bytes(b) } else { f32::from_be_bytes(b) })
                })
                .collect(),
            (Kind::Float, _) => bytes
                .chunks_exact(8)
                .map(|c| {
                    let b = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
                    if le { f64::from_le_bytes(b) } else { f64::from_be_bytes(b) }
                })
                .collect(),
            (Kind::Int, 4) => bytes
                .chunks_exact(4)
                .map(|c| {
                    let b = [c[0], c[1], c[2], c[3]];
                    f64::from(if le { i32::from_le_bytes(b) } else { i32::from_be_bytes(b) })
                })
                .collect(),
            (Kind::Int, _) => bytes
                .chunks_exact(8)
                .map(|c| {
                    let b = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
                    (if le { i64::from_le_bytes(b) } else { i64::from_be_bytes(b) }) as f64
                })
                .collect(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Header {
    dtype: Dtype,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Read the 2-D array `name` from the archive at `path`.
///
/// `name` is the key the array was saved under (`np.savez(path, fps=...)`
/// stores it as member `fps.npy`).
pub fn read_array2(path: &Path, name: &str) -> Result<Array2<f64>, NpzError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let member = format!("{name}.npy");
    let lookup = if archive.file_names().any(|n| n == member) {
        member.as_str()
    } else {
        name
    };

    let mut bytes = Vec::new();
    {
        let mut entry = archive.by_name(lookup).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => NpzError::MissingArray(name.to_string()),
            other => NpzError::Zip(other),
        })?;
        entry.read_to_end(&mut bytes)?;
    }

    parse_npy(&bytes)
}

/// Decode a complete `.npy` payload into a 2-D `f64` array.
pub fn parse_npy(bytes: &[u8]) -> Result<Array2<f64>, NpzError> {
    let (header, offset) = parse_header(bytes)?;

    let (rows, cols) = match header.shape.as_slice() {
        &[rows, cols] => (rows, cols),
        _ => return Err(NpzError::NotTwoDimensional(header.shape.clone())),
    };

    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(header.dtype.size))
        .ok_or_else(|| NpzError::BadHeader(format!("shape ({rows}, {cols}) is too large")))?;
    let data = &bytes[offset..];
    if data.len() < expected {
        return Err(NpzError::Truncated { expected, actual: data.len() });
    }

    let values = header.dtype.decode(&data[..expected]);
    let array = if header.fortran_order {
        Array2::from_shape_vec((rows, cols).f(), values)?
    } else {
        Array2::from_shape_vec((rows, cols), values)?
    };
    Ok(array)
}

fn parse_header(bytes: &[u8]) -> Result<(Header, usize), NpzError> {
    if bytes.len() < 10 || !bytes.starts_with(NPY_MAGIC) {
        return Err(NpzError::BadHeader("missing NUMPY magic".into()));
    }

    let major = bytes[6];
    let (header_len, start): (usize, usize) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(NpzError::BadHeader("truncated header length".into()));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        v => return Err(NpzError::BadHeader(format!("unsupported format version {v}"))),
    };

    let end = match start.checked_add(header_len) {
        Some(end) if end <= bytes.len() => end,
        _ => return Err(NpzError::BadHeader("header extends past end of data".into())),
    };
    let text = std::str::from_utf8(&bytes[start..end])
        .map_err(|e| NpzError::BadHeader(e.to_string()))?;

    let descr = dict_value(text, "descr")
        .and_then(|v| v.strip_prefix('\''))
        .and_then(|v| v.split('\'').next())
        .ok_or_else(|| NpzError::BadHeader("missing 'descr'".into()))?;

    let fortran_order = match dict_value(text, "fortran_order") {
        Some(v) if v.starts_with("True") => true,
        Some(v) if v.starts_with("False") => false,
        _ => return Err(NpzError::BadHeader("missing 'fortran_order'".into())),
    };

    let shape_text = dict_value(text, "shape")
        .and_then(|v| v.strip_prefix('('))
        .and_then(|v| v.split(')').next())
        .ok_or_else(|| NpzError::BadHeader("missing 'shape'".into()))?;
    let shape = shape_text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| NpzError::BadHeader(format!("invalid shape entry '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let header = Header {
        dtype: Dtype::parse(descr)?,
        fortran_order,
        shape,
    };
    Ok((header, end))
}

/// Text following `'key':` in a numpy header dict, leading whitespace trimmed.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}':");
    let at = header.find(&needle)?;
    Some(header[at + needle.len()..].trim_start())
}
