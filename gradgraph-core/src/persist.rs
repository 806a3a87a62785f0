//! Binary persistence of leaf values.
//!
//! One record per leaf:
//!
//! ```text
//! [trainable: u8 (0 or 1)]
//! [dimension: u64 little-endian] x rank   (none, [len], or [rows, cols])
//! [element: T little-endian] x numel      (row-major for matrices)
//! ```
//!
//! Records carry no rank tag; the reader supplies the expected rank (or the
//! target leaf does). Every record is decoded and validated in full before
//! the graph is touched, so a failed load leaves the graph unchanged.

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::value::{Matrix, Rank, Value};
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

struct LeafRecord<T> {
    trainable: bool,
    value: Value<T>,
}

/// Writes the record of one leaf.
pub fn write_leaf<T: GraphFloat, W: Write>(
    graph: &Graph<T>,
    id: NodeId,
    writer: &mut W,
) -> Result<(), GradGraphError> {
    let index = require_leaf(graph, id)?;
    let value = graph.value(id)?;
    let mut buf = Vec::with_capacity(1 + 16 + value.numel() * T::BYTES);
    buf.push(u8::from(graph.is_trainable(id)?));
    for dim in value.shape().dims() {
        buf.extend_from_slice(&(dim as u64).to_le_bytes());
    }
    for &x in value.as_slice() {
        x.write_le(&mut buf);
    }
    writer.write_all(&buf)?;
    debug!("Wrote leaf n{} ({} bytes)", index, buf.len());
    Ok(())
}

/// Reads one record of the given rank and adds it to `graph` as a new leaf.
pub fn read_leaf<T: GraphFloat, R: Read>(
    graph: &mut Graph<T>,
    rank: Rank,
    reader: &mut R,
) -> Result<NodeId, GradGraphError> {
    let record = decode(rank, reader)?;
    Ok(if record.trainable {
        graph.parameter(record.value)
    } else {
        graph.leaf(record.value)
    })
}

/// Reads one record into an existing leaf, which must have the same shape.
pub fn load_into<T: GraphFloat, R: Read>(
    graph: &mut Graph<T>,
    id: NodeId,
    reader: &mut R,
) -> Result<(), GradGraphError> {
    require_leaf(graph, id)?;
    let record = decode_for(graph, id, reader)?;
    apply(graph, id, record)
}

/// Writes the records of `ids` back to back into `path`, creating parent
/// directories as needed.
pub fn save_to_file<T: GraphFloat>(
    graph: &Graph<T>,
    ids: &[NodeId],
    path: impl AsRef<Path>,
) -> Result<(), GradGraphError> {
    for &id in ids {
        require_leaf(graph, id)?;
    }
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for &id in ids {
        write_leaf(graph, id, &mut writer)?;
    }
    writer.flush()?;
    debug!("Saved {} leaves to {}", ids.len(), path.display());
    Ok(())
}

/// Loads the records written by [`save_to_file`] into `ids`, in order.
///
/// Nothing is written to the graph unless every record decodes and matches
/// the shape of its target leaf.
pub fn load_from_file<T: GraphFloat>(
    graph: &mut Graph<T>,
    ids: &[NodeId],
    path: impl AsRef<Path>,
) -> Result<(), GradGraphError> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mut records = Vec::with_capacity(ids.len());
    for &id in ids {
        require_leaf(graph, id)?;
        records.push(decode_for(graph, id, &mut reader)?);
    }
    for (&id, record) in ids.iter().zip(records) {
        apply(graph, id, record)?;
    }
    debug!("Loaded {} leaves from {}", ids.len(), path.display());
    Ok(())
}

fn require_leaf<T: GraphFloat>(graph: &Graph<T>, id: NodeId) -> Result<usize, GradGraphError> {
    if !graph.is_leaf(id)? {
        return Err(GradGraphError::NotALeaf { index: id.index() });
    }
    Ok(id.index())
}

/// Decodes a record shaped like the leaf `id`.
fn decode_for<T: GraphFloat, R: Read>(
    graph: &Graph<T>,
    id: NodeId,
    reader: &mut R,
) -> Result<LeafRecord<T>, GradGraphError> {
    let expected = graph.shape(id)?;
    let record = decode(expected.rank(), reader)?;
    if record.value.shape() != expected {
        return Err(GradGraphError::shape_mismatch(
            expected,
            record.value.shape(),
            "load_into",
        ));
    }
    Ok(record)
}

fn apply<T: GraphFloat>(
    graph: &mut Graph<T>,
    id: NodeId,
    record: LeafRecord<T>,
) -> Result<(), GradGraphError> {
    graph.set_value(id, record.value)?;
    graph.set_trainable(id, record.trainable)
}

fn decode<T: GraphFloat, R: Read>(rank: Rank, reader: &mut R) -> Result<LeafRecord<T>, GradGraphError> {
    let mut flag = [0u8; 1];
    read_exact(reader, &mut flag)?;
    let trainable = match flag[0] {
        0 => false,
        1 => true,
        other => {
            return Err(GradGraphError::InvalidFormat(format!(
                "trainable flag must be 0 or 1, got {}",
                other
            )))
        }
    };

    let n_dims = match rank {
        Rank::Scalar => 0,
        Rank::Vector => 1,
        Rank::Matrix => 2,
    };
    let mut dims = Vec::with_capacity(n_dims);
    for _ in 0..n_dims {
        let mut raw = [0u8; 8];
        read_exact(reader, &mut raw)?;
        let dim = usize::try_from(u64::from_le_bytes(raw)).map_err(|_| {
            GradGraphError::InvalidFormat("dimension does not fit in usize".to_string())
        })?;
        dims.push(dim);
    }

    let byte_len = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .and_then(|numel| numel.checked_mul(T::BYTES))
        .ok_or_else(|| GradGraphError::InvalidFormat("element count overflows".to_string()))?;
    let mut raw = Vec::new();
    reader.by_ref().take(byte_len as u64).read_to_end(&mut raw)?;
    if raw.len() != byte_len {
        return Err(GradGraphError::InvalidFormat(format!(
            "truncated record: expected {} value bytes, found {}",
            byte_len,
            raw.len()
        )));
    }
    let data: Vec<T> = raw.chunks_exact(T::BYTES).map(T::read_le).collect();

    let value = match (rank, dims.as_slice()) {
        (Rank::Matrix, &[rows, cols]) => Value::Matrix(Matrix::new(rows, cols, data)?),
        (Rank::Vector, _) => Value::Vector(data),
        _ => Value::Scalar(data.first().copied().unwrap_or_else(T::zero)),
    };
    Ok(LeafRecord { trainable, value })
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), GradGraphError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            GradGraphError::InvalidFormat("truncated record header".to_string())
        }
        _ => GradGraphError::from(e),
    })
}

#[cfg(test)]
#[path = "persist_test.rs"]
mod tests;
