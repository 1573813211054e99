//! Disk persistence for HNSW graphs using bincode serialization.
//!
//! A graph artifact is a bincode-encoded [`GraphSnapshot`] followed by an
//! 8-byte footer: `[magic "RGI1"][u32 CRC32 BE]` over the payload. Vectors are
//! not duplicated; loading requires the embedding store the graph was built from.
//! Writes use atomic temp-file + rename so a failed save never leaves a
//! readable-but-truncated artifact behind.

use crate::config::{GRAPH_CRC_MAGIC, GRAPH_FORMAT_VERSION, GRAPH_MAGIC};
use crate::error::{Error, Result};
use crate::hnsw::graph::{HnswConfig, HnswIndex};
use crate::storage::EmbeddingStore;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Borrowed view of an index, serialized without cloning the adjacency lists.
#[derive(Serialize)]
struct GraphSnapshotRef<'a> {
    magic: [u8; 4],
    version: u32,
    dimension: u64,
    node_count: u32,
    config: &'a HnswConfig,
    entry_point: Option<u32>,
    max_layer: u64,
    layers: &'a [u8],
    neighbors: &'a [Vec<Vec<u32>>],
}

/// Owned form of the persisted graph. Field order must match [`GraphSnapshotRef`].
#[derive(Debug, Deserialize)]
struct GraphSnapshot {
    magic: [u8; 4],
    version: u32,
    dimension: u64,
    node_count: u32,
    config: HnswConfig,
    entry_point: Option<u32>,
    max_layer: u64,
    layers: Vec<u8>,
    neighbors: Vec<Vec<Vec<u32>>>,
}

impl GraphSnapshot {
    /// Structural checks run before the graph is exposed for queries.
    fn validate(&self, store: &EmbeddingStore) -> std::result::Result<(), String> {
        if self.magic != GRAPH_MAGIC {
            return Err(format!("bad magic {:?}", self.magic));
        }
        if self.version != GRAPH_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.version, GRAPH_FORMAT_VERSION
            ));
        }
        self.config.validate().map_err(|e| e.to_string())?;

        let nc = self.node_count as usize;
        if self.dimension as usize != store.dimension() {
            return Err(format!(
                "graph dimension {} != store dimension {}",
                self.dimension,
                store.dimension()
            ));
        }
        if nc != store.len() {
            return Err(format!(
                "graph node_count {} != store length {}",
                nc,
                store.len()
            ));
        }
        if self.layers.len() != nc {
            return Err(format!("layers length {} != node_count {}", self.layers.len(), nc));
        }
        if self.neighbors.len() != nc {
            return Err(format!(
                "neighbors length {} != node_count {}",
                self.neighbors.len(),
                nc
            ));
        }

        let max_layer = self.max_layer as usize;
        if max_layer >= self.config.max_layers {
            return Err(format!(
                "max_layer {} exceeds configured max_layers {}",
                max_layer, self.config.max_layers
            ));
        }

        for (node_id, node_neighbors) in self.neighbors.iter().enumerate() {
            let declared = self.layers[node_id] as usize;
            if node_neighbors.len() != declared + 1 {
                return Err(format!(
                    "node {} declares layer {} but stores {} neighbor lists",
                    node_id,
                    declared,
                    node_neighbors.len()
                ));
            }
            if declared > max_layer {
                return Err(format!(
                    "node {} on layer {} above max_layer {}",
                    node_id, declared, max_layer
                ));
            }
            for (layer, layer_neighbors) in node_neighbors.iter().enumerate() {
                let cap = if layer == 0 {
                    self.config.m_max0.min(2 * self.config.m)
                } else {
                    self.config.m
                };
                if layer_neighbors.len() > cap {
                    return Err(format!(
                        "node {} layer {} has {} neighbors (cap {})",
                        node_id,
                        layer,
                        layer_neighbors.len(),
                        cap
                    ));
                }
                for &neighbor in layer_neighbors {
                    let nid = neighbor as usize;
                    if nid >= nc {
                        return Err(format!(
                            "neighbor {} out of bounds (node_count={}) at node {} layer {}",
                            neighbor, nc, node_id, layer
                        ));
                    }
                    if (self.layers[nid] as usize) < layer {
                        return Err(format!(
                            "neighbor {} of node {} linked on layer {} but only reaches layer {}",
                            neighbor, node_id, layer, self.layers[nid]
                        ));
                    }
                }
            }
        }

        match self.entry_point {
            None if nc > 0 => return Err("missing entry point".into()),
            Some(ep) if ep as usize >= nc => {
                return Err(format!("entry_point {} >= node_count {}", ep, nc))
            }
            Some(ep) if self.layers[ep as usize] as usize != max_layer => {
                return Err(format!(
                    "entry_point {} is on layer {}, not the top layer {}",
                    ep, self.layers[ep as usize], max_layer
                ))
            }
            _ => {}
        }
        if nc > 0 && self.layers.iter().map(|&l| l as usize).max() != Some(max_layer) {
            return Err(format!("no node reaches declared max_layer {max_layer}"));
        }

        Ok(())
    }
}

/// Serializes an index into a checksummed artifact.
pub fn encode_index(index: &HnswIndex) -> Result<Vec<u8>> {
    let snapshot = GraphSnapshotRef {
        magic: GRAPH_MAGIC,
        version: GRAPH_FORMAT_VERSION,
        dimension: index.dimension() as u64,
        node_count: index.node_count,
        config: &index.config,
        entry_point: index.entry_point,
        max_layer: index.max_layer as u64,
        layers: &index.layers,
        neighbors: &index.neighbors,
    };
    let bytes = bincode::serialize(&snapshot).map_err(|e| io::Error::other(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);

    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(GRAPH_CRC_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());
    Ok(output)
}

/// Restores an index from an artifact produced by [`encode_index`].
///
/// `store` must hold the vectors the graph was built over.
pub fn decode_index(raw: &[u8], store: Arc<EmbeddingStore>) -> Result<HnswIndex> {
    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != GRAPH_CRC_MAGIC {
        return Err(Error::CorruptArtifact(
            "missing checksum footer (truncated file?)".into(),
        ));
    }
    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(Error::CorruptArtifact(format!(
            "CRC32 mismatch: expected {:#010x}, got {:#010x}",
            stored_crc, computed_crc
        )));
    }
    tracing::debug!("Graph CRC32 verified: {:#010x}", stored_crc);

    let snapshot: GraphSnapshot =
        bincode::deserialize(payload).map_err(|e| Error::CorruptArtifact(e.to_string()))?;
    snapshot.validate(&store).map_err(Error::CorruptArtifact)?;

    Ok(HnswIndex::from_parts(
        store,
        snapshot.config,
        snapshot.layers,
        snapshot.neighbors,
        snapshot.entry_point,
        snapshot.max_layer as usize,
    ))
}

/// Saves an index to `path` with an atomic write.
pub fn save_index(index: &HnswIndex, path: &Path) -> Result<()> {
    let bytes = encode_index(index)?;
    write_atomic(path, &bytes)?;
    tracing::info!(
        "Saved HNSW index to {:?} ({} nodes, {} bytes)",
        path,
        index.node_count,
        bytes.len()
    );
    Ok(())
}

/// Loads an index from `path` over the given embedding store.
pub fn load_index(path: &Path, store: Arc<EmbeddingStore>) -> Result<HnswIndex> {
    let raw = fs::read(path)?;
    let index = decode_index(&raw, store)?;
    tracing::info!(
        "Loaded HNSW index from {:?} ({} nodes, {} layers)",
        path,
        index.node_count,
        index.max_layer + 1
    );
    Ok(index)
}

impl HnswIndex {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_index(self)
    }

    pub fn from_bytes(raw: &[u8], store: Arc<EmbeddingStore>) -> Result<Self> {
        decode_index(raw, store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_index(self, path)
    }

    pub fn load(path: &Path, store: Arc<EmbeddingStore>) -> Result<Self> {
        load_index(path, store)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
/// The temp file is removed if any step fails.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path);
    let result = fs::write(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
