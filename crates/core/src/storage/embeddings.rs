//! Dense embedding store and its little-endian binary codec.
//!
//! Layout of an embedding artifact:
//!
//! ```text
//! offset 0:  i32 count (N)
//! offset 4:  i32 dimension (D)
//! offset 8:  N*D f32, row-major (vector i at [8 + i*D*4, 8 + (i+1)*D*4))
//! ```
//!
//! Vectors live in one contiguous arena, indexed by dense id in insertion order.

use crate::config::EMBEDDING_HEADER_BYTES;
use crate::error::{Error, Result};
use crate::storage::persistence::write_atomic;
use std::fs;
use std::path::Path;

/// Immutable-once-written collection of `len()` vectors of `dimension()` floats.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingStore {
    dimension: usize,
    count: usize,
    data: Vec<f32>,
}

impl EmbeddingStore {
    /// Creates an empty store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be at least 1".into()));
        }
        Ok(Self {
            dimension,
            count: 0,
            data: Vec::new(),
        })
    }

    /// Builds a store from a sequence of vectors that must all have `dimension` components.
    pub fn from_vectors<I, V>(dimension: usize, vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut store = Self::new(dimension)?;
        for v in vectors {
            store.push(v.as_ref())?;
        }
        Ok(store)
    }

    /// Appends a vector and returns its id.
    pub fn push(&mut self, vector: &[f32]) -> Result<u32> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let id = u32::try_from(self.count)
            .map_err(|_| Error::InvalidConfig("store is limited to u32::MAX vectors".into()))?;
        self.data.extend_from_slice(vector);
        self.count += 1;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the vector stored under `id`.
    pub fn get(&self, id: usize) -> Result<&[f32]> {
        if id >= self.count {
            return Err(Error::IdOutOfRange {
                id,
                len: self.count,
            });
        }
        Ok(self.vector(id as u32))
    }

    /// Unchecked slice into the arena for graph traversal. Callers guarantee `id < len()`.
    #[inline]
    pub(crate) fn vector(&self, id: u32) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Iterates vectors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension)
    }

    /// The whole row-major arena.
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Encodes the store into the binary artifact format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let count = i32::try_from(self.count).map_err(|_| {
            Error::InvalidHeader(format!("count {} does not fit in i32", self.count))
        })?;
        let dimension = i32::try_from(self.dimension).map_err(|_| {
            Error::InvalidHeader(format!("dimension {} does not fit in i32", self.dimension))
        })?;

        let mut out = Vec::with_capacity(EMBEDDING_HEADER_BYTES + self.data.len() * 4);
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&dimension.to_le_bytes());
        for &x in &self.data {
            out.extend_from_slice(&x.to_le_bytes());
        }
        Ok(out)
    }

    /// Decodes a binary artifact. Floats are restored bit-for-bit.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < EMBEDDING_HEADER_BYTES {
            return Err(Error::TruncatedFile {
                expected: EMBEDDING_HEADER_BYTES,
                actual: bytes.len(),
            });
        }
        let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let dimension = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if count < 0 {
            return Err(Error::InvalidHeader(format!("negative count {count}")));
        }
        if dimension <= 0 {
            return Err(Error::InvalidHeader(format!(
                "dimension must be positive, got {dimension}"
            )));
        }
        let (count, dimension) = (count as usize, dimension as usize);

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(EMBEDDING_HEADER_BYTES))
            .ok_or_else(|| {
                Error::InvalidHeader(format!("{count} x {dimension} overflows the address space"))
            })?;
        if bytes.len() != expected {
            return Err(Error::TruncatedFile {
                expected,
                actual: bytes.len(),
            });
        }

        let data: Vec<f32> = bytes[EMBEDDING_HEADER_BYTES..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            dimension,
            count,
            data,
        })
    }

    /// Writes the artifact to `path` atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;
        tracing::info!(
            "Saved {} embeddings (dim {}) to {:?} ({} bytes)",
            self.count,
            self.dimension,
            path,
            bytes.len()
        );
        Ok(())
    }

    /// Reads and decodes the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let store = Self::from_bytes(&bytes)?;
        tracing::info!(
            "Loaded {} embeddings (dim {}) from {:?}",
            store.count,
            store.dimension,
            path
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, -2.5, 3.25],
            vec![0.0, f32::MIN_POSITIVE, -0.0],
            vec![f32::MAX, f32::MIN, 1e-30],
        ]
    }

    #[test]
    fn test_round_trip_bit_exact() {
        let store = EmbeddingStore::from_vectors(3, sample()).unwrap();
        let bytes = store.to_bytes().unwrap();
        assert_eq!(bytes.len(), 8 + 3 * 3 * 4);

        let decoded = EmbeddingStore::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.dimension(), 3);
        for (a, b) in decoded.iter().zip(sample()) {
            let a_bits: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
            let b_bits: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_round_trip_empty() {
        let store = EmbeddingStore::new(7).unwrap();
        let decoded = EmbeddingStore::from_bytes(&store.to_bytes().unwrap()).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.dimension(), 7);
    }

    #[test]
    fn test_header_layout() {
        let store = EmbeddingStore::from_vectors(2, [[1.0f32, 2.0]]).unwrap();
        let bytes = store.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &2.0f32.to_le_bytes());
    }

    #[test]
    fn test_dimension_mismatch_on_write() {
        let err = EmbeddingStore::from_vectors(2, [vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            EmbeddingStore::new(0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let store = EmbeddingStore::from_vectors(3, sample()).unwrap();
        let bytes = store.to_bytes().unwrap();
        let err = EmbeddingStore::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::TruncatedFile { .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let store = EmbeddingStore::from_vectors(3, sample()).unwrap();
        let mut bytes = store.to_bytes().unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            EmbeddingStore::from_bytes(&bytes),
            Err(Error::TruncatedFile { .. })
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            EmbeddingStore::from_bytes(&[1, 0, 0]),
            Err(Error::TruncatedFile {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_invalid_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&4i32.to_le_bytes());
        assert!(matches!(
            EmbeddingStore::from_bytes(&bytes),
            Err(Error::InvalidHeader(_))
        ));

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            EmbeddingStore::from_bytes(&bytes),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_get_out_of_range() {
        let store = EmbeddingStore::from_vectors(3, sample()).unwrap();
        assert_eq!(store.get(1).unwrap(), sample()[1].as_slice());
        assert!(matches!(
            store.get(3),
            Err(Error::IdOutOfRange { id: 3, len: 3 })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe_embeddings.bin");
        let store = EmbeddingStore::from_vectors(3, sample()).unwrap();
        store.save(&path).unwrap();
        assert!(!dir.path().join("recipe_embeddings.bin.tmp").exists());
        assert_eq!(EmbeddingStore::load(&path).unwrap(), store);
    }
}
