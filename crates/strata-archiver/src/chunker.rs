//! Content-defined chunking of file bodies.
//!
//! Wraps the streaming FastCDC chunker with the repository's parameters.
//! Boundaries depend only on local content, so identical regions of input
//! produce identical chunks regardless of insertions or deletions
//! elsewhere; that is what makes cross-snapshot deduplication work.

use std::io::{self, Read};

use bytes::Bytes;
use fastcdc::v2020::{Error as CdcError, StreamCDC};

use strata_core::ChunkerParams;

/// One content-defined chunk of a file body.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk content.
    pub data: Bytes,
}

impl Chunk {
    /// Length of the chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-length chunk (never produced by the stream).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A lazy, finite, non-restartable sequence of chunks over a byte stream.
///
/// Yields chunks in order; the concatenation of all chunk bytes equals the
/// input stream. The final chunk may be smaller than the minimum size. A
/// read error ends the sequence and is surfaced to the caller.
pub struct ChunkStream<R: Read> {
    inner: StreamCDC<R>,
}

impl<R: Read> ChunkStream<R> {
    /// Start chunking `source` with the repository's parameters.
    pub fn new(source: R, params: ChunkerParams) -> Self {
        Self {
            inner: StreamCDC::new(source, params.min_size, params.avg_size, params.max_size),
        }
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(chunk) => Some(Ok(Chunk {
                data: Bytes::from(chunk.data),
            })),
            Err(CdcError::IoError(err)) => Some(Err(err)),
            Err(other) => Some(Err(io::Error::new(io::ErrorKind::Other, other.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_core::Id;

    fn small_params() -> ChunkerParams {
        ChunkerParams {
            min_size: 2048,
            avg_size: 4096,
            max_size: 16384,
        }
    }

    // Deterministic byte generator so chunk boundaries are reproducible.
    fn pseudo_random(len: usize, mut seed: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            out.push((seed >> 33) as u8);
        }
        out
    }

    fn collect(data: &[u8], params: ChunkerParams) -> Vec<Chunk> {
        ChunkStream::new(data, params)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn chunks_reassemble_to_input() {
        let data = pseudo_random(200_000, 1);
        let chunks = collect(&data, small_params());
        assert!(chunks.len() > 1);

        let reassembled: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(reassembled, data);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = collect(&[], small_params());
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let data = b"well below the minimum chunk size";
        let chunks = collect(data, small_params());
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0].data[..], &data[..]);
    }

    #[test]
    fn boundaries_are_content_defined() {
        let data = pseudo_random(200_000, 2);
        let a = collect(&data, small_params());
        let b = collect(&data, small_params());
        let ids = |chunks: &[Chunk]| {
            chunks
                .iter()
                .map(|c| Id::hash(&c.data))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn leading_edit_preserves_most_chunks() {
        let original = pseudo_random(262_144, 3);
        let mut edited = b"prefix!".to_vec();
        edited.extend_from_slice(&original);

        let ids = |data: &[u8]| {
            collect(data, small_params())
                .iter()
                .map(|c| Id::hash(&c.data))
                .collect::<std::collections::HashSet<_>>()
        };
        let before = ids(&original);
        let after = ids(&edited);

        let shared = before.intersection(&after).count();
        assert!(
            shared * 2 > before.len(),
            "only {} of {} chunks survived a leading edit",
            shared,
            before.len()
        );
    }

    #[test]
    fn read_errors_surface() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "boom"))
            }
        }

        let mut stream = ChunkStream::new(FailingReader, small_params());
        let first = stream.next().expect("stream yields the error");
        assert!(first.is_err());
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble(data in prop::collection::vec(0u8..=255, 0..100_000)) {
            let chunks = collect(&data, small_params());
            let reassembled: Vec<u8> =
                chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
            prop_assert_eq!(reassembled, data);
        }
    }
}
