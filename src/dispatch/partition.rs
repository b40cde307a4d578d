//! Splitting request lists into contiguous partitions.

use crate::dispatch::types::{DispatchError, DispatchResult};

/// Split `items` into contiguous chunks of at most `chunk_size` elements.
///
/// Order is preserved within and across chunks; only the last chunk may be
/// shorter. Empty input yields no chunks.
pub fn partition<T: Clone>(items: &[T], chunk_size: usize) -> DispatchResult<Vec<Vec<T>>> {
    if chunk_size == 0 {
        return Err(DispatchError::InvalidChunkSize(chunk_size));
    }
    Ok(items.chunks(chunk_size).map(<[T]>::to_vec).collect())
}

/// Chunk size that spreads `len` items over `workers` partitions:
/// `ceil(len / workers)`, never less than 1.
pub fn even_chunk_size(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

/// Partition `items` into at most `workers` chunks of near-equal size.
pub fn partition_evenly<T: Clone>(items: &[T], workers: usize) -> DispatchResult<Vec<Vec<T>>> {
    if workers == 0 {
        return Err(DispatchError::InvalidInput(
            "cannot partition across zero workers".to_string(),
        ));
    }
    partition(items, even_chunk_size(items.len(), workers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_examples() {
        let xs = ["a", "b", "c"];
        assert_eq!(partition(&xs, 2).unwrap(), vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(
            partition(&xs, 1).unwrap(),
            vec![vec!["a"], vec!["b"], vec!["c"]]
        );
        assert_eq!(partition(&xs, 5).unwrap(), vec![vec!["a", "b", "c"]]);
        assert!(partition::<u8>(&[], 3).unwrap().is_empty());
    }

    #[test]
    fn test_partition_properties() {
        for len in 0..25usize {
            let xs: Vec<usize> = (0..len).collect();
            for n in 1..9usize {
                let chunks = partition(&xs, n).unwrap();
                assert_eq!(chunks.len(), len.div_ceil(n), "len={len} n={n}");

                if let Some((last, init)) = chunks.split_last() {
                    assert!(init.iter().all(|c| c.len() == n));
                    assert!(!last.is_empty() && last.len() <= n);
                }

                let flat: Vec<usize> = chunks.into_iter().flatten().collect();
                assert_eq!(flat, xs);
            }
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = partition(&[1, 2, 3], 0).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidChunkSize(0)));
    }

    #[test]
    fn test_partition_evenly() {
        assert_eq!(even_chunk_size(10, 4), 3);
        assert_eq!(even_chunk_size(8, 4), 2);
        assert_eq!(even_chunk_size(0, 4), 1);
        assert_eq!(even_chunk_size(3, 8), 1);

        let xs: Vec<u32> = (0..10).collect();
        let chunks = partition_evenly(&xs, 4).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);

        assert!(partition_evenly(&xs, 0).is_err());
    }
}
