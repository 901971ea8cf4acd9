//! Batch-size policy for parameter-limit overflow.
//!
//! A multi-row INSERT binds `rows * columns` parameters. When SQLite rejects
//! a statement for having too many of them, the batch size is halved and the
//! whole batch is retried. The policy is kept free of any database handle so
//! the halving sequence can be checked on its own.

use crate::utils::error::StoreError;

/// Halving policy seeded with the configured maximum batch size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    initial: usize,
}

impl BatchPolicy {
    /// Create a policy starting at `initial` rows per INSERT
    ///
    /// # Errors
    /// * `StoreError::InvalidBatchSize` - If `initial` is 0
    pub fn new(initial: usize) -> Result<Self, StoreError> {
        if initial == 0 {
            return Err(StoreError::InvalidBatchSize);
        }
        Ok(Self { initial })
    }

    /// Configured starting size
    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Size to retry with after `current` overflowed
    ///
    /// Returns `None` once halving reaches zero; the caller must give up.
    pub fn next_size(&self, current: usize) -> Option<usize> {
        let next = current / 2;
        (next > 0).then_some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rejected() {
        assert!(matches!(
            BatchPolicy::new(0),
            Err(StoreError::InvalidBatchSize)
        ));
    }

    #[test]
    fn test_halving_sequence() {
        let policy = BatchPolicy::new(777).unwrap();
        let mut sizes = vec![policy.initial()];
        while let Some(next) = policy.next_size(*sizes.last().unwrap()) {
            sizes.push(next);
        }
        assert_eq!(sizes, vec![777, 388, 194, 97, 48, 24, 12, 6, 3, 1]);
    }

    #[test]
    fn test_converges_under_any_ceiling() {
        // For every ceiling that fits one row, halving lands on a size
        // whose parameter count fits.
        for columns in 3..=5usize {
            for ceiling in [columns, 7, 100, 999, 32766] {
                if ceiling < columns {
                    continue;
                }
                for initial in [1usize, 2, 777, 10_000] {
                    let policy = BatchPolicy::new(initial).unwrap();
                    let mut size = initial;
                    while size * columns > ceiling {
                        size = policy
                            .next_size(size)
                            .expect("halving must reach a fitting size");
                    }
                    assert!(size >= 1);
                    assert!(size * columns <= ceiling);
                }
            }
        }
    }

    #[test]
    fn test_exhausts_when_one_row_does_not_fit() {
        let policy = BatchPolicy::new(8).unwrap();
        let columns = 5;
        let ceiling = 4;
        let mut size = 8;
        let mut exhausted = false;
        while size * columns > ceiling {
            match policy.next_size(size) {
                Some(next) => size = next,
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
        assert!(exhausted);
    }
}
