//! Ordered batch application.
//!
//! Items run strictly in input order, each in its own transaction, with no
//! reordering or deduplication. The first failure stops the batch; items
//! before it stay committed.

use super::ServiceError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Batch stopped at `index`; `committed` earlier items were applied.
#[derive(Debug)]
pub struct BulkError {
    pub index: usize,
    pub committed: usize,
    pub source: ServiceError,
}

impl Display for BulkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bulk item {} failed after {} committed: {}",
            self.index, self.committed, self.source
        )
    }
}

impl Error for BulkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Runs `apply` over `items` in order and collects each item's result.
pub fn reconcile<T, R, F>(kind: &'static str, items: &[T], mut apply: F) -> Result<Vec<R>, BulkError>
where
    F: FnMut(&T) -> Result<R, ServiceError>,
{
    let mut applied = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match apply(item) {
            Ok(result) => applied.push(result),
            Err(source) => {
                warn!(
                    "event=bulk_update module=service status=error kind={kind} index={index} committed={} error={source}",
                    applied.len()
                );
                return Err(BulkError {
                    index,
                    committed: applied.len(),
                    source,
                });
            }
        }
    }
    info!(
        "event=bulk_update module=service status=ok kind={kind} items={}",
        applied.len()
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_first_failure_and_reports_index() {
        let mut seen = Vec::new();
        let err = reconcile("test", &[1, 2, 3, 4], |value| {
            seen.push(*value);
            if *value == 3 {
                return Err(ServiceError::InvalidTitle);
            }
            Ok(*value * 10)
        })
        .unwrap_err();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(err.index, 2);
        assert_eq!(err.committed, 2);
        assert!(matches!(err.source, ServiceError::InvalidTitle));
    }

    #[test]
    fn empty_batch_is_ok() {
        let applied: Vec<i32> = reconcile("test", &[] as &[i32], |value| Ok(*value)).unwrap();
        assert!(applied.is_empty());
    }
}
