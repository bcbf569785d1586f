use bytes::Bytes;
use std::fmt;

/// A contiguous key range `[start, end)`. An `end` of `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub start: Bytes,
    pub end: Option<Bytes>,
}

impl CellRange {
    pub fn new(start: impl Into<Bytes>, end: Option<Bytes>) -> Self {
        Self {
            start: start.into(),
            end,
        }
    }

    /// The range covering every key.
    pub fn full() -> Self {
        Self::new(Bytes::new(), None)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= &self.start[..] && self.end.as_ref().map_or(true, |end| key < &end[..])
    }

    /// Splits the keyspace into `count` ranges by the first key byte.
    ///
    /// Ranges are returned in key order, are contiguous, and together cover
    /// every key. `count` is clamped to `1..=256`.
    pub fn split_keyspace(count: usize) -> Vec<CellRange> {
        let count = count.clamp(1, 256);
        let bounds: Vec<Bytes> = (1..count)
            .map(|i| Bytes::from(vec![(i * 256 / count) as u8]))
            .collect();

        let mut ranges = Vec::with_capacity(count);
        let mut start = Bytes::new();
        for bound in bounds {
            ranges.push(CellRange::new(start, Some(bound.clone())));
            start = bound;
        }
        ranges.push(CellRange::new(start, None));
        ranges
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, ", self.start)?;
        match &self.end {
            Some(end) => write!(f, "{:?})", end),
            None => write!(f, "+inf)"),
        }
    }
}
