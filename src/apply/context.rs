use super::metrics::ApplyMetrics;

/// Per-entry accumulator handed to mutating command handlers.
///
/// The state machine creates one context per applied entry and folds its
/// metrics into the batch totals once the handler has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyContext {
    cell_id: u64,
    metrics: ApplyMetrics,
}

impl ApplyContext {
    pub fn new(cell_id: u64) -> Self {
        Self {
            cell_id,
            metrics: ApplyMetrics::default(),
        }
    }

    pub fn cell_id(&self) -> u64 {
        self.cell_id
    }

    pub fn metrics(&self) -> &ApplyMetrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut ApplyMetrics {
        &mut self.metrics
    }

    pub fn into_metrics(self) -> ApplyMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_zeroed() {
        let ctx = ApplyContext::new(7);
        assert_eq!(ctx.cell_id(), 7);
        assert!(ctx.metrics().is_zero());
    }

    #[test]
    fn test_into_metrics() {
        let mut ctx = ApplyContext::new(1);
        ctx.metrics_mut().record_new_key(2);
        assert_eq!(ctx.into_metrics().written_keys, 1);
    }
}
