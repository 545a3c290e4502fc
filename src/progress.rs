//! Aggregate download progress across an asset batch.
//!
//! The denominator is fixed when a batch begins: the sum of every asset's
//! expected size. Loaders report whatever they like; reported bytes are
//! rescaled onto each asset's expected size and capped there, so the
//! aggregate is monotonic and finishing every asset (success or failure)
//! lands it at exactly 100.

use rustc_hash::FxHashMap;

use crate::api::AssetId;

#[derive(Debug, Clone, Copy)]
struct AssetProgress {
    expected: u64,
    loaded: u64,
    done: bool,
}

/// Converts per-asset byte events into one monotonic percentage.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    total_expected: u64,
    total_loaded: u64,
    assets: FxHashMap<AssetId, AssetProgress>,
}

impl ProgressAggregator {
    /// Aggregator with no batch. `percent()` reads 0 until [`Self::begin`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the denominator for a new batch, resetting all prior state.
    /// Expected sizes below 1 are raised to 1 so every asset moves the
    /// aggregate at least once.
    pub fn begin<I>(&mut self, expected_sizes: I)
    where
        I: IntoIterator<Item = (AssetId, u64)>,
    {
        self.assets.clear();
        self.total_expected = 0;
        self.total_loaded = 0;
        for (id, expected) in expected_sizes {
            let expected = expected.max(1);
            self.total_expected += expected;
            let _ = self.assets.insert(
                id,
                AssetProgress {
                    expected,
                    loaded: 0,
                    done: false,
                },
            );
        }
    }

    /// Record a loader progress event for one asset.
    ///
    /// When the loader reports a total that differs from the expected
    /// size, loaded bytes are rescaled by `expected / total` so the
    /// batch denominator stays fixed. Contributions are capped at the
    /// expected size and only positive deltas apply, keeping the
    /// aggregate monotonic whatever the loader reports.
    pub fn record(&mut self, id: AssetId, loaded: u64, total: Option<u64>) {
        let Some(asset) = self.assets.get_mut(&id) else {
            return;
        };
        if asset.done {
            return;
        }
        let current = match total {
            Some(total) if total > 0 => {
                let scaled = (u128::from(loaded) * u128::from(asset.expected)
                    / u128::from(total)) as u64;
                scaled.min(asset.expected)
            }
            _ => loaded.min(asset.expected),
        };
        if current > asset.loaded {
            self.total_loaded += current - asset.loaded;
            asset.loaded = current;
        }
    }

    /// Force-credit any shortfall so the asset's contribution reaches its
    /// expected size exactly once. Idempotent; later `record` calls for
    /// the asset are ignored.
    pub fn finish(&mut self, id: AssetId) {
        let Some(asset) = self.assets.get_mut(&id) else {
            return;
        };
        if asset.done {
            return;
        }
        asset.done = true;
        self.total_loaded += asset.expected - asset.loaded;
        asset.loaded = asset.expected;
    }

    /// Aggregate percentage in `[0, 100]`; 0 for an empty batch.
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total_expected == 0 {
            return 0.0;
        }
        (self.total_loaded as f64 / self.total_expected as f64 * 100.0) as f32
    }

    /// Whether every asset in the batch has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assets.values().all(|a| a.done)
    }

    /// Bytes credited so far.
    #[must_use]
    pub fn loaded_bytes(&self) -> u64 {
        self.total_loaded
    }

    /// The fixed batch denominator.
    #[must_use]
    pub fn expected_bytes(&self) -> u64 {
        self.total_expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_reads_zero() {
        let progress = ProgressAggregator::new();
        assert_eq!(progress.percent(), 0.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn accurate_loader_reaches_exactly_100() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 600), (2, 400)]);
        progress.record(1, 300, Some(600));
        assert_eq!(progress.loaded_bytes(), 300);
        progress.record(1, 600, Some(600));
        progress.finish(1);
        progress.record(2, 400, Some(400));
        progress.finish(2);
        assert_eq!(progress.percent(), 100.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn monotonic_under_inconsistent_totals() {
        let mut progress = ProgressAggregator::new();
        // Expected 1000 but the loader reports a 4000-byte total: events
        // get rescaled by 1/4 and the denominator never moves.
        progress.begin([(1, 1000)]);
        let mut last = 0.0;
        for reported in [1000u64, 2000, 500, 4000, 9000] {
            progress.record(1, reported, Some(4000));
            let now = progress.percent();
            assert!(now >= last, "regressed from {last} to {now}");
            last = now;
        }
        // 9000/4000 rescaled and capped at the expected 1000.
        assert_eq!(progress.loaded_bytes(), 1000);
        progress.finish(1);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn unknown_total_caps_at_expected() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 100)]);
        progress.record(1, 250, None);
        assert_eq!(progress.loaded_bytes(), 100);
    }

    #[test]
    fn finish_credits_silent_loaders() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 700), (2, 300)]);
        // Asset 1 never fires a progress event (or fails outright).
        progress.finish(1);
        assert_eq!(progress.loaded_bytes(), 700);
        progress.record(2, 150, Some(300));
        progress.finish(2);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn finish_is_idempotent_and_seals_the_asset() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 500)]);
        progress.finish(1);
        progress.finish(1);
        // Late events after completion change nothing.
        progress.record(1, 500, Some(500));
        assert_eq!(progress.loaded_bytes(), 500);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn zero_expected_sizes_are_raised_to_one() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 0)]);
        assert_eq!(progress.expected_bytes(), 1);
        progress.finish(1);
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn unknown_asset_ids_are_ignored() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 100)]);
        progress.record(99, 50, Some(100));
        progress.finish(99);
        assert_eq!(progress.loaded_bytes(), 0);
    }

    #[test]
    fn begin_resets_prior_batch() {
        let mut progress = ProgressAggregator::new();
        progress.begin([(1, 100)]);
        progress.finish(1);
        assert_eq!(progress.percent(), 100.0);

        progress.begin([(2, 50)]);
        assert_eq!(progress.percent(), 0.0);
        assert_eq!(progress.expected_bytes(), 50);
        assert!(!progress.is_complete());
    }
}
