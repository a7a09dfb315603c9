use crate::lru::CacheHit;

/// Hit/miss counters of a simulation run, `accesses == hits + misses`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    hit_count: u64,
    miss_count: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cache_hit: &CacheHit) {
        if cache_hit.is_hit() {
            self.hit_count += 1;
        } else {
            self.miss_count += 1;
        }
    }

    pub fn accesses(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    pub fn hits(&self) -> u64 {
        self.hit_count
    }

    pub fn misses(&self) -> u64 {
        self.miss_count
    }

    /// `hits / accesses` in `[0, 1]`, `0` when nothing was accessed.
    pub fn hit_rate(&self) -> f64 {
        Self::ratio(self.hit_count, self.accesses())
    }

    pub fn miss_rate(&self) -> f64 {
        Self::ratio(self.miss_count, self.accesses())
    }

    fn ratio(count: u64, accesses: u64) -> f64 {
        if accesses == 0 {
            0.0
        } else {
            count as f64 / accesses as f64
        }
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "References: {}\nHits: {}, Misses: {}\nPercent Hits: {:.2}%\nPercent Misses: {:.2}%",
            self.accesses(),
            self.hit_count,
            self.miss_count,
            100.0 * self.hit_rate(),
            100.0 * self.miss_rate()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HIT: CacheHit = CacheHit::Hit { bank: 0 };
    const MISS: CacheHit = CacheHit::Miss {
        bank: 0,
        evicted: None,
    };

    #[test]
    fn empty() {
        let stats = Stats::new();

        assert_eq!(stats.accesses(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
    }

    #[test]
    fn counts_and_rates() {
        let mut stats = Stats::new();
        for cache_hit in [MISS, MISS, HIT, MISS] {
            stats.record(&cache_hit);
        }

        assert_eq!(stats.accesses(), 4);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 3);
        assert_eq!(stats.hit_rate(), 0.25);
        assert_eq!(stats.miss_rate(), 0.75);
    }

    #[test]
    fn hit_rate_is_not_truncated() {
        let mut stats = Stats::new();
        stats.record(&HIT);
        stats.record(&HIT);
        stats.record(&MISS);

        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!(stats.to_string().contains("Percent Hits: 66.67%"));
    }

    #[test]
    fn evicting_miss_counts_as_miss() {
        let mut stats = Stats::new();
        stats.record(&CacheHit::Miss {
            bank: 3,
            evicted: Some(0xAB),
        });

        assert_eq!((stats.hits(), stats.misses()), (0, 1));
    }

    #[test]
    fn report() {
        let mut stats = Stats::new();
        for cache_hit in [HIT, MISS, MISS, HIT] {
            stats.record(&cache_hit);
        }

        assert_eq!(
            stats.to_string(),
            "References: 4\nHits: 2, Misses: 2\nPercent Hits: 50.00%\nPercent Misses: 50.00%"
        );
    }
}
