use crate::error::Error;
use crate::geometry::{CacheGeometry, GeometryParams};
use crate::lru::{AccessEvent, LruCache};
use crate::stats::Stats;

/// Replays addresses against an [`LruCache`] strictly in order, one access
/// at a time.
#[derive(Debug, Clone)]
pub struct Simulation {
    cache: LruCache,
    stats: Stats,
    last_access: Option<AccessEvent>,
}

impl Simulation {
    /// Resolves the geometry first, no lines are allocated for an invalid one.
    pub fn new(params: GeometryParams) -> Result<Self, Error> {
        let geometry = CacheGeometry::resolve(params)?;
        Ok(Self::with_cache(LruCache::new(geometry)?))
    }

    pub fn with_cache(cache: LruCache) -> Self {
        Self {
            cache,
            stats: Stats::new(),
            last_access: None,
        }
    }

    pub fn step(&mut self, address: u32) -> AccessEvent {
        let event = self.cache.get(address);
        self.stats.record(&event.outcome);
        self.last_access = Some(event);
        event
    }

    pub fn run(&mut self, addresses: impl IntoIterator<Item = u32>) -> Stats {
        self.run_with(addresses, |_| {})
    }

    /// Like [`Simulation::run`] but hands every access to `observer` right
    /// after it completed.
    pub fn run_with(
        &mut self,
        addresses: impl IntoIterator<Item = u32>,
        mut observer: impl FnMut(&AccessEvent),
    ) -> Stats {
        for address in addresses {
            let event = self.step(address);
            observer(&event);
        }

        log::debug!(
            "simulated {} accesses: {} hits, {} misses",
            self.stats.accesses(),
            self.stats.hits(),
            self.stats.misses()
        );
        self.stats
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn last_access(&self) -> Option<AccessEvent> {
        self.last_access
    }

    pub fn cache(&self) -> &LruCache {
        &self.cache
    }

    pub fn geometry(&self) -> &CacheGeometry {
        self.cache.geometry()
    }

    pub fn format_last_access(&self) -> String {
        let Some(event) = self.last_access else {
            return String::from("No accesses");
        };

        [
            format!("Access Counter: {}", event.timestamp),
            format!("Address: {:#010X}", event.address),
            format!("Address Tag: {:#X}", event.decoded.tag),
            format!("Address Index: {:#X}", event.decoded.index),
            format!("Current Bank: {}", event.outcome.bank()),
            format!("Outcome: {}", event.outcome),
        ]
        .join("\n")
    }

    /// Valid lines of the final grid, one per row.
    pub fn format_lines(&self) -> String {
        self.cache
            .state()
            .lines()
            .filter(|(_, _, line)| line.is_valid())
            .map(|(bank, index, line)| {
                format!(
                    "set {index:#06X} bank {bank:>3}: tag={:#X} last_used={}",
                    line.tag(),
                    line.last_used()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::InvalidGeometry;
    use crate::lru::CacheHit;
    use crate::trace::AddressTrace;

    fn two_way_single_set() -> Simulation {
        Simulation::new(GeometryParams {
            size: Some(128),
            associativity: Some(2),
            line_size: Some(64),
            levels: None,
        })
        .unwrap()
    }

    #[test]
    fn eviction_scenario() {
        let mut simulation = two_way_single_set();
        let stats = simulation.run([0x000, 0x040, 0x000, 0x080]);

        assert_eq!(stats.accesses(), 4);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 3);
        assert_eq!(stats.hit_rate(), 0.25);

        let last = simulation.last_access().unwrap();
        assert_eq!(last.timestamp, 4);
        assert_eq!(
            last.outcome,
            CacheHit::Miss {
                bank: 1,
                evicted: Some(1)
            }
        );
    }

    #[test]
    fn observer_sees_every_access_in_order() {
        let mut simulation = two_way_single_set();
        let mut timestamps = Vec::new();

        simulation.run_with([0x10, 0x20, 0x30], |event| timestamps.push(event.timestamp));

        assert_eq!(timestamps, [1, 2, 3]);
        assert_eq!(simulation.stats().hits(), 2);
    }

    #[test]
    fn runs_continue_across_calls() {
        let mut simulation = two_way_single_set();
        simulation.run([0x000]);
        let stats = simulation.run([0x000]);

        assert_eq!(stats.accesses(), 2);
        assert_eq!(stats.hits(), 1);
        assert_eq!(simulation.cache().clock(), 2);
    }

    #[test]
    fn empty_stream() {
        let mut simulation = Simulation::new(GeometryParams::default()).unwrap();
        let stats = simulation.run(AddressTrace::default());

        assert_eq!(stats, Stats::new());
        assert!(simulation.last_access().is_none());
        assert_eq!(simulation.format_last_access(), "No accesses");
        assert!(simulation.format_lines().is_empty());
    }

    #[test]
    fn invalid_geometry_is_reported() {
        let error = Simulation::new(GeometryParams {
            associativity: Some(3),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(
            error,
            Error::Geometry(InvalidGeometry::NotPowerOfTwo { value: 3, .. })
        ));
    }

    #[test]
    fn parsed_trace() {
        let trace = AddressTrace::try_from("0x1000\n0x1004\n0x2000\n0x1008\n").unwrap();
        let mut simulation = Simulation::new(GeometryParams::default()).unwrap();
        let stats = simulation.run(trace);

        assert_eq!((stats.hits(), stats.misses()), (2, 2));
        assert_eq!(simulation.cache().state().valid_lines(), 2);

        let lines = simulation.format_lines();
        assert_eq!(lines.lines().count(), 2);
        assert!(lines.contains("tag=0x1 last_used=4"));
    }
}
