use crate::error::Error;
use crate::geometry::{CacheGeometry, DecodedAddress};

/// Metadata of a single cache-line.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheLine {
    valid: bool,
    tag: u32,
    last_used: u64,
}

impl CacheLine {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Access counter value of the most recent reference, `0` if never used.
    pub fn last_used(&self) -> u64 {
        self.last_used
    }
}

/// The line grid of a cache, `associativity` banks for each of the
/// `sets_per_bank` sets.
///
/// Lines of one set are stored next to each other so the replacement logic
/// can work on a single slice where the position is the bank number.
#[derive(Debug, Clone)]
pub struct CacheState {
    associativity: usize,
    sets_per_bank: usize,
    lines: Vec<CacheLine>,
}

impl CacheState {
    /// Allocates an all invalid grid. Allocation failure is reported before
    /// any line exists.
    pub fn new(geometry: &CacheGeometry) -> Result<Self, Error> {
        let mut lines = Vec::new();
        lines.try_reserve_exact(geometry.total_lines())?;
        lines.resize(geometry.total_lines(), CacheLine::default());

        Ok(Self {
            associativity: geometry.associativity(),
            sets_per_bank: geometry.sets_per_bank(),
            lines,
        })
    }

    pub fn reset(&mut self) {
        self.lines.fill(CacheLine::default());
    }

    pub fn sets_per_bank(&self) -> usize {
        self.sets_per_bank
    }

    pub fn line(&self, bank: usize, index: usize) -> Option<&CacheLine> {
        if bank >= self.associativity {
            return None;
        }
        self.set(index)?.get(bank)
    }

    /// All banks of the set at `index`, in bank order.
    pub fn set(&self, index: usize) -> Option<&[CacheLine]> {
        let start = self.set_start(index)?;
        self.lines.get(start..start + self.associativity)
    }

    fn set_mut(&mut self, index: usize) -> Option<&mut [CacheLine]> {
        let start = self.set_start(index)?;
        self.lines.get_mut(start..start + self.associativity)
    }

    fn set_start(&self, index: usize) -> Option<usize> {
        if index >= self.sets_per_bank {
            return None;
        }
        Some(index * self.associativity)
    }

    /// Iterates `(bank, index, line)` over the whole grid, set by set.
    pub fn lines(&self) -> impl Iterator<Item = (usize, usize, &CacheLine)> {
        self.lines
            .chunks_exact(self.associativity)
            .enumerate()
            .flat_map(|(index, set)| {
                set.iter()
                    .enumerate()
                    .map(move |(bank, line)| (bank, index, line))
            })
    }

    pub fn valid_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheHit {
    Hit { bank: usize },
    /// `evicted` holds the tag of the replaced line if a valid line had to go.
    Miss { bank: usize, evicted: Option<u32> },
}

impl CacheHit {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheHit::Hit { .. })
    }

    pub fn bank(&self) -> usize {
        match self {
            CacheHit::Hit { bank } | CacheHit::Miss { bank, .. } => *bank,
        }
    }
}

impl std::fmt::Display for CacheHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheHit::Hit { bank } => f.write_fmt(format_args!("Hit bank={bank}")),
            CacheHit::Miss { bank, evicted } => match evicted {
                Some(evicted) => f.write_fmt(format_args!("Miss bank={bank} evicted={evicted:#X}")),
                None => f.write_fmt(format_args!("Miss bank={bank}")),
            },
        }
    }
}

/// One processed address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub address: u32,
    pub decoded: DecodedAddress,
    pub timestamp: u64,
    pub outcome: CacheHit,
}

impl std::fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{:>6}: {:#010X} tag={:#X} index={:#X} ({})",
            self.timestamp, self.address, self.decoded.tag, self.decoded.index, self.outcome
        ))
    }
}

/// Set-associative cache with true LRU replacement.
///
/// A monotonic access counter serves as the timestamp: every `get` advances
/// it by one and the referenced line remembers the value it was last used at.
#[derive(Debug, Clone)]
pub struct LruCache {
    geometry: CacheGeometry,
    state: CacheState,
    clock: u64,
}

impl LruCache {
    pub fn new(geometry: CacheGeometry) -> Result<Self, Error> {
        Ok(Self {
            state: CacheState::new(&geometry)?,
            geometry,
            clock: 0,
        })
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.clock = 0;
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// Number of accesses processed so far, equal to the last timestamp.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn get(&mut self, address: u32) -> AccessEvent {
        self.clock += 1;
        let timestamp = self.clock;
        let decoded = self.geometry.decode(address);

        // decode masks the index to the number of sets
        let set = self
            .state
            .set_mut(decoded.index)
            .unwrap_or_else(|| unreachable!("set index {} out of range", decoded.index));
        let outcome = replace(set, decoded.tag, timestamp);

        if let CacheHit::Miss {
            bank,
            evicted: Some(evicted),
        } = outcome
        {
            log::debug!(
                "evicted tag {evicted:#X} from set {:#X} bank {bank} for tag {:#X}",
                decoded.index,
                decoded.tag
            );
        }
        log::trace!("access {timestamp}: {address:#010X} -> {outcome}");

        AccessEvent {
            address,
            decoded,
            timestamp,
            outcome,
        }
    }
}

/// Looks `tag` up in `set` and installs it on a miss.
///
/// Banks are always scanned in ascending order: the first matching valid line
/// is the hit, the first invalid line is filled before anything is evicted.
fn replace(set: &mut [CacheLine], tag: u32, timestamp: u64) -> CacheHit {
    if let Some((bank, line)) = set
        .iter_mut()
        .enumerate()
        .find(|(_, line)| line.valid && line.tag == tag)
    {
        line.last_used = timestamp;
        return CacheHit::Hit { bank };
    }

    let (bank, evicted) = match set.iter().position(|line| !line.valid) {
        Some(bank) => (bank, None),
        None => {
            let bank = least_recently_used(set);
            (bank, Some(set[bank].tag))
        }
    };

    set[bank] = CacheLine {
        valid: true,
        tag,
        last_used: timestamp,
    };

    CacheHit::Miss { bank, evicted }
}

/// Bank with the smallest `last_used`, the lowest bank wins ties.
fn least_recently_used(set: &[CacheLine]) -> usize {
    let mut oldest = 0;
    for (bank, line) in set.iter().enumerate().skip(1) {
        if line.last_used < set[oldest].last_used {
            oldest = bank;
        }
    }
    oldest
}
