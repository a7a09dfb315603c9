//! Cache geometry resolution and address decoding.

pub const KIB: usize = 1024;

pub const DEFAULT_SIZE: usize = 32 * KIB;
pub const DEFAULT_ASSOCIATIVITY: usize = 8;
pub const DEFAULT_LINE_SIZE: usize = 64;
pub const DEFAULT_LEVELS: usize = 1;

/// Width of a trace address in bits.
pub const ADDRESS_BITS: u32 = u32::BITS;

/// User supplied geometry values, unset fields fall back to the defaults.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GeometryParams {
    /// total cache size in bytes
    pub size: Option<usize>,
    /// number of banks (ways) per set
    pub associativity: Option<usize>,
    /// bytes per cache-line
    pub line_size: Option<usize>,
    /// number of cache levels, carried for display only
    pub levels: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeometryField {
    Size,
    Associativity,
    LineSize,
}

impl std::fmt::Display for GeometryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryField::Size => f.write_str("cache size"),
            GeometryField::Associativity => f.write_str("number of banks"),
            GeometryField::LineSize => f.write_str("line size"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidGeometry {
    NotPowerOfTwo {
        field: GeometryField,
        value: usize,
    },
    NoSets {
        size: usize,
        associativity: usize,
        line_size: usize,
    },
    NoLevels,
}

impl std::fmt::Display for InvalidGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidGeometry::NotPowerOfTwo { field, value } => {
                f.write_fmt(format_args!("{field} must be a power of two (got {value})"))
            }
            InvalidGeometry::NoSets {
                size,
                associativity,
                line_size,
            } => f.write_fmt(format_args!(
                "cache size {size}B is too small for {associativity} banks of {line_size}B lines"
            )),
            InvalidGeometry::NoLevels => f.write_str("number of cache levels must be at least 1"),
        }
    }
}

impl std::error::Error for InvalidGeometry {}

/// A validated cache layout. Immutable once resolved.
///
/// `size == associativity * sets_per_bank * line_size` always holds and the
/// three factors are powers of two.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheGeometry {
    size: usize,
    levels: usize,
    associativity: usize,
    line_size: usize,
    sets_per_bank: usize,
    offset_bits: u32,
    line_offset_bits: u32,
}

/// Tag and set index of an address under a given geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DecodedAddress {
    pub tag: u32,
    pub index: usize,
}

impl CacheGeometry {
    pub fn resolve(params: GeometryParams) -> Result<Self, InvalidGeometry> {
        fn power_of_two(field: GeometryField, value: usize) -> Result<usize, InvalidGeometry> {
            if value.is_power_of_two() {
                Ok(value)
            } else {
                Err(InvalidGeometry::NotPowerOfTwo { field, value })
            }
        }

        let size = power_of_two(GeometryField::Size, params.size.unwrap_or(DEFAULT_SIZE))?;
        let associativity = power_of_two(
            GeometryField::Associativity,
            params.associativity.unwrap_or(DEFAULT_ASSOCIATIVITY),
        )?;
        let line_size = power_of_two(
            GeometryField::LineSize,
            params.line_size.unwrap_or(DEFAULT_LINE_SIZE),
        )?;

        let levels = params.levels.unwrap_or(DEFAULT_LEVELS);
        if levels == 0 {
            return Err(InvalidGeometry::NoLevels);
        }

        // a product that does not fit into usize is necessarily larger than the size
        let sets_per_bank = associativity
            .checked_mul(line_size)
            .map_or(0, |bank_line_bytes| size / bank_line_bytes);
        if sets_per_bank < 1 {
            return Err(InvalidGeometry::NoSets {
                size,
                associativity,
                line_size,
            });
        }

        let geometry = Self {
            size,
            levels,
            associativity,
            line_size,
            sets_per_bank,
            offset_bits: sets_per_bank.trailing_zeros(),
            line_offset_bits: line_size.trailing_zeros(),
        };
        log::debug!("resolved cache geometry {geometry:?}");

        Ok(geometry)
    }

    /// Splits an address into `| tag | set index | line offset |`.
    ///
    /// Shifts past the address width leave no bits, so the corresponding
    /// field is zero.
    pub fn decode(&self, address: u32) -> DecodedAddress {
        let index = address.checked_shr(self.line_offset_bits).unwrap_or(0) as usize
            & (self.sets_per_bank - 1);
        let tag = address
            .checked_shr(self.line_offset_bits + self.offset_bits)
            .unwrap_or(0);

        DecodedAddress { tag, index }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn line_size(&self) -> usize {
        self.line_size
    }

    pub fn sets_per_bank(&self) -> usize {
        self.sets_per_bank
    }

    /// `log2(sets_per_bank)`, the number of set index bits.
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// `log2(line_size)`, the number of intra-line byte offset bits.
    pub fn line_offset_bits(&self) -> u32 {
        self.line_offset_bits
    }

    pub fn total_lines(&self) -> usize {
        self.associativity * self.sets_per_bank
    }

    pub fn tag_bits(&self) -> u32 {
        ADDRESS_BITS.saturating_sub(self.offset_bits + self.line_offset_bits)
    }
}

impl Default for CacheGeometry {
    fn default() -> Self {
        const SETS_PER_BANK: usize = DEFAULT_SIZE / (DEFAULT_ASSOCIATIVITY * DEFAULT_LINE_SIZE);

        Self {
            size: DEFAULT_SIZE,
            levels: DEFAULT_LEVELS,
            associativity: DEFAULT_ASSOCIATIVITY,
            line_size: DEFAULT_LINE_SIZE,
            sets_per_bank: SETS_PER_BANK,
            offset_bits: SETS_PER_BANK.trailing_zeros(),
            line_offset_bits: DEFAULT_LINE_SIZE.trailing_zeros(),
        }
    }
}

impl std::fmt::Display for CacheGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total_size = if self.size >= KIB {
            format!("{}KiB", self.size / KIB)
        } else {
            format!("{}B", self.size)
        };

        let info = [
            String::from("Cache Geometry:"),
            format!("\tTotal Size: {total_size}"),
            format!("\tCache Levels: {}", self.levels),
            format!("\tBanks (Ways): {}", self.associativity),
            format!("\tLines per Bank: {}", self.sets_per_bank),
            format!("\tLine-Size: {}B", self.line_size),
            format!("\tOffset Bits: {}", self.offset_bits),
            format!(
                "\t| {} tag bits | {} set bits | {} offset bits |",
                self.tag_bits(),
                self.offset_bits.min(ADDRESS_BITS),
                self.line_offset_bits.min(ADDRESS_BITS),
            ),
        ];

        f.write_str(&info.join("\n"))
    }
}
