use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Draws piece kinds independently and uniformly.
///
/// There is no bag: every draw is a fresh uniform pick over the seven kinds,
/// so long droughts of one kind are possible.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceGenerator, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut a = PieceGenerator::with_seed(seed);
/// let mut b = PieceGenerator::with_seed(seed);
/// assert_eq!(a.seed(), seed);
/// assert_eq!(a.next_kind(), b.next_kind());
/// ```
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    seed: PieceSeed,
    rng: Pcg32,
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 128-bit seed for a reproducible piece sequence.
///
/// Written as 32 hex digits, both by [`Display`](fmt::Display) and in
/// serialized form, so a seed can be copied out of a snapshot and parsed back:
///
/// ```
/// use blockfall_engine::PieceSeed;
///
/// let seed: PieceSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// assert_eq!(seed.to_string(), "000102030405060708090a0b0c0d0e0f");
/// assert!("xyz".parse::<PieceSeed>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseSeedError {
    #[display("invalid seed: expected 32 hex digits, got {len} characters")]
    WrongLength { len: usize },
    #[display("invalid seed: {text:?} is not hexadecimal")]
    NotHex { text: String },
}

impl PieceSeed {
    const HEX_LEN: usize = 32;

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(ParseSeedError::WrongLength { len: s.len() });
        }
        let not_hex = || ParseSeedError::NotHex { text: s.to_owned() };
        // `from_str_radix` alone would also accept a leading '+'.
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(not_hex());
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| not_hex())?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        PieceSeed(rng.random())
    }
}

impl PieceGenerator {
    /// Creates a generator seeded from the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            seed,
            rng: Pcg32::from_seed(seed.0),
        }
    }

    /// The seed this generator started from.
    #[must_use]
    pub const fn seed(&self) -> PieceSeed {
        self.seed
    }

    pub fn next_kind(&mut self) -> PieceKind {
        PieceKind::pick_random(&mut self.rng)
    }
}
