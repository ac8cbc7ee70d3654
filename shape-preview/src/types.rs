//! Type definitions for liquidity shape previews

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

use crate::error::{PreviewError, Result};

/// Named parameters for a shape family, e.g. `sigma` or `ratio`.
pub type ShapeParams = BTreeMap<String, f64>;

/// Weight curves a strategy can use for one side of the active bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShapeFamily {
    /// Same weight in every bin
    Flat,
    /// Bell curve centred on the active bin
    Gaussian,
    /// Inverted bell: thin near the active bin, heavier towards the edge
    GaussianWithEdgeBoost,
    /// `ratio^d`, growing or decaying with distance
    Exponential,
    /// `1 / (d + c)^p`
    InversePower,
    /// Constant wall for `wall_bins` bins, then exponential decay
    WallThenDecay,
}

impl ShapeFamily {
    pub const ALL: [ShapeFamily; 6] = [
        ShapeFamily::Flat,
        ShapeFamily::Gaussian,
        ShapeFamily::GaussianWithEdgeBoost,
        ShapeFamily::Exponential,
        ShapeFamily::InversePower,
        ShapeFamily::WallThenDecay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeFamily::Flat => "flat",
            ShapeFamily::Gaussian => "gaussian",
            ShapeFamily::GaussianWithEdgeBoost => "gaussian-with-edge-boost",
            ShapeFamily::Exponential => "exponential",
            ShapeFamily::InversePower => "inverse-power",
            ShapeFamily::WallThenDecay => "wall-then-decay",
        }
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeFamily {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "flat" | "meteora-spot" => Ok(ShapeFamily::Flat),
            "gaussian" | "meteora-curve" => Ok(ShapeFamily::Gaussian),
            "gaussian-with-edge-boost" | "meteora-bidask" => Ok(ShapeFamily::GaussianWithEdgeBoost),
            "exponential" => Ok(ShapeFamily::Exponential),
            "inverse-power" | "power" => Ok(ShapeFamily::InversePower),
            "wall-then-decay" | "wall-decay" => Ok(ShapeFamily::WallThenDecay),
            _ => Err(PreviewError::invalid(format!("unknown shape family: {}", s))),
        }
    }
}

impl TryFrom<String> for ShapeFamily {
    type Error = PreviewError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ShapeFamily> for String {
    fn from(family: ShapeFamily) -> Self {
        family.as_str().to_string()
    }
}

/// One side of a strategy: which curve, how many bins, and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub family: ShapeFamily,
    pub bins: i64,
    #[serde(default)]
    pub params: ShapeParams,
}

impl ShapeSpec {
    pub fn new(family: ShapeFamily, bins: i64, params: ShapeParams) -> Self {
        Self { family, bins, params }
    }

    /// Build a spec from a family name as it appears in configuration.
    pub fn parse(family: &str, bins: i64, params: ShapeParams) -> Result<Self> {
        Ok(Self::new(family.parse()?, bins, params))
    }

    pub fn weights(&self) -> Result<Vec<f64>> {
        crate::weights::generate_weights_for(self.family, self.bins, &self.params)
    }
}

/// Advisory limits checked after allocation. They only add warnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConstraints {
    /// Smallest useful non-zero amount per bin
    #[serde(default)]
    pub min_per_bin: i64,
    /// Maximum number of bins the position may touch
    #[serde(default)]
    pub max_bins: Option<usize>,
}

impl AllocationConstraints {
    pub fn new(min_per_bin: i64, max_bins: Option<usize>) -> Self {
        Self { min_per_bin, max_bins }
    }
}

/// Integer amounts per bin for both sides of the active bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    /// Left-side amounts, index 0 nearest the active bin
    pub left: Vec<u64>,
    /// Right-side amounts, index 0 nearest the active bin
    pub right: Vec<u64>,
    pub total_allocated: u64,
    /// Requested total minus what was allocated
    pub remainder: u64,
    /// Bins with a strictly positive amount
    pub bins_touched: usize,
    pub warnings: Vec<String>,
}

impl AllocationResult {
    /// Left then right amounts, in the order the engine apportions them.
    pub fn allocations(&self) -> impl Iterator<Item = u64> + '_ {
        self.left.iter().chain(self.right.iter()).copied()
    }

    /// `(offset, amount)` pairs from the farthest left bin to the farthest right bin.
    ///
    /// The left bin at distance `d` sits at offset `-d`, the right bin at `+d`.
    pub fn by_offset(&self) -> Vec<(i64, u64)> {
        let left = self
            .left
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &amount)| (-(i as i64 + 1), amount));
        let right = self
            .right
            .iter()
            .enumerate()
            .map(|(i, &amount)| (i as i64 + 1, amount));
        left.chain(right).collect()
    }

    pub fn is_exact(&self) -> bool {
        self.remainder == 0
    }
}
