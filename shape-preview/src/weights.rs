//! Weight curves for liquidity shapes
//!
//! Each family maps a bin distance `d` (1 = the bin next to the active bin)
//! to a non-negative weight. The allocation engine only sees the resulting
//! numbers, so adding a family never touches the apportionment logic.

use log::debug;

use crate::error::{PreviewError, Result};
use crate::types::{ShapeFamily, ShapeParams};

/// Default `edge_boost` for the gaussian-with-edge-boost family
pub const DEFAULT_EDGE_BOOST: f64 = 1.5;

/// Generate `bins` weights for a family given by name.
///
/// A zero bin count returns an empty sequence before the family name or
/// parameters are looked at.
pub fn generate_weights(family: &str, bins: i64, params: &ShapeParams) -> Result<Vec<f64>> {
    if bins < 0 {
        return Err(PreviewError::invalid("bins must be non-negative"));
    }
    if bins == 0 {
        return Ok(Vec::new());
    }

    generate_weights_for(family.parse()?, bins, params)
}

/// Generate `bins` weights for an already parsed family.
pub fn generate_weights_for(
    family: ShapeFamily,
    bins: i64,
    params: &ShapeParams,
) -> Result<Vec<f64>> {
    if bins < 0 {
        return Err(PreviewError::invalid("bins must be non-negative"));
    }
    if bins == 0 {
        return Ok(Vec::new());
    }

    for key in params.keys() {
        if !accepted_params(family).contains(&key.as_str()) {
            debug!("Ignoring parameter '{}' for {} shape", key, family);
        }
    }

    let distances = 1..=bins;
    let weights: Vec<f64> = match family {
        ShapeFamily::Flat => distances.map(|_| 1.0).collect(),

        ShapeFamily::Gaussian => {
            let sigma = optional(params, "sigma", default_sigma(bins));
            if !(sigma > 0.0) {
                return Err(PreviewError::invalid("gaussian sigma must be > 0"));
            }
            distances.map(|d| bell(d, sigma)).collect()
        }

        ShapeFamily::GaussianWithEdgeBoost => {
            let sigma = optional(params, "sigma", default_sigma(bins));
            let edge_boost = optional(params, "edge_boost", DEFAULT_EDGE_BOOST);
            if !(sigma > 0.0) {
                return Err(PreviewError::invalid(
                    "gaussian-with-edge-boost sigma must be > 0",
                ));
            }
            if !(edge_boost >= 1.0) {
                return Err(PreviewError::invalid(
                    "gaussian-with-edge-boost edge_boost must be >= 1",
                ));
            }
            distances
                .map(|d| 1.0 + edge_boost * (1.0 - bell(d, sigma)))
                .collect()
        }

        ShapeFamily::Exponential => {
            let ratio = required(params, family, "ratio")?;
            if !(ratio > 0.0) {
                return Err(PreviewError::invalid("exponential ratio must be > 0"));
            }
            distances.map(|d| ratio.powf(d as f64)).collect()
        }

        ShapeFamily::InversePower => {
            let p = required(params, family, "p")?;
            let c = optional(params, "c", 0.0);
            if !(p > 0.0) {
                return Err(PreviewError::invalid("inverse-power p must be > 0"));
            }
            if !(c >= 0.0) {
                return Err(PreviewError::invalid("inverse-power c must be >= 0"));
            }
            distances.map(|d| 1.0 / (d as f64 + c).powf(p)).collect()
        }

        ShapeFamily::WallThenDecay => {
            let ratio = required(params, family, "ratio")?;
            // Fractional wall widths are cut down to whole bins.
            let wall_bins = optional(params, "wall_bins", 0.0).trunc();
            if !(ratio > 0.0) {
                return Err(PreviewError::invalid("wall-then-decay ratio must be > 0"));
            }
            if !(wall_bins >= 0.0) {
                return Err(PreviewError::invalid(
                    "wall-then-decay wall_bins must be >= 0",
                ));
            }
            if !wall_bins.is_finite() {
                return Err(PreviewError::invalid(
                    "wall-then-decay wall_bins must be finite",
                ));
            }
            distances
                .map(|d| {
                    let d = d as f64;
                    if d <= wall_bins {
                        1.0
                    } else {
                        ratio.powf(d - wall_bins)
                    }
                })
                .collect()
        }
    };

    debug!("Generated {} {} weights", weights.len(), family);
    Ok(weights)
}

/// Parameter names each family reads
pub fn accepted_params(family: ShapeFamily) -> &'static [&'static str] {
    match family {
        ShapeFamily::Flat => &[],
        ShapeFamily::Gaussian => &["sigma"],
        ShapeFamily::GaussianWithEdgeBoost => &["sigma", "edge_boost"],
        ShapeFamily::Exponential => &["ratio"],
        ShapeFamily::InversePower => &["p", "c"],
        ShapeFamily::WallThenDecay => &["ratio", "wall_bins"],
    }
}

fn default_sigma(bins: i64) -> f64 {
    if bins == 0 {
        1.0
    } else {
        bins as f64 / 2.0
    }
}

fn bell(d: i64, sigma: f64) -> f64 {
    let x = (d - 1) as f64;
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}

fn optional(params: &ShapeParams, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

fn required(params: &ShapeParams, family: ShapeFamily, key: &str) -> Result<f64> {
    params
        .get(key)
        .copied()
        .ok_or_else(|| PreviewError::invalid(format!("{} {} is required", family, key)))
}
