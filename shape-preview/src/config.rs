//! Preview configuration from the environment, strategy files and flags
//!
//! Every source produces a [`PreviewOverrides`]; they are layered with
//! [`PreviewOverrides::or`] (flags over file over environment) and then
//! resolved into a [`PreviewConfig`] with the built-in defaults.

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::amounts::to_base_units;
use crate::types::{AllocationConstraints, ShapeFamily, ShapeParams, ShapeSpec};

/// Prefix shared by all environment variables read here
pub const ENV_PREFIX: &str = "PREVIEW_";

/// Partial settings for one side of the active bin
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SideOverrides {
    pub family: Option<String>,
    pub bins: Option<i64>,
    pub params: Option<ShapeParams>,
}

impl SideOverrides {
    fn or(self, fallback: SideOverrides) -> SideOverrides {
        // Parameters merge key by key so a flag can tweak one value from a file.
        let params = match (self.params, fallback.params) {
            (Some(top), Some(mut base)) => {
                base.extend(top);
                Some(base)
            }
            (top, base) => top.or(base),
        };

        SideOverrides {
            family: self.family.or(fallback.family),
            bins: self.bins.or(fallback.bins),
            params,
        }
    }

    fn resolve(self) -> Result<ShapeSpec> {
        let family = match self.family {
            Some(name) => ShapeFamily::from_str(&name)?,
            None => ShapeFamily::Flat,
        };

        Ok(ShapeSpec::new(
            family,
            self.bins.unwrap_or(0),
            self.params.unwrap_or_default(),
        ))
    }
}

/// Partial preview settings as read from one configuration source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewOverrides {
    /// Deposit in UI units, converted with `decimals`
    pub total_amount: Option<Decimal>,
    pub decimals: Option<u8>,
    pub min_per_bin: Option<i64>,
    pub max_bins: Option<usize>,
    #[serde(default)]
    pub left: SideOverrides,
    #[serde(default)]
    pub right: SideOverrides,
}

impl PreviewOverrides {
    /// Read `PREVIEW_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `PREVIEW_*` variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        Ok(Self {
            total_amount: parse_var(&var, "TOTAL_AMOUNT")?,
            decimals: parse_var(&var, "DECIMALS")?,
            min_per_bin: parse_var(&var, "MIN_PER_BIN")?,
            max_bins: parse_var(&var, "MAX_BINS")?,
            left: side_from_lookup(&var, "LEFT")?,
            right: side_from_lookup(&var, "RIGHT")?,
        })
    }

    /// Load a TOML strategy file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read strategy file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid strategy file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Layer `self` over `fallback`: values set here win.
    pub fn or(self, fallback: PreviewOverrides) -> PreviewOverrides {
        PreviewOverrides {
            total_amount: self.total_amount.or(fallback.total_amount),
            decimals: self.decimals.or(fallback.decimals),
            min_per_bin: self.min_per_bin.or(fallback.min_per_bin),
            max_bins: self.max_bins.or(fallback.max_bins),
            left: self.left.or(fallback.left),
            right: self.right.or(fallback.right),
        }
    }

    /// Fill in defaults and convert the deposit to base units.
    pub fn resolve(self) -> Result<PreviewConfig> {
        let ui_amount = self.total_amount.ok_or_else(|| {
            anyhow!(
                "total amount is required (--amount, strategy file or {}TOTAL_AMOUNT)",
                ENV_PREFIX
            )
        })?;
        let decimals = self.decimals.unwrap_or(0);
        let total_amount = to_base_units(ui_amount, decimals)?;

        Ok(PreviewConfig {
            ui_amount,
            decimals,
            total_amount,
            constraints: AllocationConstraints::new(self.min_per_bin.unwrap_or(0), self.max_bins),
            left: self.left.resolve()?,
            right: self.right.resolve()?,
        })
    }
}

/// Fully resolved inputs for the composed preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewConfig {
    pub ui_amount: Decimal,
    pub decimals: u8,
    /// Deposit in base units
    pub total_amount: i64,
    pub constraints: AllocationConstraints,
    pub left: ShapeSpec,
    pub right: ShapeSpec,
}

/// Parse a `key=value` shape parameter.
pub fn parse_param(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{}'", s));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{}': {}", key, e))?;
    Ok((key.to_string(), value))
}

/// Parse a comma separated list such as `sigma=6,edge_boost=1.5`.
pub fn parse_param_list(s: &str) -> std::result::Result<ShapeParams, String> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_param)
        .collect()
}

fn parse_var<T, F>(var: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Invalid {}{}='{}': {}", ENV_PREFIX, name, raw, e))
        })
        .transpose()
}

fn side_from_lookup<F>(var: &F, side: &str) -> Result<SideOverrides>
where
    F: Fn(&str) -> Option<String>,
{
    let params = var(&format!("{}_PARAMS", side))
        .map(|raw| {
            parse_param_list(&raw)
                .map_err(|e| anyhow!("Invalid {}{}_PARAMS: {}", ENV_PREFIX, side, e))
        })
        .transpose()?;

    Ok(SideOverrides {
        family: var(&format!("{}_FAMILY", side)),
        bins: parse_var(var, &format!("{}_BINS", side))?,
        params,
    })
}
