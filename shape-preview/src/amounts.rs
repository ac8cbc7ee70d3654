//! Conversion between UI token amounts and integer base units

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::error::{PreviewError, Result};

/// Largest mint decimals accepted for conversion
pub const MAX_DECIMALS: u8 = 18;

/// Convert a UI amount such as `1500.25` into base units for a mint with `decimals`.
///
/// Amounts that would lose precision are rejected rather than rounded.
pub fn to_base_units(ui_amount: Decimal, decimals: u8) -> Result<i64> {
    check_decimals(decimals)?;
    if ui_amount.is_sign_negative() && !ui_amount.is_zero() {
        return Err(PreviewError::invalid("amount must be non-negative"));
    }

    let normalized = ui_amount.normalize();
    if normalized.scale() > decimals as u32 {
        return Err(PreviewError::invalid(format!(
            "amount {} has more than {} decimal places",
            ui_amount, decimals
        )));
    }

    normalized
        .checked_mul(Decimal::from(10u64.pow(decimals as u32)))
        .and_then(|units| units.to_i64())
        .ok_or_else(|| PreviewError::invalid(format!("amount {} is too large", ui_amount)))
}

/// Convert base units back into a UI amount for display.
pub fn from_base_units(amount: u64, decimals: u8) -> Result<Decimal> {
    check_decimals(decimals)?;
    Ok(Decimal::from_i128_with_scale(amount as i128, decimals as u32))
}

fn check_decimals(decimals: u8) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(PreviewError::invalid(format!(
            "decimals must be <= {}",
            MAX_DECIMALS
        )));
    }
    Ok(())
}
