//! Pallet count and declared weight from total coverage.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::PalletRules;
use crate::error::MappingError;
use crate::models::{PalletType, PalletUnit};

/// Fraction of a pallet above which a part load goes on a full pallet
pub const ROUND_UP_FRACTION: Decimal = Decimal::from_parts(6, 0, 0, false, 1);

/// Loads up to this fraction of a pallet fit on a half pallet
pub const HALF_PALLET_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalletPlan {
    pub full: u32,
    pub half: u32,
    pub weight_kg: u32,
}

impl PalletPlan {
    /// Each half pallet still takes a whole space
    pub fn spaces(&self) -> u32 {
        self.full.saturating_add(self.half)
    }

    /// Pallet declarations with zero-count types omitted
    pub fn units(&self) -> Vec<PalletUnit> {
        [(PalletType::Full, self.full), (PalletType::Half, self.half)]
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(pallet_type, count)| PalletUnit { pallet_type, count })
            .collect()
    }
}

/// Splits `coverage_m2` into full and half pallets.
///
/// - up to half a pallet: one half pallet
/// - under one pallet: one full pallet
/// - otherwise: whole pallets, plus one more when the remainder is at
///   least [`ROUND_UP_FRACTION`], or a half pallet for a smaller remainder
///
/// Fails with [`MappingError::LoadTooLarge`] when the pallet count or the
/// weight in kilograms does not fit the manifest fields.
pub fn derive(coverage_m2: Decimal, rules: &PalletRules) -> Result<PalletPlan, MappingError> {
    let too_large = || MappingError::LoadTooLarge(coverage_m2.to_string());

    let ratio = coverage_m2.checked_div(rules.capacity_m2).ok_or_else(too_large)?;
    let whole = ratio.floor();
    let fraction = ratio - whole;
    let whole = whole.to_u64().ok_or_else(too_large)?;

    let (full, half): (u64, u64) = if ratio <= HALF_PALLET_RATIO {
        (0, 1)
    } else if ratio < Decimal::ONE {
        (1, 0)
    } else if fraction >= ROUND_UP_FRACTION {
        (whole + 1, 0)
    } else if fraction > Decimal::ZERO {
        (whole, 1)
    } else {
        (whole, 0)
    };

    let weight_kg = full
        .checked_mul(u64::from(rules.full_weight_kg))
        .and_then(|w| w.checked_add(half * u64::from(rules.half_weight_kg)))
        .and_then(|w| u32::try_from(w).ok())
        .ok_or_else(too_large)?;

    Ok(PalletPlan {
        full: u32::try_from(full).map_err(|_| too_large())?,
        half: half as u32,
        weight_kg,
    })
}

/// Plan used when no line item yielded any coverage.
///
/// A single half pallet at the minimum declared weight, or the order's own
/// weight (grams) rounded up to whole kilograms when that is heavier.
pub fn fallback(order_weight_grams: Option<f64>, rules: &PalletRules) -> PalletPlan {
    let order_kg = order_weight_grams
        .filter(|g| g.is_finite() && *g > 0.0)
        .map(|g| (g / 1000.0).ceil() as u32)
        .unwrap_or(0);

    PalletPlan {
        full: 0,
        half: 1,
        weight_kg: order_kg.max(rules.min_declared_weight_kg),
    }
}
