//! Billing discounts.

use serde::{Deserialize, Serialize};

/// Kind of discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Fraction of the discount scope (`0.2` = 20%).
    Percentage,
    /// Fixed dollar amount per segment, capped at the discount scope.
    Flat,
    /// Any type this engine does not know how to apply.
    #[default]
    #[serde(other)]
    Unsupported,
}

/// Discount options nested under `meta` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountMeta {
    /// Apply the discount to overage charges as well as the included cost.
    #[serde(default)]
    pub apply_to_add_ons: bool,
}

/// A discount attached to the organization's billing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountInfo {
    /// Whether the discount is active.
    #[serde(default)]
    pub applied: bool,

    /// Discount kind.
    #[serde(rename = "type", default)]
    pub kind: DiscountKind,

    /// Fraction for [`DiscountKind::Percentage`].
    #[serde(default)]
    pub percentage: f64,

    /// Dollar amount for [`DiscountKind::Flat`].
    #[serde(default)]
    pub flat_amount: f64,

    /// Scope options.
    #[serde(default)]
    pub meta: DiscountMeta,
}

impl DiscountInfo {
    /// An applied percentage discount on the included cost only.
    #[must_use]
    pub fn percentage(fraction: f64) -> Self {
        Self {
            applied: true,
            kind: DiscountKind::Percentage,
            percentage: fraction,
            flat_amount: 0.0,
            meta: DiscountMeta::default(),
        }
    }

    /// An applied flat discount on the included cost only.
    #[must_use]
    pub fn flat(amount: f64) -> Self {
        Self {
            applied: true,
            kind: DiscountKind::Flat,
            percentage: 0.0,
            flat_amount: amount,
            meta: DiscountMeta::default(),
        }
    }

    /// Extend the discount scope to overage charges.
    #[must_use]
    pub fn with_add_ons(mut self) -> Self {
        self.meta.apply_to_add_ons = true;
        self
    }

    /// Amount to subtract from a segment.
    ///
    /// `included_cost` and `total_cost` are the segment's included and total charges.
    /// Misconfigured values are clamped: the percentage to `[0, 1]` and the flat amount
    /// to non-negative, so the result always lies in `[0, scope]`.
    #[must_use]
    pub fn amount_off(&self, included_cost: f64, total_cost: f64) -> f64 {
        if !self.applied {
            return 0.0;
        }
        let scope = if self.meta.apply_to_add_ons {
            total_cost
        } else {
            included_cost
        };
        match self.kind {
            DiscountKind::Percentage => scope * self.percentage.clamp(0.0, 1.0),
            DiscountKind::Flat => self.flat_amount.max(0.0).min(scope),
            DiscountKind::Unsupported => 0.0,
        }
    }
}
