//! Plan pricing catalog.
//!
//! Pricing is an explicit table of [`PlanEntry`] records plus an explicit fallback used
//! for plan ids that are not in the table. The built-in table ships with the crate; a
//! catalog can also be loaded from JSON so that plan changes stay a reviewable diff.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// Minimum rate charged per million included responses, regardless of plan price.
pub const EFFECTIVE_INCLUDED_RATE_PER_MILLION: f64 = 2.0;

/// Pricing applied to plan ids missing from the table: no base fee, $2/M overage,
/// overages allowed. Newly introduced plans bill as usage-based until they are listed.
pub const DEFAULT_PLAN_PRICING: PlanPricing = PlanPricing {
    base_cost: 0.0,
    overage_per_million: 2.0,
    allows_overages: true,
};

/// Pricing parameters for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanPricing {
    /// Base monthly fee in dollars.
    pub base_cost: f64,

    /// Dollars per million responses beyond the monthly quota.
    pub overage_per_million: f64,

    /// Whether the plan bills usage beyond its quota at all.
    pub allows_overages: bool,
}

/// One row of the pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Plan identifier as reported by the subscription API.
    pub plan_id: i64,

    /// Pricing for the plan.
    #[serde(flatten)]
    pub pricing: PlanPricing,
}

impl PlanEntry {
    const fn new(
        plan_id: i64,
        base_cost: f64,
        overage_per_million: f64,
        allows_overages: bool,
    ) -> Self {
        Self {
            plan_id,
            pricing: PlanPricing {
                base_cost,
                overage_per_million,
                allows_overages,
            },
        }
    }
}

/// Built-in pricing table.
pub const BUILTIN_PLANS: &[PlanEntry] = &[
    PlanEntry::new(1, 0.0, 0.0, false), // Starter
    PlanEntry::new(2, 49.0, 5.0, true), // Developer
    PlanEntry::new(3, 299.0, 3.0, true), // Growth
    PlanEntry::new(4, 999.0, 2.0, true), // Scale
    PlanEntry::new(5, 0.0, 0.0, false), // Starter (legacy)
    PlanEntry::new(11, 0.0, 2.0, true),
    PlanEntry::new(21, 0.0, 2.0, true),
    PlanEntry::new(22, 0.0, 2.0, true),
    PlanEntry::new(23, 0.0, 2.0, true),
    PlanEntry::new(24, 386.0, 3.0, true),
    PlanEntry::new(25, 11_700.0, 0.78, true),
    PlanEntry::new(26, 0.0, 2.0, true),
    PlanEntry::new(27, 0.0, 2.0, true),
    PlanEntry::new(28, 0.0, 2.0, true),
    PlanEntry::new(29, 0.0, 2.0, true),
    PlanEntry::new(30, 0.0, 2.0, true),
    PlanEntry::new(31, 1800.0, 1.8, true),
    PlanEntry::new(90, 0.0, 0.0, false), // Internal
    PlanEntry::new(99, 0.0, 0.0, false),
];

/// Look up pricing for a plan in the built-in table.
#[must_use]
pub fn plan_pricing(plan_id: i64) -> PlanPricing {
    find(BUILTIN_PLANS, plan_id).unwrap_or(DEFAULT_PLAN_PRICING)
}

/// Whether a plan in the built-in table bills overages. Unknown plans do.
#[must_use]
pub fn plan_allows_overages(plan_id: i64) -> bool {
    plan_pricing(plan_id).allows_overages
}

fn find(plans: &[PlanEntry], plan_id: i64) -> Option<PlanPricing> {
    plans
        .iter()
        .find(|entry| entry.plan_id == plan_id)
        .map(|entry| entry.pricing)
}

/// A pricing table with its fallback policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPricingCatalog {
    /// Pricing used for plan ids not present in `plans`.
    #[serde(default = "default_fallback")]
    pub fallback: PlanPricing,

    /// Known plans.
    pub plans: Vec<PlanEntry>,
}

fn default_fallback() -> PlanPricing {
    DEFAULT_PLAN_PRICING
}

impl Default for PlanPricingCatalog {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_PLAN_PRICING,
            plans: BUILTIN_PLANS.to_vec(),
        }
    }
}

impl PlanPricingCatalog {
    /// Create a catalog from explicit entries and fallback.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Configuration`] if a plan id appears more than once.
    pub fn new(plans: Vec<PlanEntry>, fallback: PlanPricing) -> Result<Self> {
        let catalog = Self { fallback, plans };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from a JSON document.
    ///
    /// The document is `{"fallback": {...}, "plans": [{"plan_id": 2, "base_cost": 49, ...}]}`;
    /// `fallback` may be omitted and defaults to [`DEFAULT_PLAN_PRICING`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a plan id is duplicated.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BillingError::Configuration(format!(
                "cannot read pricing catalog {}: {e}",
                path.display()
            ))
        })?;
        let catalog = Self::from_json_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            plans = catalog.plans.len(),
            "Loaded pricing catalog"
        );
        Ok(catalog)
    }

    /// Pricing for a plan, or the fallback when the plan is unknown.
    #[must_use]
    pub fn lookup(&self, plan_id: i64) -> PlanPricing {
        find(&self.plans, plan_id).unwrap_or(self.fallback)
    }

    /// Whether the plan bills overages.
    #[must_use]
    pub fn allows_overages(&self, plan_id: i64) -> bool {
        self.lookup(plan_id).allows_overages
    }

    /// Whether the plan id is listed explicitly.
    #[must_use]
    pub fn contains(&self, plan_id: i64) -> bool {
        self.plans.iter().any(|entry| entry.plan_id == plan_id)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.plans.len());
        for entry in &self.plans {
            if !seen.insert(entry.plan_id) {
                return Err(BillingError::Configuration(format!(
                    "duplicate plan id {} in pricing catalog",
                    entry.plan_id
                )));
            }
        }
        Ok(())
    }
}
