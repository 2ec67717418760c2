use serde::Serialize;

use crate::domain::value_objects::enums::billing_intervals::BillingInterval;

/// Plan id of the tier that never goes through checkout.
pub const FREE_PLAN_ID: &str = "free";

/// A purchasable subscription tier. Prices are in minor currency units.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub price: i64,
    pub currency: &'static str,
    pub interval: BillingInterval,
    pub features: &'static [&'static str],
}

impl Plan {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

pub static PRICING_PLANS: &[Plan] = &[
    Plan {
        id: FREE_PLAN_ID,
        name: "Free",
        price: 0,
        currency: "USD",
        interval: BillingInterval::Month,
        features: &[
            "5 AI edits per month",
            "Basic filters and adjustments",
            "Standard resolution exports",
            "Community support",
        ],
    },
    Plan {
        id: "pro",
        name: "Pro",
        price: 999,
        currency: "USD",
        interval: BillingInterval::Month,
        features: &[
            "Unlimited AI edits",
            "Advanced AI filters and effects",
            "High-resolution exports",
            "Priority support",
            "Batch processing",
            "Custom presets",
        ],
    },
    Plan {
        id: "enterprise",
        name: "Enterprise",
        price: 4999,
        currency: "USD",
        interval: BillingInterval::Month,
        features: &[
            "Everything in Pro",
            "Team collaboration",
            "API access",
            "Custom integrations",
            "Dedicated support",
            "Advanced analytics",
            "Custom branding",
        ],
    },
];

pub fn find_plan(plan_id: &str) -> Option<&'static Plan> {
    PRICING_PLANS.iter().find(|plan| plan.id == plan_id)
}
