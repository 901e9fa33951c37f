//! Plans, billing cycles, and checkout.

use serde::{Deserialize, Serialize};

// ============================================================================
// Plan Cycle
// ============================================================================

/// Billing cycle of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanCycle {
    /// Billed every month.
    #[default]
    Monthly,
    /// Billed every year.
    Yearly,
    /// A cycle this client does not know about.
    #[serde(other)]
    Unknown,
}

impl PlanCycle {
    /// Returns the period noun used after a price ("R$ 29,90/month").
    pub fn period_label(&self) -> &'static str {
        match self {
            Self::Monthly => "month",
            Self::Yearly => "year",
            Self::Unknown => "cycle",
        }
    }
}

impl std::fmt::Display for PlanCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Yearly => write!(f, "YEARLY"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A purchasable subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Backend plan ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Marketing description.
    #[serde(default)]
    pub description: String,
    /// Price in cents.
    pub price: i64,
    /// Billing cycle.
    #[serde(default)]
    pub cycle: PlanCycle,
}

impl Plan {
    /// Returns the formatted price with its period, e.g. `R$ 29,90/month`.
    pub fn price_label(&self) -> String {
        format!("{}/{}", format_brl(self.price), self.cycle.period_label())
    }
}

/// Body of the subscription creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// The plan to subscribe to.
    pub plan_id: u64,
}

/// Response of the subscription creation request.
///
/// The client is expected to send the user to `payment_url`; confirmation
/// arrives later, out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Address of the hosted payment page.
    pub payment_url: String,
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats an amount in cents as Brazilian reais (`R$ 1.299,90`).
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let digits = (abs / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}R$ {grouped},{:02}", abs % 100)
}
