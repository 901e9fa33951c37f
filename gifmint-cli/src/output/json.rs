//! JSON output formatting.

use anyhow::Result;
use gifmint_core::{CheckoutSession, Plan, SubscriptionView, format_brl};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one plan.
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub price: String,
    pub cycle: String,
    pub current: bool,
}

/// JSON output for the plan catalog.
#[derive(Debug, Serialize)]
pub struct PlansOutput {
    pub plans: Vec<PlanOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
}

/// JSON output for session changes (login, register, logout).
#[derive(Debug, Serialize)]
pub struct SessionOutput {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// JSON output for a started checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutOutput<'a> {
    pub payment_url: &'a str,
    pub awaiting_confirmation: bool,
}

/// JSON output for a confirmation wait.
#[derive(Debug, Serialize)]
pub struct ConfirmationOutput {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    pub ticks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionView>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a started checkout; printed before any confirmation wait.
    pub fn format_checkout(&self, checkout: &CheckoutSession, waiting: bool) -> Result<String> {
        self.format(&CheckoutOutput {
            payment_url: &checkout.payment_url,
            awaiting_confirmation: waiting,
        })
    }

    /// Formats the plan catalog, marking the caller's current plan.
    pub fn format_plans(&self, plans: &[Plan], current: Option<&SubscriptionView>) -> Result<String> {
        let current_plan = current
            .filter(|view| view.is_active())
            .and_then(|view| view.plan_name.clone());

        let outputs = plans
            .iter()
            .map(|plan| PlanOutput {
                id: plan.id,
                name: plan.name.clone(),
                description: plan.description.clone(),
                price_cents: plan.price,
                price: format_brl(plan.price),
                cycle: plan.cycle.period_label().to_string(),
                current: current_plan.as_deref() == Some(plan.name.as_str()),
            })
            .collect();

        self.format(&PlansOutput {
            plans: outputs,
            current_plan,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_session_output_skips_missing_username() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format(&SessionOutput {
                signed_in: false,
                username: None,
            })
            .unwrap();
        assert_eq!(output, r#"{"signed_in":false}"#);
    }
}
