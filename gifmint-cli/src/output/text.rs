//! Text output formatting with quota bars and colors.

use chrono::{DateTime, Local, Utc};
use gifmint_core::{
    CheckoutSession, GeneratedGif, GifRecord, Plan, ProfileView, SourceIssue, SubscriptionStatus,
    SubscriptionView, UserProfile, format_brl,
};
use std::collections::BTreeMap;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Quota bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Formats the full profile page.
    pub fn format_profile(&self, view: &ProfileView) -> String {
        let mut lines = vec![self.format_user(&view.user), String::new()];

        lines.push(self.format_subscription(&view.subscription));

        lines.push(String::new());
        lines.push(self.bold("Recent GIFs"));
        lines.push("─".repeat(40));
        lines.push(self.format_history(&view.history));

        if view.is_degraded() {
            lines.push(String::new());
            lines.push(self.format_issues(&view.issues));
        }

        lines.join("\n")
    }

    /// Formats the identity block.
    pub fn format_user(&self, user: &UserProfile) -> String {
        let mut lines = vec![self.bold(user.display_name()), "─".repeat(40)];

        lines.push(format!("Username: {}", user.username));
        if !user.email.is_empty() {
            lines.push(format!("Email:    {}", self.cyan(&user.email)));
        }
        if let Some(cellphone) = &user.cellphone {
            lines.push(format!("Phone:    {cellphone}"));
        }
        if let Some(tax_id) = &user.tax_id {
            lines.push(format!("CPF:      {tax_id}"));
        }

        lines.join("\n")
    }

    /// Formats the sign-in confirmation.
    pub fn format_signed_in(&self, username: &str) -> String {
        format!("{} Signed in as {}", self.green("✓"), self.bold(username))
    }

    /// Formats field-level validation errors, one per line.
    pub fn format_field_errors(&self, errors: &BTreeMap<String, Vec<String>>) -> String {
        errors
            .iter()
            .map(|(field, messages)| format!("  {}: {}", self.bold(field), messages.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Formats the subscription block.
    pub fn format_subscription(&self, view: &SubscriptionView) -> String {
        let mut lines = vec![self.bold("Subscription"), "─".repeat(40)];

        lines.push(format!("Status:   {}", self.format_status(view.status)));

        if view.status == SubscriptionStatus::None {
            lines.push(self.dim("No active plan. Run `gifmint plans` to pick one."));
            return lines.join("\n");
        }

        if let Some(name) = &view.plan_name {
            let price = match (view.plan_price, view.plan_cycle) {
                (Some(price), Some(cycle)) => {
                    format!(" ({}/{})", format_brl(price), cycle.period_label())
                }
                (Some(price), None) => format!(" ({})", format_brl(price)),
                _ => String::new(),
            };
            lines.push(format!("Plan:     {}{}", self.blue(name), price));
        }

        if view.gif_limit > 0 {
            lines.push(format!("GIFs:     {}", self.format_quota(view)));
        }

        match view.status {
            SubscriptionStatus::Active if view.cancellation_requested => {
                if let Some(end) = view.end_date {
                    lines.push(format!(
                        "Ends:     {}",
                        self.yellow(&format_date(end))
                    ));
                }
                lines.push(self.yellow("Cancellation requested"));
            }
            SubscriptionStatus::Active => {
                if let Some(next) = view.next_billing_date {
                    lines.push(format!("Renews:   {}", self.dim(&format_date(next))));
                }
            }
            SubscriptionStatus::Canceled => {
                if let Some(end) = view.end_date {
                    lines.push(format!("Ended:    {}", self.dim(&format_date(end))));
                }
            }
            SubscriptionStatus::None => {}
        }

        lines.join("\n")
    }

    /// Formats the plan catalog, marking the caller's current plan.
    pub fn format_plans(&self, plans: &[Plan], current: Option<&SubscriptionView>) -> String {
        if plans.is_empty() {
            return self.dim("No plans available.");
        }

        let mut lines = vec![
            format!(
                "{:<4} {:<20} {}",
                self.bold("ID"),
                self.bold("Plan"),
                self.bold("Price")
            ),
            "─".repeat(50),
        ];

        for plan in plans {
            let is_current = current.is_some_and(|view| view.is_active() && view.is_plan(&plan.name));
            let marker = if is_current {
                format!(" {}", self.green("✓ current"))
            } else {
                String::new()
            };

            lines.push(format!(
                "{:<4} {:<20} {}{}",
                plan.id,
                plan.name,
                plan.price_label(),
                marker
            ));
            if !plan.description.is_empty() {
                lines.push(format!("     {}", self.dim(&plan.description)));
            }
        }

        lines.join("\n")
    }

    /// Formats the checkout redirect.
    pub fn format_checkout(&self, checkout: &CheckoutSession, waiting: bool) -> String {
        let next = if waiting {
            "Waiting for the payment to be confirmed..."
        } else {
            "Then run `gifmint confirm` to wait for the confirmation."
        };
        [
            self.bold("Checkout started"),
            format!("Complete the payment at: {}", self.cyan(&checkout.payment_url)),
            self.dim(next),
        ]
        .join("\n")
    }

    /// Formats the status label with a color per status.
    pub fn format_status(&self, status: SubscriptionStatus) -> String {
        match status {
            SubscriptionStatus::Active => self.green(status.label()),
            SubscriptionStatus::Canceled => self.red(status.label()),
            SubscriptionStatus::None => self.dim(status.label()),
        }
    }

    /// Formats generation usage as a bar of the remaining quota.
    pub fn format_quota(&self, view: &SubscriptionView) -> String {
        let remaining = view.remaining_gifs();
        let percent = f64::from(remaining) * 100.0 / f64::from(view.gif_limit.max(1));
        let label = format!("{remaining} of {} left", view.gif_limit);

        format!(
            "{} {}",
            self.quota_bar(percent),
            self.color_for_percent(percent, &label)
        )
    }

    /// Formats a bar for the remaining percentage.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn quota_bar(&self, percent_remaining: f64) -> String {
        let clamped = percent_remaining.clamp(0.0, 100.0);
        let filled = ((clamped / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(clamped, &bar)
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Formats a freshly generated GIF.
    pub fn format_generated(&self, gif: &GeneratedGif) -> String {
        format!("{} {}", self.green("✓ GIF ready:"), self.cyan(&gif.gif_url))
    }

    /// Formats the generation history.
    pub fn format_history(&self, history: &[GifRecord]) -> String {
        if history.is_empty() {
            return self.dim("No GIFs yet.");
        }

        history
            .iter()
            .map(|record| {
                let mut line = format!(
                    "{} {}",
                    self.dim(&format_date(record.created_at)),
                    record.prompt
                );
                if let Some(text) = record.overlay_text.as_deref().filter(|t| !t.is_empty()) {
                    line.push_str(&format!(" {}", self.dim(&format!("\"{text}\""))));
                }
                match &record.gif_url {
                    Some(url) => line.push_str(&format!("\n  {}", self.cyan(url))),
                    None => line.push_str(&format!("\n  {}", self.dim("(no file)"))),
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Degraded sources
    // ========================================================================

    /// Formats the list of degraded sources.
    pub fn format_issues(&self, issues: &[SourceIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                format!(
                    "{} {} unavailable: {}",
                    self.yellow("!"),
                    issue.source,
                    issue.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Formats a timestamp as a local `dd/mm/yyyy` date.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}
