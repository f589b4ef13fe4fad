//! Pure label builders.
//!
//! One function per kind, deterministic and total: given identical record
//! contents the output is byte-identical, and there is no failure path.
//! Remote plan-name resolution lives in the lookup adapter; everything
//! here works from data already in hand.

use crate::record::{CustomerRecord, ProductRecord, SubscriptionRecord};

/// Separator between a subscription's plan label and customer display,
/// and between a product name and its price block.
const LABEL_SEPARATOR: &str = " \u{2013} ";

/// Placeholder when a customer record carries no identifying data at all.
const UNKNOWN_CUSTOMER: &str = "Unknown customer";

/// Placeholder when a subscription label has neither plan nor customer.
const UNKNOWN_SUBSCRIPTION: &str = "Stripe subscription";

/// Options for subscription labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelOptions {
    /// Append a trailing `[id | status]` metadata block.
    ///
    /// Off by default; the metadata block is kept as a documented toggle
    /// rather than standard output.
    pub include_meta: bool,
}

/// Display precedence for customer identity: "name (email)", then name,
/// then email, then the id, then a fixed placeholder.
#[must_use]
pub fn customer_label(record: &CustomerRecord) -> String {
    let name = record.name.trim();
    let email = record.email.trim();

    match (name.is_empty(), email.is_empty()) {
        (false, false) => format!("{name} ({email})"),
        (false, true) => name.to_string(),
        (true, false) => email.to_string(),
        (true, true) => {
            if record.id.is_empty() {
                UNKNOWN_CUSTOMER.to_string()
            } else {
                record.id.clone()
            }
        }
    }
}

/// Same precedence as [`customer_label`] but falls through to an empty
/// string, for use as one operand of a subscription label.
#[must_use]
pub fn customer_display(name: &str, email: &str, customer_id: &str) -> String {
    let name = name.trim();
    let email = email.trim();
    let customer_id = customer_id.trim();

    if !name.is_empty() && !email.is_empty() {
        return format!("{name} ({email})");
    }
    if !name.is_empty() {
        return name.to_string();
    }
    if !email.is_empty() {
        return email.to_string();
    }
    customer_id.to_string()
}

/// Product label: name and price block joined by an en dash, with an
/// `(inactive)` marker when the product is disabled.
///
/// Falls back to the bare id when neither name nor price is known; the
/// inactive marker is only appended when descriptive data exists, since
/// `active` defaults to false on id-only records.
#[must_use]
pub fn product_label(record: &ProductRecord) -> String {
    let name = record.name.trim();
    let price = price_block(
        &record.price_amount,
        &record.price_currency,
        &record.price_interval,
    );

    let mut parts: Vec<&str> = Vec::with_capacity(2);
    if !name.is_empty() {
        parts.push(name);
    }
    if !price.is_empty() {
        parts.push(&price);
    }

    if parts.is_empty() {
        return record.id.clone();
    }

    let mut label = parts.join(LABEL_SEPARATOR);
    if !record.active {
        label.push_str(" (inactive)");
    }
    label
}

/// Render `{CURRENCY}{amount:.2}/{interval}` from stored price fields.
///
/// Empty when no amount is known. Currency codes are uppercased and the
/// interval suffix is omitted when absent (one-time prices).
#[must_use]
pub fn price_block(amount: &str, currency: &str, interval: &str) -> String {
    let amount = amount.trim();
    if amount.is_empty() {
        return String::new();
    }

    let formatted = match amount.parse::<f64>() {
        Ok(value) => format!("{value:.2}"),
        Err(_) => amount.to_string(),
    };

    let mut block = format!("{}{}", currency.trim().to_uppercase(), formatted);
    let interval = interval.trim();
    if !interval.is_empty() {
        block.push('/');
        block.push_str(interval);
    }
    block
}

/// Combine a resolved plan label and customer display into the
/// subscription label, falling back to whichever side is non-empty and
/// finally to a fixed placeholder.
#[must_use]
pub fn subscription_label(
    plan_label: &str,
    customer_display: &str,
    status: &str,
    id: &str,
    options: LabelOptions,
) -> String {
    let plan_label = plan_label.trim();
    let customer_display = customer_display.trim();
    let status = status.trim();
    let id = id.trim();

    let mut label = match (plan_label.is_empty(), customer_display.is_empty()) {
        (false, false) => format!("{plan_label}{LABEL_SEPARATOR}{customer_display}"),
        (false, true) => plan_label.to_string(),
        (true, false) => customer_display.to_string(),
        (true, true) => String::new(),
    };

    if label.is_empty() {
        label = UNKNOWN_SUBSCRIPTION.to_string();
    }

    if options.include_meta {
        let mut meta: Vec<&str> = Vec::with_capacity(2);
        if !id.is_empty() {
            meta.push(id);
        }
        if !status.is_empty() {
            meta.push(status);
        }
        if !meta.is_empty() {
            label.push_str(&format!(" [{}]", meta.join(" | ")));
        }
    }

    label
}

/// Label for a subscription record without remote plan resolution: the
/// raw plan string stands in for the resolved plan label.
#[must_use]
pub fn subscription_record_label(record: &SubscriptionRecord) -> String {
    let display = customer_display(
        &record.customer_name,
        &record.customer_email,
        &record.customer_id,
    );
    subscription_label(
        &record.plan,
        &display,
        &record.status,
        &record.id,
        LabelOptions::default(),
    )
}
