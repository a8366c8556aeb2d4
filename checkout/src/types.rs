//! Domain types for the storefront checkout.
//!
//! Identifiers, money, the ticket catalog snapshot and the order shapes
//! exchanged with the remote order service. Wire names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::InvalidId;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier as it may appear on the wire: text, or a bare JSON number
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Opaque to checkout: any non-blank text is accepted, and numeric ids
        /// from the order service are kept in their decimal form.
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Parse an identifier from its textual form
            ///
            /// Surrounding whitespace is ignored.
            ///
            /// # Errors
            ///
            /// Returns [`InvalidId`] if `raw` is blank.
            pub fn parse(raw: &str) -> Result<Self, InvalidId> {
                let raw = raw.trim();
                if raw.is_empty() {
                    Err(InvalidId)
                } else {
                    Ok(Self(raw.to_owned()))
                }
            }

            /// The identifier as sent on the wire
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match WireId::deserialize(deserializer)? {
                    WireId::Unsigned(id) => Ok(Self::from(id)),
                    WireId::Signed(id) => Ok(Self(id.to_string())),
                    WireId::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

opaque_id!(
    /// Identifier of an event
    EventId
);

opaque_id!(
    /// Identifier of a ticket type within an event
    TicketTypeId
);

opaque_id!(
    /// Identifier of an order, issued by the remote order service
    OrderId
);

// ============================================================================
// Money
// ============================================================================

/// Money amount in cents
///
/// Never negative. On the wire it is a decimal number of major units
/// (`40.0` is `$40.00`), accepted either as a JSON number or a string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars, saturating on overflow
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Creates a `Money` value from a decimal amount of major units
    ///
    /// Rounds to the nearest cent. Returns `None` for negative or non-finite input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_major_units(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        (cents.is_finite() && cents >= 0.0).then(|| Self(cents as u64))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in major units
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Adds two money amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// `self × quantity × factor`, rounded to the nearest cent
    ///
    /// Non-positive or non-finite results are zero.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn scaled(self, quantity: u32, factor: f64) -> Self {
        let raw = self.0 as f64 * f64::from(quantity) * factor;
        if raw.is_finite() && raw > 0.0 {
            Self(raw.round() as u64)
        } else {
            Self::ZERO
        }
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major_units())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        let amount = match Wire::deserialize(deserializer)? {
            Wire::Number(amount) => amount,
            Wire::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("invalid amount {text:?}: {e}")))?,
        };

        Self::from_major_units(amount)
            .ok_or_else(|| serde::de::Error::custom(format!("amount out of range: {amount}")))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A purchasable category of ticket within an event
///
/// Supplied by the external catalog; read-only to checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    /// Ticket type ID
    pub id: TicketTypeId,
    /// Display name, sent as the item title when ordering
    pub name: String,
    /// Price of one ticket
    pub unit_price: Money,
    /// Tickets still available at selection time
    pub available_count: u32,
}

// ============================================================================
// Orders
// ============================================================================

/// Payment status of an order, as reported by the order service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting the payment processor
    Pending,
    /// Paid
    Paid,
    /// Payment failed
    Failed,
    /// Payment cancelled
    Cancelled,
    /// Payment refunded
    Refunded,
}

impl PaymentStatus {
    /// Whether no further change is expected within a confirmation session
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method selected at checkout
///
/// Opaque to checkout; forwarded to the order service as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Create a payment method token
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self(method.into())
    }

    /// The token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of an order request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestItem {
    /// Ticket type being bought
    pub type_id: TicketTypeId,
    /// Number of tickets, always positive
    pub quantity: u32,
    /// Ticket type name at the time of ordering
    pub ticket_title: String,
}

/// Body of `POST /orders`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Event the tickets belong to
    pub event_id: EventId,
    /// Selected payment method
    pub payment_method: PaymentMethod,
    /// Positive-quantity lines only
    pub items: Vec<OrderRequestItem>,
    /// Promo code, omitted when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

/// A line of a server-side order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Ticket type bought
    pub type_id: TicketTypeId,
    /// Number of tickets
    pub quantity: u32,
    /// Ticket type name
    #[serde(default)]
    pub ticket_title: String,
    /// Server-computed price for the line
    #[serde(default)]
    pub final_price: Money,
}

/// Display summary of the event an order belongs to
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSummary {
    /// Event ID
    pub id: Option<EventId>,
    /// Event title
    pub title: Option<String>,
    /// Event start
    pub starts_at: Option<DateTime<Utc>>,
    /// Venue name
    pub venue: Option<String>,
}

/// An order as reported by the order service
///
/// Server-authoritative: `total_amount` and item `final_price` are the values
/// checkout must trust. Display-only fields are optional because the create
/// response omits some of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Ordered items
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Server-computed total
    pub total_amount: Money,
    /// Current payment status
    pub payment_status: PaymentStatus,
    /// Payment method
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Event summary for rendering
    #[serde(default)]
    pub event: Option<EventSummary>,
}
