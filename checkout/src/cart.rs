//! Cart pricing.
//!
//! Holds per-ticket-type quantities and an optional discount for one event's
//! catalog, and computes advisory totals. The server recomputes prices when
//! the order is created; totals here are for display only.

use crate::error::ValidationError;
use crate::types::{Money, TicketType, TicketTypeId};
use serde::Serialize;
use std::collections::HashMap;

/// Discount as a fraction of the price, in `[0, 1)`
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DiscountFraction(f64);

impl DiscountFraction {
    /// No discount
    pub const NONE: Self = Self(0.0);

    /// Validate a fraction
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDiscount`] unless `0 <= fraction < 1`.
    pub fn new(fraction: f64) -> Result<Self, ValidationError> {
        if (0.0..1.0).contains(&fraction) {
            Ok(Self(fraction))
        } else {
            Err(ValidationError::InvalidDiscount(fraction))
        }
    }

    /// Validate a percentage (`20.0` is a 20% discount)
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDiscount`] unless `0 <= percent < 100`.
    pub fn from_percent(percent: f64) -> Result<Self, ValidationError> {
        Self::new(percent / 100.0)
    }

    /// The fraction
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// The fraction as a percentage
    #[must_use]
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }

    /// Share of the price still paid
    #[must_use]
    pub fn remaining(self) -> f64 {
        1.0 - self.0
    }
}

/// A positive-quantity selection in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Selected ticket type
    pub ticket_type_id: TicketTypeId,
    /// Ticket type name
    pub ticket_title: String,
    /// Selected quantity, always positive
    pub quantity: u32,
}

/// Cart for a single event's ticket catalog
///
/// Quantities are clamped to `[0, available_count]` on every write. Ids that
/// are not in the catalog are ignored.
#[derive(Debug, Clone, Default)]
pub struct CartPricingEngine {
    catalog: Vec<TicketType>,
    quantities: HashMap<TicketTypeId, u32>,
    discount: DiscountFraction,
}

impl CartPricingEngine {
    /// Create an empty cart over a catalog snapshot
    #[must_use]
    pub fn new(ticket_types: impl IntoIterator<Item = TicketType>) -> Self {
        Self {
            catalog: ticket_types.into_iter().collect(),
            quantities: HashMap::new(),
            discount: DiscountFraction::NONE,
        }
    }

    /// The catalog, in the order it was supplied
    #[must_use]
    pub fn ticket_types(&self) -> &[TicketType] {
        &self.catalog
    }

    /// Look up a ticket type
    #[must_use]
    pub fn ticket_type(&self, id: &TicketTypeId) -> Option<&TicketType> {
        self.catalog.iter().find(|ticket| ticket.id == *id)
    }

    /// Set the quantity for a ticket type, clamped to `[0, available_count]`
    ///
    /// Returns the stored quantity. Unknown ids store nothing and return 0.
    pub fn set_quantity(&mut self, id: &TicketTypeId, requested: i64) -> u32 {
        let Some(available) = self.ticket_type(id).map(|ticket| ticket.available_count) else {
            tracing::warn!(ticket_type_id = %id, "Ignoring quantity for unknown ticket type");
            return 0;
        };

        let quantity =
            u32::try_from(requested.clamp(0, i64::from(available))).unwrap_or_default();

        if quantity == 0 {
            self.quantities.remove(id);
        } else {
            self.quantities.insert(id.clone(), quantity);
        }

        quantity
    }

    /// Set the quantity from raw user input
    ///
    /// Fractional input is truncated; anything non-numeric counts as 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_quantity_input(&mut self, id: &TicketTypeId, raw: &str) -> u32 {
        let raw = raw.trim();
        let requested = raw.parse::<i64>().ok().unwrap_or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                // saturating float-to-int cast
                .map_or(0, |value| value.trunc() as i64)
        });

        self.set_quantity(id, requested)
    }

    /// Current quantity for a ticket type
    #[must_use]
    pub fn quantity(&self, id: &TicketTypeId) -> u32 {
        self.quantities.get(id).copied().unwrap_or(0)
    }

    /// Apply a discount fraction, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDiscount`] unless `0 <= fraction < 1`;
    /// the stored discount is unchanged in that case.
    pub fn apply_discount(&mut self, fraction: f64) -> Result<DiscountFraction, ValidationError> {
        let discount = DiscountFraction::new(fraction)?;
        self.set_discount(discount);
        Ok(discount)
    }

    /// Replace the discount with an already validated one
    pub fn set_discount(&mut self, discount: DiscountFraction) {
        self.discount = discount;
    }

    /// Remove any discount
    pub fn clear_discount(&mut self) {
        self.discount = DiscountFraction::NONE;
    }

    /// Current discount
    #[must_use]
    pub const fn discount(&self) -> DiscountFraction {
        self.discount
    }

    /// `unit_price × quantity × (1 − discount)`, rounded to the cent
    #[must_use]
    pub fn line_total(&self, id: &TicketTypeId) -> Money {
        self.ticket_type(id).map_or(Money::ZERO, |ticket| {
            ticket
                .unit_price
                .scaled(self.quantity(id), self.discount.remaining())
        })
    }

    /// Sum of all line totals
    #[must_use]
    pub fn cart_total(&self) -> Money {
        self.catalog.iter().map(|ticket| self.line_total(&ticket.id)).sum()
    }

    /// Positive-quantity lines, in catalog order
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.catalog
            .iter()
            .filter_map(|ticket| {
                let quantity = self.quantity(&ticket.id);
                (quantity > 0).then(|| CartLine {
                    ticket_type_id: ticket.id.clone(),
                    ticket_title: ticket.name.clone(),
                    quantity,
                })
            })
            .collect()
    }

    /// Total number of tickets selected
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.quantities.values().fold(0, |sum, q| sum.saturating_add(*q))
    }

    /// Whether no ticket type has a positive quantity
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Zero all quantities; the discount is kept
    pub fn reset(&mut self) {
        self.quantities.clear();
    }
}
