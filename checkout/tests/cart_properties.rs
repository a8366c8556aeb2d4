//! Property tests for cart pricing.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use proptest::prelude::*;
use storefront_checkout::{CartPricingEngine, Money, TicketType, TicketTypeId};

fn ticket(unit_cents: u64, available: u32) -> TicketType {
    TicketType {
        id: TicketTypeId::new(),
        name: "General".to_string(),
        unit_price: Money::from_cents(unit_cents),
        available_count: available,
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn expected_line(unit_cents: u64, quantity: u32, discount: f64) -> u64 {
    (unit_cents as f64 * f64::from(quantity) * (1.0 - discount)).round() as u64
}

#[test]
fn quantity_above_availability_is_clamped() {
    let general = ticket(2_500, 5);
    let id = general.id.clone();
    let mut cart = CartPricingEngine::new([general]);

    assert_eq!(cart.set_quantity(&id, 7), 5);
    assert_eq!(cart.quantity(&id), 5);
}

#[test]
fn twenty_percent_off_two_tickets() {
    let general = ticket(2_500, 10);
    let id = general.id.clone();
    let mut cart = CartPricingEngine::new([general]);

    cart.set_quantity(&id, 2);
    cart.apply_discount(0.2).unwrap();

    assert_eq!(cart.cart_total(), Money::from_dollars(40));
    assert_eq!(cart.cart_total().to_string(), "$40.00");
}

#[test]
fn later_discount_replaces_earlier() {
    let mut cart = CartPricingEngine::new([ticket(2_500, 10)]);

    cart.apply_discount(0.1).unwrap();
    cart.apply_discount(0.2).unwrap();

    assert!((cart.discount().value() - 0.2).abs() < f64::EPSILON);
}

proptest! {
    #[test]
    fn stored_quantity_is_clamped(available in 0u32..500, requested in any::<i64>()) {
        let general = ticket(1_000, available);
        let id = general.id.clone();
        let mut cart = CartPricingEngine::new([general]);

        let stored = cart.set_quantity(&id, requested);

        let expected = u32::try_from(requested.clamp(0, i64::from(available))).unwrap();
        prop_assert_eq!(stored, expected);
        prop_assert_eq!(cart.quantity(&id), expected);
        prop_assert!(stored <= available);
    }

    #[test]
    fn raw_input_never_exceeds_availability(available in 0u32..100, raw in "\\PC{0,12}") {
        let general = ticket(1_000, available);
        let id = general.id.clone();
        let mut cart = CartPricingEngine::new([general]);

        let stored = cart.set_quantity_input(&id, &raw);

        prop_assert!(stored <= available);
        prop_assert_eq!(cart.quantity(&id), stored);
    }

    #[test]
    fn line_total_matches_formula(
        unit_cents in 0u64..1_000_000,
        available in 1u32..50,
        requested in 0i64..60,
        discount in 0.0f64..1.0,
    ) {
        let general = ticket(unit_cents, available);
        let id = general.id.clone();
        let mut cart = CartPricingEngine::new([general]);

        let quantity = cart.set_quantity(&id, requested);
        cart.apply_discount(discount).unwrap();

        prop_assert_eq!(
            cart.line_total(&id).cents(),
            expected_line(unit_cents, quantity, discount)
        );
    }

    #[test]
    fn cart_total_is_sum_of_positive_lines(
        lines in prop::collection::vec((0u64..100_000, 0u32..20, 0i64..25), 1..6),
        discount in 0.0f64..1.0,
    ) {
        let tickets: Vec<TicketType> = lines
            .iter()
            .map(|(cents, available, _)| ticket(*cents, *available))
            .collect();
        let ids: Vec<TicketTypeId> = tickets.iter().map(|t| t.id.clone()).collect();
        let mut cart = CartPricingEngine::new(tickets);

        for (id, (_, _, requested)) in ids.iter().zip(&lines) {
            cart.set_quantity(id, *requested);
        }
        cart.apply_discount(discount).unwrap();

        let summed: u64 = cart
            .lines()
            .iter()
            .map(|line| cart.line_total(&line.ticket_type_id).cents())
            .sum();
        prop_assert_eq!(cart.cart_total().cents(), summed);
        prop_assert!(cart.lines().iter().all(|line| line.quantity > 0));
    }

    #[test]
    fn invalid_discount_is_rejected_and_previous_kept(bad in prop_oneof![1.0f64..1e6, -1e6f64..0.0]) {
        let mut cart = CartPricingEngine::new([ticket(1_000, 3)]);
        cart.apply_discount(0.25).unwrap();

        prop_assert!(cart.apply_discount(bad).is_err());
        prop_assert!((cart.discount().value() - 0.25).abs() < f64::EPSILON);
    }
}
