//! Order settlement.
//!
//! `fulfill_order` validates against the pantry but never mutates it; a
//! successful outcome completes the order and bumps the category's daily
//! count in a single `&mut self` call, so no partial state is ever
//! observable. The calling system deducts stock and glass bottles, banks
//! the coins, and lets the experience ledger pick up the XP.

use bevy::prelude::*;

use super::*;
use crate::shared::*;

/// Structured settlement result. Failures carry a user-facing message and
/// are never panics.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentOutcome {
    pub success: bool,
    pub coins_earned: u64,
    pub xp_earned: u64,
    pub message: String,
    pub was_reduced: bool,
}

impl FulfillmentOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            coins_earned: 0,
            xp_earned: 0,
            message: message.into(),
            was_reduced: false,
        }
    }
}

impl DailyOrders {
    /// Attempt to settle one order against the pantry.
    ///
    /// Fails (without mutating anything) when the order is unknown or
    /// already completed, when matching-category stock is short, or when
    /// glass bottles are short (one per honey bottle). The reduction
    /// decision reads the category count as it stood BEFORE this
    /// settlement, so the quota-plus-first settlement is the first one
    /// reduced.
    pub fn fulfill_order(&mut self, order_id: &str, pantry: &Pantry) -> FulfillmentOutcome {
        let Some(index) = self.orders.iter().position(|o| o.id == order_id) else {
            return FulfillmentOutcome::failure("Order not found");
        };

        if self.orders[index].is_completed {
            return FulfillmentOutcome::failure("Order already completed");
        }

        let honey_type = self.orders[index].honey_type;
        let bottles_needed =
            self.orders[index].bottles_requested - self.orders[index].bottles_fulfilled;

        if pantry.honey_stock(honey_type) < bottles_needed {
            return FulfillmentOutcome::failure(format!(
                "Need {} bottles of {}",
                bottles_needed,
                honey_type.display_name()
            ));
        }

        if pantry.glass_bottles < bottles_needed {
            return FulfillmentOutcome::failure(format!(
                "Need {} glass bottles for packaging",
                bottles_needed
            ));
        }

        let was_reduced = self.should_reduce(honey_type);
        let multiplier = if was_reduced {
            (100 - self.reduction_percent) as u64
        } else {
            100
        };
        let coins_earned = self.orders[index].coin_reward * multiplier / 100;
        let xp_earned = self.orders[index].xp_reward * multiplier / 100;

        let order = &mut self.orders[index];
        order.is_completed = true;
        order.bottles_fulfilled = order.bottles_requested;
        order.is_reduced = was_reduced;
        *self.fulfilled_orders_count.entry(honey_type).or_insert(0) += 1;

        let message = if was_reduced {
            format!(
                "Order complete! ({}% reduced - daily quota reached)",
                self.reduction_percent
            )
        } else {
            "Order complete!".to_string()
        };

        FulfillmentOutcome {
            success: true,
            coins_earned,
            xp_earned,
            message,
            was_reduced,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Settle fulfill requests from the order UI. On success this is the
/// caller the settlement contract talks about: it deducts the honey and
/// bottles, banks the coins, and fires `OrderFulfilledEvent`.
pub fn handle_fulfill_requests(
    mut requests: EventReader<OrderFulfillRequest>,
    mut orders: ResMut<DailyOrders>,
    mut pantry: ResMut<Pantry>,
    mut fulfilled: EventWriter<OrderFulfilledEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for request in requests.read() {
        let outcome = orders.fulfill_order(&request.order_id, &pantry);

        if !outcome.success {
            info!(
                "[Orders] Could not settle {}: {}",
                request.order_id, outcome.message
            );
            toasts.send(ToastEvent {
                message: outcome.message,
                duration_secs: 3.0,
            });
            continue;
        }

        // Settlement succeeded; the order is now completed, with
        // bottles_fulfilled == bottles_requested.
        if let Some(order) = orders.order(&request.order_id) {
            let bottles = order.bottles_requested;
            let honey_type = order.honey_type;

            let removed = pantry.try_remove_honey(honey_type, bottles);
            debug_assert_eq!(removed, bottles);
            pantry.glass_bottles = pantry.glass_bottles.saturating_sub(bottles);
            pantry.coins += outcome.coins_earned;

            info!(
                "[Orders] Settled {} for {} coins / {} xp (reduced: {})",
                request.order_id, outcome.coins_earned, outcome.xp_earned, outcome.was_reduced
            );

            fulfilled.send(OrderFulfilledEvent {
                order_id: request.order_id.clone(),
                honey_type,
                bottles,
                coins_earned: outcome.coins_earned,
                xp_earned: outcome.xp_earned,
                was_reduced: outcome.was_reduced,
            });
            toasts.send(ToastEvent {
                message: outcome.message,
                duration_secs: 3.0,
            });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn order(id: &str, honey_type: HoneyType, bottles: u32) -> HoneyOrder {
        HoneyOrder {
            id: id.to_string(),
            patron_name: "Market Nell".to_string(),
            patron_message: "The stall shelf is looking bare!".to_string(),
            honey_type,
            bottles_requested: bottles,
            bottles_fulfilled: 0,
            coin_reward: honey_type.base_price() * bottles as u64,
            xp_reward: honey_type.base_xp() * bottles as u64,
            is_completed: false,
            is_reduced: false,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn board(orders: Vec<HoneyOrder>) -> DailyOrders {
        DailyOrders {
            orders,
            last_refresh_date: "2026-03-14".to_string(),
            ..Default::default()
        }
    }

    fn stocked_pantry() -> Pantry {
        let mut pantry = Pantry {
            glass_bottles: 50,
            ..Default::default()
        };
        pantry.add_honey(HoneyType::Light, 50);
        pantry
    }

    #[test]
    fn test_successful_settlement() {
        let mut orders = board(vec![order("o1", HoneyType::Light, 3)]);
        let outcome = orders.fulfill_order("o1", &stocked_pantry());

        assert!(outcome.success);
        assert!(!outcome.was_reduced);
        assert_eq!(outcome.coins_earned, 45); // 15 * 3
        assert_eq!(outcome.xp_earned, 30); // 10 * 3

        let settled = orders.order("o1").unwrap();
        assert!(settled.is_completed);
        assert_eq!(settled.bottles_fulfilled, 3);
        assert!(!settled.is_reduced);
        assert_eq!(orders.fulfilled_count(HoneyType::Light), 1);
    }

    #[test]
    fn test_third_same_type_settlement_is_reduced() {
        let mut orders = board(vec![
            order("o1", HoneyType::Light, 2),
            order("o2", HoneyType::Light, 2),
            order("o3", HoneyType::Light, 2),
        ]);
        let pantry = stocked_pantry();

        let first = orders.fulfill_order("o1", &pantry);
        let second = orders.fulfill_order("o2", &pantry);
        let third = orders.fulfill_order("o3", &pantry);

        assert_eq!(
            (first.was_reduced, second.was_reduced, third.was_reduced),
            (false, false, true)
        );

        // 15 * 2 = 30 full; reduced pays exactly half, floored.
        assert_eq!(first.coins_earned, 30);
        assert_eq!(third.coins_earned, 15);
        assert_eq!(third.xp_earned, 10); // floor(20 * 0.5)
        assert!(orders.order("o3").unwrap().is_reduced);
    }

    #[test]
    fn test_reduction_floors_odd_rewards() {
        let mut orders = board(vec![
            order("o1", HoneyType::Light, 2),
            order("o2", HoneyType::Light, 2),
            order("o3", HoneyType::Light, 1),
        ]);
        let pantry = stocked_pantry();
        orders.fulfill_order("o1", &pantry);
        orders.fulfill_order("o2", &pantry);

        // 15 * 1 = 15 full -> floor(7.5) = 7 reduced.
        let third = orders.fulfill_order("o3", &pantry);
        assert_eq!(third.coins_earned, 7);
        assert_eq!(third.xp_earned, 5);
    }

    #[test]
    fn test_unknown_order_does_not_mutate() {
        let mut orders = board(vec![order("o1", HoneyType::Light, 2)]);
        let outcome = orders.fulfill_order("nope", &stocked_pantry());

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Order not found");
        assert_eq!(orders.fulfilled_count(HoneyType::Light), 0);
    }

    #[test]
    fn test_completed_order_rejected_without_mutation() {
        let mut orders = board(vec![order("o1", HoneyType::Light, 2)]);
        let pantry = stocked_pantry();

        assert!(orders.fulfill_order("o1", &pantry).success);
        let outcome = orders.fulfill_order("o1", &pantry);

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Order already completed");
        assert_eq!(outcome.coins_earned, 0);
        assert_eq!(orders.fulfilled_count(HoneyType::Light), 1);
    }

    #[test]
    fn test_short_stock_rejected() {
        let mut orders = board(vec![order("o1", HoneyType::Amber, 4)]);
        let mut pantry = Pantry {
            glass_bottles: 10,
            ..Default::default()
        };
        pantry.add_honey(HoneyType::Amber, 3);

        let outcome = orders.fulfill_order("o1", &pantry);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Need 4 bottles of Amber Honey");
        assert!(!orders.order("o1").unwrap().is_completed);
        assert_eq!(orders.fulfilled_count(HoneyType::Amber), 0);
    }

    #[test]
    fn test_short_glass_bottles_rejected() {
        let mut orders = board(vec![order("o1", HoneyType::Amber, 4)]);
        let mut pantry = Pantry {
            glass_bottles: 3,
            ..Default::default()
        };
        pantry.add_honey(HoneyType::Amber, 10);

        let outcome = orders.fulfill_order("o1", &pantry);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Need 4 glass bottles for packaging");
        assert_eq!(orders.fulfilled_count(HoneyType::Amber), 0);
    }

    #[test]
    fn test_wrong_type_stock_does_not_count() {
        let mut orders = board(vec![order("o1", HoneyType::Dark, 1)]);
        let mut pantry = Pantry {
            glass_bottles: 10,
            ..Default::default()
        };
        pantry.add_honey(HoneyType::Light, 10);

        assert!(!orders.fulfill_order("o1", &pantry).success);
    }
}
