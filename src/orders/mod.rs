//! Daily honey order economy.
//!
//! Each calendar day brings a fresh board of three orders, typed by honey
//! category. Settling an order pays coins and XP at a per-category base
//! rate times quantity; once two orders of one category have been settled
//! in a day, further settlements of that category pay half. The order book
//! never touches the pantry itself: settlement validates against it, and
//! the calling system deducts stock only after a successful outcome.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Sub-modules
// ─────────────────────────────────────────────────────────────────────────────
mod fulfillment;
mod generation;

pub use fulfillment::*;
pub use generation::*;

/// Orders generated per daily refresh.
pub const ORDERS_PER_DAY: usize = 3;
/// Settled orders of one category per day before the reward reduction.
pub const QUOTA_PER_TYPE: u32 = 2;
/// Reward reduction applied past the quota, in percent.
pub const REDUCTION_PERCENT: u32 = 50;

pub struct OrdersPlugin;

impl Plugin for OrdersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DailyOrders>().add_systems(
            Update,
            (
                refresh_orders_catch_up,
                refresh_orders_on_rollover,
                handle_fulfill_requests,
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// One fulfillment request from a patron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoneyOrder {
    pub id: String,
    pub patron_name: String,
    pub patron_message: String,
    pub honey_type: HoneyType,
    pub bottles_requested: u32,
    /// Zero until completion; set to `bottles_requested` when the order
    /// settles. Partial fulfillment is not tracked mid-flight.
    pub bottles_fulfilled: u32,
    pub coin_reward: u64,
    pub xp_reward: u64,
    pub is_completed: bool,
    /// Whether the quota reduction applied to this order, decided at
    /// settlement time.
    pub is_reduced: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-category quota projection for the order board UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub fulfilled: u32,
    pub quota: u32,
    pub is_reduced: bool,
}

/// The daily order board: one calendar day's orders plus the per-category
/// settled counts the quota rule runs on.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DailyOrders {
    pub orders: Vec<HoneyOrder>,
    /// `YYYY-MM-DD`. Empty before the first refresh.
    pub last_refresh_date: String,
    /// Completed orders per category, today only. Reset exclusively by a
    /// day-boundary refresh.
    pub fulfilled_orders_count: BTreeMap<HoneyType, u32>,
    pub quota_per_type: u32,
    pub reduction_percent: u32,
}

impl Default for DailyOrders {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            last_refresh_date: String::new(),
            fulfilled_orders_count: HoneyType::ALL
                .iter()
                .map(|&honey_type| (honey_type, 0))
                .collect(),
            quota_per_type: QUOTA_PER_TYPE,
            reduction_percent: REDUCTION_PERCENT,
        }
    }
}

impl DailyOrders {
    pub fn order(&self, order_id: &str) -> Option<&HoneyOrder> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn active_orders(&self) -> impl Iterator<Item = &HoneyOrder> {
        self.orders.iter().filter(|o| !o.is_completed)
    }

    pub fn completed_orders(&self) -> impl Iterator<Item = &HoneyOrder> {
        self.orders.iter().filter(|o| o.is_completed)
    }

    pub fn fulfilled_count(&self, honey_type: HoneyType) -> u32 {
        self.fulfilled_orders_count
            .get(&honey_type)
            .copied()
            .unwrap_or(0)
    }

    /// Whether the NEXT settlement of this category would be reduced.
    pub fn should_reduce(&self, honey_type: HoneyType) -> bool {
        self.fulfilled_count(honey_type) >= self.quota_per_type
    }

    /// Per-category quota projection, covering every category.
    pub fn quota_status(&self) -> BTreeMap<HoneyType, QuotaStatus> {
        HoneyType::ALL
            .iter()
            .map(|&honey_type| {
                let fulfilled = self.fulfilled_count(honey_type);
                (
                    honey_type,
                    QuotaStatus {
                        fulfilled,
                        quota: self.quota_per_type,
                        is_reduced: fulfilled >= self.quota_per_type,
                    },
                )
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
