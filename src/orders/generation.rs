//! Daily order generation.
//!
//! Three orders per day. The first is steered toward a category the player
//! can plausibly fill (one they already stock, or one whose associated
//! crops they have grown) so the board is never a complete dead end. The
//! other two are uniform across all categories. All randomness flows
//! through the caller-supplied `Rng` so tests can pin exact boards.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use rand::Rng;

use super::*;
use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Patron pool — (name, message variants)
// ─────────────────────────────────────────────────────────────────────────────

const PATRONS: &[(&str, &[&str])] = &[
    (
        "Farmer Olsen",
        &[
            "Howdy! My wife takes honey in her tea every morning.",
            "Need a sweetener for the farmhouse baking!",
            "The hands are running low on honey again!",
        ],
    ),
    (
        "Chef Marisol",
        &[
            "My tasting menu needs the right honey!",
            "The restaurant only serves the good stuff.",
            "Diners keep ordering the honey-glazed special!",
        ],
    ),
    (
        "Baker Huxley",
        &[
            "Honey buns don't bake themselves!",
            "Running short on sweetener for the pastry case.",
            "The bakery needs a fresh supply before opening.",
        ],
    ),
    (
        "Granny Maeve",
        &[
            "Dearie, the grandchildren cleaned me out of honey!",
            "My old recipe calls for exactly this honey.",
            "Nothing soothes a cough like the real thing.",
        ],
    ),
    (
        "Market Nell",
        &[
            "The stall shelf is looking bare!",
            "Customers keep asking for local honey.",
            "This variety flies off the table, truly.",
        ],
    ),
    (
        "Dr. Alder",
        &[
            "Honey has its uses in my practice.",
            "I recommend a spoonful to half my patients.",
            "This particular type is the one I prescribe.",
        ],
    ),
    (
        "Tea Master Juno",
        &[
            "The ceremony calls for a precise sweetness.",
            "Balance in the cup begins with the honey.",
            "My students will appreciate a quality jar.",
        ],
    ),
    (
        "Beekeeper Sorrel",
        &[
            "A fellow keeper asking for a top-up, no shame in it.",
            "My hives had a rough season. Can you spare some?",
            "Quality recognizes quality, neighbor.",
        ],
    ),
];

// ─────────────────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Categories the player is likely able to fill: anything already in
/// stock, plus anything whose associated crops intersect the farming
/// history. Falls back to Wildflower when both are empty.
pub fn likely_honey_types(pantry: &Pantry, history: &FarmingHistory) -> Vec<HoneyType> {
    let mut likely: Vec<HoneyType> = Vec::new();

    for lot in &pantry.bottled_honey {
        if lot.bottles > 0 && !likely.contains(&lot.honey_type) {
            likely.push(lot.honey_type);
        }
    }

    for honey_type in HoneyType::ALL {
        let grown = honey_type
            .associated_crops()
            .iter()
            .any(|crop| history.contains(crop));
        if grown && !likely.contains(&honey_type) {
            likely.push(honey_type);
        }
    }

    if likely.is_empty() {
        likely.push(HoneyType::Wildflower);
    }

    likely
}

/// Generate a single order. Ids are derived from the refresh date and
/// board position so a board is addressable without wall-clock keys.
pub fn generate_order(
    rng: &mut impl Rng,
    date: &str,
    index: usize,
    now: DateTime<Utc>,
    force_type: Option<HoneyType>,
) -> HoneyOrder {
    let (patron_name, messages) = PATRONS[rng.gen_range(0..PATRONS.len())];
    let patron_message = messages[rng.gen_range(0..messages.len())];

    let honey_type = force_type
        .unwrap_or_else(|| HoneyType::ALL[rng.gen_range(0..HoneyType::ALL.len())]);

    let bottles_requested = rng.gen_range(1u32..=5);

    HoneyOrder {
        id: format!("order_{}_{}", date, index),
        patron_name: patron_name.to_string(),
        patron_message: patron_message.to_string(),
        honey_type,
        bottles_requested,
        bottles_fulfilled: 0,
        coin_reward: honey_type.base_price() * bottles_requested as u64,
        xp_reward: honey_type.base_xp() * bottles_requested as u64,
        is_completed: false,
        is_reduced: false,
        created_at: now,
    }
}

/// Generate the full daily board: first order steered, the rest uniform.
pub fn generate_daily_orders(
    rng: &mut impl Rng,
    date: &str,
    now: DateTime<Utc>,
    pantry: &Pantry,
    history: &FarmingHistory,
) -> Vec<HoneyOrder> {
    let likely = likely_honey_types(pantry, history);
    let matching = likely[rng.gen_range(0..likely.len())];

    let mut orders = Vec::with_capacity(ORDERS_PER_DAY);
    orders.push(generate_order(rng, date, 0, now, Some(matching)));
    for index in 1..ORDERS_PER_DAY {
        orders.push(generate_order(rng, date, index, now, None));
    }
    orders
}

impl DailyOrders {
    /// Refresh the board for `today`. Idempotent: calling again on the
    /// same day with orders already on the board changes nothing. A real
    /// refresh replaces the orders, zeroes every per-category settled
    /// count, and stamps the date. Returns whether a refresh happened.
    pub fn refresh(
        &mut self,
        today: &str,
        now: DateTime<Utc>,
        pantry: &Pantry,
        history: &FarmingHistory,
        rng: &mut impl Rng,
    ) -> bool {
        if self.last_refresh_date == today && !self.orders.is_empty() {
            return false;
        }

        self.orders = generate_daily_orders(rng, today, now, pantry, history);
        self.last_refresh_date = today.to_string();
        self.fulfilled_orders_count = HoneyType::ALL
            .iter()
            .map(|&honey_type| (honey_type, 0))
            .collect();
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

fn run_refresh(
    orders: &mut DailyOrders,
    clock: &WallClock,
    pantry: &Pantry,
    history: &FarmingHistory,
    rng: &mut SimRng,
) {
    if clock.today.is_empty() {
        return;
    }
    if orders.refresh(&clock.today, clock.now_utc, pantry, history, &mut rng.0) {
        info!(
            "[Orders] Fresh board for {}: {:?}",
            clock.today,
            orders
                .orders
                .iter()
                .map(|o| o.honey_type)
                .collect::<Vec<_>>()
        );
    }
}

/// Catch-up refresh: covers a stale loaded board (the clock gets its
/// first tick after the state transition, so an on-enter hook would see
/// an empty date). Exits in one string compare once the board is current.
pub fn refresh_orders_catch_up(
    mut orders: ResMut<DailyOrders>,
    clock: Res<WallClock>,
    pantry: Res<Pantry>,
    history: Res<FarmingHistory>,
    mut rng: ResMut<SimRng>,
) {
    if clock.today.is_empty() {
        return;
    }
    if orders.last_refresh_date == clock.today && !orders.orders.is_empty() {
        return;
    }
    run_refresh(&mut orders, &clock, &pantry, &history, &mut rng);
}

/// Day-boundary refresh.
pub fn refresh_orders_on_rollover(
    mut rollovers: EventReader<DayRolloverEvent>,
    mut orders: ResMut<DailyOrders>,
    clock: Res<WallClock>,
    pantry: Res<Pantry>,
    history: Res<FarmingHistory>,
    mut rng: ResMut<SimRng>,
) {
    for _event in rollovers.read() {
        run_refresh(&mut orders, &clock, &pantry, &history, &mut rng);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
