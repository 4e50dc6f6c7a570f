//! Paper Trading Books
//!
//! One simulated book per strategy. Accepts open a notional position sized
//! at a fixed fraction of the book balance; market-cap refreshes drive the
//! exit ladder. Market cap stands in for price because fresh pairs rarely
//! have a stable quote, and both move proportionally.
//!
//! Exit rules, checked in order on every refresh:
//!   1. stop loss when market cap drops 30% below entry
//!   2. take-profit ladder at +30%/+50%/+70%, selling 20%/25%/30% of the
//!      initially bought units at each rung
//!   3. time exit after 90 minutes if the position never reached +30%

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::info;

use crate::domain::{Candidate, ScoreResult, TokenId};

const POSITION_SIZE_FRACTION: f64 = 0.05;
const MAX_OPEN_POSITIONS: usize = 4;
const STOP_LOSS_DRAWDOWN: f64 = 0.30;
const TIME_EXIT_MINUTES: i64 = 90;
const TIME_EXIT_MIN_GAIN: f64 = 0.30;

/// (gain threshold over entry, fraction of initial units to sell)
const TP_LADDER: [(f64, f64); 3] = [(0.30, 0.20), (0.50, 0.25), (0.70, 0.30)];

/// A lifecycle event worth alerting and journaling.
#[derive(Debug, Clone)]
pub struct TradeEvent {
    pub strategy: String,
    pub symbol: String,
    pub event: String,
    pub realized_pnl_usd: f64,
}

#[derive(Debug, Clone)]
pub struct PaperPosition {
    pub token: TokenId,
    pub symbol: String,
    pub pair_address: String,
    pub entry_market_cap: f64,
    pub initial_units: f64,
    pub remaining_units: f64,
    pub tp_rungs_hit: usize,
    pub opened_at: DateTime<Utc>,
}

impl PaperPosition {
    fn gain_fraction(&self, market_cap: f64) -> f64 {
        market_cap / self.entry_market_cap - 1.0
    }
}

/// Running stats for one book, for the status log line each cycle.
#[derive(Debug, Clone, Copy)]
pub struct BookStats {
    pub balance_usd: f64,
    pub open_positions: usize,
    pub realized_pnl_usd: f64,
    pub trades_closed: u32,
    pub wins: u32,
    pub losses: u32,
}

pub struct PaperBook {
    strategy: String,
    balance_usd: f64,
    realized_pnl_usd: f64,
    trades_closed: u32,
    wins: u32,
    losses: u32,
    positions: Vec<PaperPosition>,
}

impl PaperBook {
    pub fn new(strategy: impl Into<String>, starting_balance_usd: f64) -> Self {
        Self {
            strategy: strategy.into(),
            balance_usd: starting_balance_usd,
            realized_pnl_usd: 0.0,
            trades_closed: 0,
            wins: 0,
            losses: 0,
            positions: Vec::new(),
        }
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn stats(&self) -> BookStats {
        BookStats {
            balance_usd: self.balance_usd,
            open_positions: self.positions.len(),
            realized_pnl_usd: self.realized_pnl_usd,
            trades_closed: self.trades_closed,
            wins: self.wins,
            losses: self.losses,
        }
    }

    pub fn positions(&self) -> &[PaperPosition] {
        &self.positions
    }

    pub fn has_position(&self, token: &TokenId) -> bool {
        self.positions.iter().any(|p| &p.token == token)
    }

    /// Open a position for an accepted candidate. Returns `None` when the
    /// book is full, already holds the token, or cannot price an entry.
    pub fn open(&mut self, candidate: &Candidate, _score: &ScoreResult) -> Option<TradeEvent> {
        if self.positions.len() >= MAX_OPEN_POSITIONS || self.has_position(&candidate.id) {
            return None;
        }
        let entry_market_cap = candidate.market_cap_or_estimate()?;
        if entry_market_cap <= 0.0 {
            return None;
        }
        let size = self.balance_usd * POSITION_SIZE_FRACTION;
        if size <= 0.0 {
            return None;
        }

        let units = size / entry_market_cap;
        self.balance_usd -= size;
        self.positions.push(PaperPosition {
            token: candidate.id.clone(),
            symbol: candidate.symbol.clone(),
            pair_address: candidate.pair_address.clone(),
            entry_market_cap,
            initial_units: units,
            remaining_units: units,
            tp_rungs_hit: 0,
            opened_at: Utc::now(),
        });
        info!(
            book = %self.strategy,
            symbol = %candidate.symbol,
            entry_mc = entry_market_cap,
            size_usd = size,
            "paper position opened"
        );
        Some(TradeEvent {
            strategy: self.strategy.clone(),
            symbol: candidate.symbol.clone(),
            event: "opened".to_string(),
            realized_pnl_usd: 0.0,
        })
    }

    /// Apply a fresh market cap to one held token, emitting any exit events.
    pub fn update(
        &mut self,
        token: &TokenId,
        market_cap: f64,
        now: DateTime<Utc>,
    ) -> Vec<TradeEvent> {
        let Some(index) = self.positions.iter().position(|p| &p.token == token) else {
            return vec![];
        };
        if market_cap <= 0.0 {
            return vec![];
        }

        let mut events = Vec::new();
        let gain = self.positions[index].gain_fraction(market_cap);

        // Stop loss closes everything remaining at once.
        if gain <= -STOP_LOSS_DRAWDOWN {
            events.push(self.close_at(index, market_cap, "stop_loss"));
            return events;
        }

        // Climb the take-profit ladder; the gain may clear several rungs
        // in one refresh. Clearing the last rung leaves the remainder
        // riding as a moonbag; a position that arrives here already fully
        // laddered cashes the moonbag out.
        let mut climbed = false;
        loop {
            let rung = self.positions[index].tp_rungs_hit;
            if rung >= TP_LADDER.len() {
                if climbed {
                    break;
                }
                events.push(self.close_at(index, market_cap, "take_profit_final"));
                return events;
            }
            let (threshold, sell_fraction) = TP_LADDER[rung];
            if gain < threshold {
                break;
            }
            let position = &mut self.positions[index];
            let units_sold = (position.initial_units * sell_fraction).min(position.remaining_units);
            let pnl = units_sold * (market_cap - position.entry_market_cap);
            position.remaining_units -= units_sold;
            position.tp_rungs_hit += 1;
            self.balance_usd += units_sold * market_cap;
            self.realized_pnl_usd += pnl;
            climbed = true;
            events.push(TradeEvent {
                strategy: self.strategy.clone(),
                symbol: self.positions[index].symbol.clone(),
                event: format!("take_profit_{}pct", (threshold * 100.0) as u32),
                realized_pnl_usd: pnl,
            });
        }

        // Stagnation exit: still below the first rung's gain after the
        // holding window, whether or not earlier rungs paid out.
        let position = &self.positions[index];
        let held = now - position.opened_at;
        if held >= ChronoDuration::minutes(TIME_EXIT_MINUTES) && gain < TIME_EXIT_MIN_GAIN {
            events.push(self.close_at(index, market_cap, "time_exit_stagnant"));
        }
        events
    }

    fn close_at(&mut self, index: usize, market_cap: f64, event: &str) -> TradeEvent {
        let position = self.positions.remove(index);
        let proceeds = position.remaining_units * market_cap;
        let pnl = position.remaining_units * (market_cap - position.entry_market_cap);
        self.balance_usd += proceeds;
        self.realized_pnl_usd += pnl;
        self.trades_closed += 1;
        if pnl >= 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        info!(
            book = %self.strategy,
            symbol = %position.symbol,
            event,
            pnl_usd = pnl,
            "paper position closed"
        );
        TradeEvent {
            strategy: self.strategy.clone(),
            symbol: position.symbol,
            event: event.to_string(),
            realized_pnl_usd: pnl,
        }
    }
}
