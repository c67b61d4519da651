//! Matching engine core
//!
//! Matches an incoming (taker) order against resting opposite-side
//! (maker) orders in price-time priority, entirely inside the caller's
//! transaction: order decrements, trade inserts, ledger settlements and
//! event staging commit together or not at all.

use rust_decimal::Decimal;
use types::errors::ExchangeError;
use types::ids::OrderId;
use types::order::{Order, Side};
use types::trade::Trade;

use crate::config::ExchangeConfig;
use crate::events::ExchangeEvent;
use crate::ledger;
use crate::store::OrderStore;
use crate::tx::Transaction;

/// Outcome of one matching pass
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Taker order after matching (Open with a remainder, or Filled)
    pub taker: Order,
    /// Fills produced, in execution order
    pub trades: Vec<Trade>,
}

/// Price-time priority matcher
pub struct MatchEngine {
    config: ExchangeConfig,
}

impl MatchEngine {
    pub fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// Match the taker order against the book inside `tx`.
    ///
    /// The taker is re-locked and re-read first, so a concurrent
    /// cancellation that won the lock race makes this a no-op. Candidate
    /// rows come from an unlocked snapshot query and are re-validated
    /// after their locks are acquired; stale rows are skipped. Execution
    /// price is always the maker's price.
    pub fn execute(
        &self,
        tx: &mut Transaction<'_>,
        book: &OrderStore,
        taker_id: OrderId,
        now: i64,
    ) -> Result<MatchResult, ExchangeError> {
        let mut taker = tx.lock_order(taker_id)?.clone();
        if !taker.is_open() || taker.remaining.is_zero() {
            return Ok(MatchResult {
                taker,
                trades: Vec::new(),
            });
        }

        let candidates = book.find_matchable(taker.symbol, taker.side, taker.price);
        let mut trades = Vec::new();

        for candidate in candidates {
            if taker.remaining.is_zero() {
                break;
            }

            let (fill, fill_price, maker_id, maker_account) = {
                let maker = tx.lock_order(candidate.order_id)?;
                // The snapshot query ran without locks; re-validate now
                // that the row is ours.
                if !maker.is_open() || maker.remaining.is_zero() {
                    continue;
                }
                if !self.config.allow_self_trade && maker.account_id == taker.account_id {
                    continue;
                }
                let fill = taker.remaining.min(maker.remaining);
                maker.fill(fill)?;
                (fill, maker.price, maker.order_id, maker.account_id)
            };
            taker.fill(fill)?;

            let (buy_order_id, sell_order_id, buyer, seller) = match taker.side {
                Side::Buy => (taker.order_id, maker_id, taker.account_id, maker_account),
                Side::Sell => (maker_id, taker.order_id, maker_account, taker.account_id),
            };

            let trade = Trade::new(
                buy_order_id,
                sell_order_id,
                taker.symbol,
                fill_price,
                fill,
                now,
            );
            tx.stage_trade(trade.clone());
            trades.push(trade);

            ledger::settle_fill(tx, buyer, seller, taker.symbol, fill, fill_price)?;

            // A buy taker reserved cash at its own limit; fills execute at
            // the maker's (lower or equal) price, so the exact difference
            // goes back to the buyer. Without this the improvement would
            // vanish from the system.
            if taker.side == Side::Buy && taker.price > fill_price {
                let improvement =
                    (taker.price.as_decimal() - fill_price.as_decimal()) * fill.as_decimal();
                if improvement > Decimal::ZERO {
                    ledger::release_cash(tx, taker.account_id, improvement)?;
                }
            }

            tracing::debug!(
                taker = %taker.order_id,
                maker = %maker_id,
                price = %fill_price,
                amount = %fill,
                "fill executed"
            );

            tx.stage_event(ExchangeEvent::OrderMatched {
                buyer_account_id: buyer,
                seller_account_id: seller,
                price: fill_price,
                amount: fill,
            });
        }

        tx.stage_order(taker.clone());
        Ok(MatchResult { taker, trades })
    }
}
