//! Weekly-capped shop purchases
//!
//! Purchase counters reset lazily when the stored week start no longer
//! matches the current one. Spend, counter increment, and every grant
//! commit in one batch.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::records::{Board, ShopLedger, SkinCloset, Wallet};
use gashapon_core::{Clock, Metric, Persist, Reward};
use gashapon_db::PendingWrite;

/// Result of a successful purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub item: String,
    /// Purchases of this item so far this week, this one included
    pub purchases_this_week: u32,
    pub granted: Reward,
    pub skin: Option<String>,
}

impl<C: Clock> Engine<C> {
    /// Purchase counters with the lazy weekly reset applied
    pub fn shop_ledger(&self) -> Result<ShopLedger> {
        let mut ledger = self.store().load::<ShopLedger>(ShopLedger::KIND)?.record;
        if ledger.week_start != Some(self.this_week()) {
            ledger.purchased.clear();
            ledger.week_start = Some(self.this_week());
        }
        Ok(ledger)
    }

    /// Buy one unit of a shop item
    pub fn purchase(&mut self, item_id: &str) -> Result<PurchaseOutcome> {
        let item = self
            .content()
            .shop_item(item_id)
            .ok_or_else(|| Error::UnknownContent(item_id.to_string()))?
            .clone();

        self.with_retry(|engine| {
            let week = engine.this_week();
            let ledger_loaded = engine.store().load::<ShopLedger>(ShopLedger::KIND)?;
            let mut ledger = ledger_loaded.record;
            if ledger.week_start != Some(week) {
                ledger.purchased.clear();
                ledger.week_start = Some(week);
            }

            let bought = ledger.count(&item.id);
            if bought >= item.weekly_limit {
                return Err(Error::WeeklyLimitReached {
                    item: item.id.clone(),
                    limit: item.weekly_limit,
                });
            }

            let wallet_loaded = engine.store().load::<Wallet>(Wallet::KIND)?;
            let mut wallet = wallet_loaded.record;
            if wallet.coins < item.cost_coins {
                return Err(Error::InsufficientCoins { needed: item.cost_coins, have: wallet.coins });
            }
            if wallet.medals < item.cost_medals {
                return Err(Error::InsufficientMedals {
                    needed: item.cost_medals,
                    have: wallet.medals,
                });
            }

            // Spend and currency grants fold into one wallet write
            wallet.coins = wallet.coins - item.cost_coins + item.grants.coins;
            wallet.medals = wallet.medals - item.cost_medals + item.grants.medals;
            ledger.purchased.insert(item.id.clone(), bought + 1);

            let mut writes = vec![
                PendingWrite::new(Wallet::KIND, &wallet, wallet_loaded.version)?,
                PendingWrite::new(ShopLedger::KIND, &ledger, ledger_loaded.version)?,
            ];
            if item.grants.dice > 0 {
                let board_loaded = engine.store().load::<Board>(Board::KIND)?;
                let mut board = board_loaded.record;
                board.dice = board.dice.saturating_add(item.grants.dice);
                writes.push(PendingWrite::new(Board::KIND, &board, board_loaded.version)?);
            }
            if let Some(skin) = &item.skin {
                let closet_loaded = engine.store().load::<SkinCloset>(SkinCloset::KIND)?;
                let mut closet = closet_loaded.record;
                closet.owned.insert(skin.clone());
                writes.push(PendingWrite::new(SkinCloset::KIND, &closet, closet_loaded.version)?);
            }
            writes.push(engine.quest_bump_pending(Metric::Purchases, 1)?);
            engine.commit(writes)?;

            log::debug!("purchased '{}' ({}/{} this week)", item.id, bought + 1, item.weekly_limit);
            Ok(PurchaseOutcome {
                item: item.id.clone(),
                purchases_this_week: bought + 1,
                granted: item.grants,
                skin: item.skin.clone(),
            })
        })
    }
}
