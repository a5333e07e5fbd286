//! Currency balance operations

use crate::error::Result;
use crate::Engine;
use gashapon_core::records::{Board, Wallet};
use gashapon_core::{Clock, Persist, Reward};
use gashapon_db::PendingWrite;

impl<C: Clock> Engine<C> {
    /// Current balances
    pub fn wallet(&self) -> Result<Wallet> {
        Ok(self.store().load::<Wallet>(Wallet::KIND)?.record)
    }

    /// Overwrite both balances
    ///
    /// Balances are absolute values; external collaborators that award or
    /// spend currency go through the typed operations instead.
    pub fn set_wallet(&mut self, coins: u64, medals: u64) -> Result<Wallet> {
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Wallet>(Wallet::KIND)?;
            let wallet = Wallet { coins, medals };
            engine.store().save(Wallet::KIND, &wallet, loaded.version)?;
            Ok(wallet)
        })
    }

    /// Grant a reward bundle outside any other operation
    ///
    /// Mini-games report their payouts through this entry point.
    pub fn credit_reward(&mut self, reward: Reward) -> Result<Wallet> {
        self.with_retry(|engine| {
            let mut writes = Vec::new();
            engine.grant_writes(&reward, &mut writes)?;
            engine.commit(writes)?;
            engine.wallet()
        })
    }

    /// Build the writes that pay out a reward bundle
    ///
    /// Coins and medals land in the wallet, dice on the board record. Ops
    /// that already write either key must fold the grant in themselves; a
    /// batch may touch each key only once.
    pub(crate) fn grant_writes(&self, reward: &Reward, writes: &mut Vec<PendingWrite>) -> Result<()> {
        if reward.coins > 0 || reward.medals > 0 {
            let loaded = self.store().load::<Wallet>(Wallet::KIND)?;
            let mut wallet = loaded.record;
            wallet.credit(reward);
            writes.push(PendingWrite::new(Wallet::KIND, &wallet, loaded.version)?);
        }
        if reward.dice > 0 {
            let loaded = self.store().load::<Board>(Board::KIND)?;
            let mut board = loaded.record;
            board.dice = board.dice.saturating_add(reward.dice);
            writes.push(PendingWrite::new(Board::KIND, &board, loaded.version)?);
        }
        Ok(())
    }
}
