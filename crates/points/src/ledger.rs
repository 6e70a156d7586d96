// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per holder balance lots and the spend-down policy.

use std::cmp::Reverse;

use alloy::primitives::{Address, U256};

use crate::{
    entities::{BalanceLot, Recipient},
    error::LedgerError,
};

/// A recipient together with every lot it still tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientState {
    pub recipient: Recipient,
    pub lots: Vec<BalanceLot>,
}

impl RecipientState {
    pub fn new(address: Address) -> Self {
        Self { recipient: Recipient::new(address), lots: vec![] }
    }

    pub fn address(&self) -> Address {
        self.recipient.address
    }

    /// Whether the recipient holds lots that have not been accrued up to `timestamp`.
    pub fn has_pending_accrual(&self, timestamp: u64) -> bool {
        self.lots.iter().any(|lot| !lot.balance.is_zero() && lot.points_date < timestamp)
    }

    pub fn add_lot(&mut self, lot: BalanceLot) {
        self.recipient.balance += lot.balance;
        self.lots.push(lot);
    }

    /// Consumes `amount` from the lots and returns the ids of lots dropped as a result.
    ///
    /// Lots of `spend_last_asset` are consumed after every other lot. Otherwise the most
    /// recently acquired lot goes first, ties broken by descending id. Lots keep their
    /// accumulated points and are only dropped once both amount and points are zero.
    pub fn spend(
        &mut self,
        amount: U256,
        spend_last_asset: Option<Address>,
    ) -> Result<Vec<String>, LedgerError> {
        if amount.is_zero() {
            return Ok(vec![]);
        }
        let address = self.address();
        if !self.lots.iter().any(|lot| !lot.balance.is_zero()) {
            return Err(LedgerError::NoLots { recipient: address, amount });
        }
        let available: U256 = self.lots.iter().map(|lot| lot.balance).sum();
        if available < amount || self.recipient.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                recipient: address,
                amount,
                balance: self.recipient.balance,
            });
        }

        let mut order: Vec<usize> = (0..self.lots.len()).collect();
        order.sort_by_key(|&i| {
            let lot = &self.lots[i];
            let protected = spend_last_asset.is_some() && lot.asset == spend_last_asset;
            (protected, Reverse(lot.balance_date), Reverse(lot.id.clone()))
        });

        let mut remaining = amount;
        for i in order {
            if remaining.is_zero() {
                break;
            }
            let lot = &mut self.lots[i];
            let taken = remaining.min(lot.balance);
            lot.balance -= taken;
            remaining -= taken;
        }
        self.recipient.balance -= amount;

        let mut pruned = vec![];
        self.lots.retain(|lot| {
            if lot.is_prunable() {
                pruned.push(lot.id.clone());
                false
            } else {
                true
            }
        });
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{OETH, RETH},
        units::eth,
    };

    fn lot(id: &str, balance: U256, asset: Option<Address>, acquired: u64) -> BalanceLot {
        BalanceLot {
            id: id.into(),
            recipient: Address::ZERO,
            balance,
            asset,
            source: None,
            balance_date: acquired,
            points_date: acquired,
            points: U256::from(1),
            referral_points_base: U256::ZERO,
            referral_code: None,
        }
    }

    fn balances(state: &RecipientState) -> Vec<(String, U256)> {
        state.lots.iter().map(|l| (l.id.clone(), l.balance)).collect()
    }

    #[test]
    fn test_spend_prefers_recent_non_protected_lots() {
        let mut state = RecipientState::new(Address::ZERO);
        state.add_lot(lot("a", eth(5), Some(OETH), 3));
        state.add_lot(lot("b", eth(5), Some(RETH), 1));
        state.add_lot(lot("c", eth(5), None, 2));
        assert_eq!(state.recipient.balance, eth(15));

        state.spend(eth(7), Some(OETH)).unwrap();
        assert_eq!(
            balances(&state),
            vec![("a".into(), eth(5)), ("b".into(), eth(3)), ("c".into(), U256::ZERO)]
        );
        assert_eq!(state.recipient.balance, eth(8));

        state.spend(eth(4), Some(OETH)).unwrap();
        assert_eq!(
            balances(&state),
            vec![("a".into(), eth(4)), ("b".into(), U256::ZERO), ("c".into(), U256::ZERO)]
        );
    }

    #[test]
    fn test_spend_ties_break_on_descending_id() {
        let mut state = RecipientState::new(Address::ZERO);
        state.add_lot(lot("0001-01", eth(1), None, 7));
        state.add_lot(lot("0001-02", eth(1), None, 7));

        state.spend(eth(1), None).unwrap();
        assert_eq!(
            balances(&state),
            vec![("0001-01".into(), eth(1)), ("0001-02".into(), U256::ZERO)]
        );
    }

    #[test]
    fn test_spend_prunes_only_empty_lots() {
        let mut state = RecipientState::new(Address::ZERO);
        let mut fresh = lot("fresh", eth(1), None, 2);
        fresh.points = U256::ZERO;
        state.add_lot(lot("old", eth(1), None, 1));
        state.add_lot(fresh);

        let pruned = state.spend(eth(2), None).unwrap();
        assert_eq!(pruned, vec!["fresh".to_string()]);
        // The old lot keeps its points even with nothing left to spend.
        assert_eq!(balances(&state), vec![("old".into(), U256::ZERO)]);
        assert_eq!(state.recipient.balance, U256::ZERO);
    }

    #[test]
    fn test_spend_without_lots_fails() {
        let mut state = RecipientState::new(Address::ZERO);
        assert!(matches!(state.spend(eth(1), None), Err(LedgerError::NoLots { .. })));
        assert!(state.spend(U256::ZERO, None).unwrap().is_empty());
    }

    #[test]
    fn test_spend_over_balance_fails_without_mutation() {
        let mut state = RecipientState::new(Address::ZERO);
        state.add_lot(lot("a", eth(1), None, 1));
        let before = state.clone();

        let err = state.spend(eth(2), None).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_pending_accrual() {
        let mut state = RecipientState::new(Address::ZERO);
        assert!(!state.has_pending_accrual(10));
        state.add_lot(lot("a", eth(1), None, 5));
        assert!(state.has_pending_accrual(10));
        assert!(!state.has_pending_accrual(5));
    }
}
