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

//! Referral resolution over the tracked recipient graph.
//!
//! A pass accrues every recipient reachable from the roots through "was referred by" edges
//! exactly once, then credits referrers from the tuples their referees produced. The graph
//! may contain cycles; the visited set bounds the walk.

use std::collections::{BTreeSet, HashMap, VecDeque};

use alloy::primitives::{Address, U256};

use crate::{
    accrual::{accrue_lot, referee_multiplier},
    config::PointsConfig,
    ledger::RecipientState,
    units::apply_multiplier,
};

/// One lot's referral contribution in a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralTuple {
    pub code: String,
    pub referrer: Address,
    /// Cumulative referral-eligible base points of the lot.
    pub base: U256,
    pub referee_multiplier: u64,
    pub outgoing_multiplier: u64,
}

/// Recomputes points of `roots` and of every recipient referred by them, directly or not.
///
/// Totals are recomputed from the lots, so resolving the same set twice at the same
/// timestamp yields the same result. Returns the recipients that were updated.
pub fn resolve_referrals(
    config: &PointsConfig,
    recipients: &mut HashMap<Address, RecipientState>,
    roots: impl IntoIterator<Item = Address>,
    as_of: u64,
) -> Vec<Address> {
    let holders = code_holders(recipients);

    let mut memo: HashMap<Address, Vec<ReferralTuple>> = HashMap::new();
    let mut visited = vec![];
    let mut worklist: VecDeque<Address> = roots.into_iter().collect();
    while let Some(address) = worklist.pop_front() {
        if memo.contains_key(&address) {
            continue;
        }
        let Some(state) = recipients.get_mut(&address) else {
            continue;
        };
        memo.insert(address, accrue_recipient(config, state, as_of));
        visited.push(address);
        worklist.extend(referees_of(config, &holders, address).0);
    }

    for address in &visited {
        let (referees, codes) = referees_of(config, &holders, *address);
        let mut referrer_points = U256::ZERO;
        let mut referrer_count = 0u32;
        for referee in &referees {
            let incoming: Vec<&ReferralTuple> = memo
                .get(referee)
                .into_iter()
                .flatten()
                .filter(|t| t.referrer == *address && codes.contains(&t.code))
                .collect();
            if incoming.is_empty() {
                continue;
            }
            referrer_count += 1;
            referrer_points += incoming
                .iter()
                .map(|t| apply_multiplier(t.base, t.referee_multiplier + t.outgoing_multiplier))
                .sum::<U256>();
        }
        if let Some(state) = recipients.get_mut(address) {
            let recipient = &mut state.recipient;
            recipient.points += referrer_points;
            recipient.referral_points += referrer_points;
            recipient.referrer_count = referrer_count;
        }
    }

    tracing::trace!("Resolved referrals for {} recipients", visited.len());
    visited
}

/// Maps each referral code, as written on the lots, to the tracked recipients using it.
fn code_holders(recipients: &HashMap<Address, RecipientState>) -> HashMap<String, Vec<Address>> {
    let mut index: HashMap<String, Vec<Address>> = HashMap::new();
    for (address, state) in recipients {
        for code in state.lots.iter().filter_map(|lot| lot.referral_code.as_deref()) {
            index.entry(code.to_owned()).or_default().push(*address);
        }
    }
    index
}

/// Other recipients holding lots with exactly one of the codes of `referrer`, and those codes.
fn referees_of(
    config: &PointsConfig,
    holders: &HashMap<String, Vec<Address>>,
    referrer: Address,
) -> (BTreeSet<Address>, Vec<String>) {
    let codes = config.referrals.codes_for(referrer);
    let referees = codes
        .iter()
        .filter_map(|code| holders.get(code.as_str()))
        .flatten()
        .copied()
        .filter(|referee| *referee != referrer)
        .collect();
    (referees, codes)
}

/// Accrues all lots of one recipient and sets its own and referee points.
fn accrue_recipient(
    config: &PointsConfig,
    state: &mut RecipientState,
    as_of: u64,
) -> Vec<ReferralTuple> {
    let address = state.recipient.address;
    let balance = state.recipient.balance;

    let mut lot_points = U256::ZERO;
    let mut tuples = vec![];
    for lot in &mut state.lots {
        accrue_lot(config, lot, balance, as_of);
        lot_points += lot.points;

        let Some(code) = lot.referral_code.as_deref() else {
            continue;
        };
        let Some(target) = config.referrals.lookup(code).filter(|t| t.address != address) else {
            continue;
        };
        let multiplier = referee_multiplier(config, lot, as_of);
        if multiplier > 0 {
            tuples.push(ReferralTuple {
                code: code.to_string(),
                referrer: target.address,
                base: lot.referral_points_base,
                referee_multiplier: multiplier,
                outgoing_multiplier: target.outgoing_multiplier,
            });
        }
    }

    let referee_points: U256 =
        tuples.iter().map(|t| apply_multiplier(t.base, t.referee_multiplier)).sum();
    let recipient = &mut state.recipient;
    recipient.points = lot_points + referee_points;
    recipient.referral_points = referee_points;
    recipient.referral_count = tuples.len() as u32;
    recipient.points_date = as_of;
    tuples
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        config::{PointCondition, STANDARD_CONDITION},
        entities::BalanceLot,
        referrals::{encode_address, ReferralDirectory, ReferralEntry},
        units::eth,
    };

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");
    const CAROL: Address = address!("00000000000000000000000000000000000ca201");
    const T0: u64 = 1_707_200_000_000;

    fn config() -> PointsConfig {
        let mut config = PointsConfig::mainnet(Address::ZERO);
        config.point_conditions = vec![PointCondition::new(STANDARD_CONDITION, 100)];
        config.referral_conditions = vec![PointCondition::new("referrals", 10)];
        config.balance_bonuses.clear();
        config.referrals = ReferralDirectory::new(vec![ReferralEntry {
            code: "bob".into(),
            address: BOB,
            outgoing_multiplier: 10,
        }]);
        config
    }

    fn holder(address: Address, balance: U256, code: Option<&str>) -> RecipientState {
        let mut state = RecipientState::new(address);
        if !balance.is_zero() {
            state.add_lot(BalanceLot {
                id: format!("lot-{address:#x}"),
                recipient: address,
                balance,
                asset: None,
                source: None,
                balance_date: T0,
                points_date: T0,
                points: U256::ZERO,
                referral_points_base: U256::ZERO,
                referral_code: code.map(str::to_string),
            });
        }
        state
    }

    fn tracked(states: Vec<RecipientState>) -> HashMap<Address, RecipientState> {
        states.into_iter().map(|s| (s.address(), s)).collect()
    }

    #[test]
    fn test_referee_and_referrer_rewards() {
        let config = config();
        let mut recipients =
            tracked(vec![holder(ALICE, eth(50), Some("bob")), holder(BOB, U256::ZERO, None)]);

        // 7.2 seconds of 50 tokens at 1.00x earns 1000 base points.
        let as_of = T0 + 7_200;
        let all: Vec<Address> = recipients.keys().copied().collect();
        resolve_referrals(&config, &mut recipients, all, as_of);

        let alice = &recipients[&ALICE].recipient;
        assert_eq!(alice.points, eth(1_100));
        assert_eq!(alice.referral_points, eth(100));
        assert_eq!(alice.referral_count, 1);
        assert_eq!(alice.referrer_count, 0);

        let bob = &recipients[&BOB].recipient;
        assert_eq!(bob.points, eth(200));
        assert_eq!(bob.referral_points, eth(200));
        assert_eq!(bob.referrer_count, 1);
        assert_eq!(bob.points_date, as_of);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = config();
        let mut recipients = tracked(vec![
            holder(ALICE, eth(50), Some("bob")),
            holder(BOB, eth(3), Some(&encode_address(ALICE))),
        ]);
        let all: Vec<Address> = recipients.keys().copied().collect();

        resolve_referrals(&config, &mut recipients, all.clone(), T0 + 3_600_000);
        let first = recipients.clone();
        resolve_referrals(&config, &mut recipients, all, T0 + 3_600_000);
        assert_eq!(recipients, first);
    }

    #[test]
    fn test_cycle_terminates_and_credits_both() {
        let config = config();
        let mut recipients = tracked(vec![
            holder(ALICE, eth(1), Some("bob")),
            holder(BOB, eth(1), Some(&format!("{ALICE:#x}"))),
        ]);

        let visited = resolve_referrals(&config, &mut recipients, [ALICE], T0 + 3_600_000);
        assert_eq!(visited.len(), 2);

        // Each earns 10,000 base. Alice pays out 10% + 10% to Bob; Bob's raw-address code
        // carries no outgoing multiplier.
        let alice = &recipients[&ALICE].recipient;
        let bob = &recipients[&BOB].recipient;
        assert_eq!(alice.points, eth(10_000 + 1_000 + 1_000));
        assert_eq!(bob.points, eth(10_000 + 1_000 + 2_000));
        assert_eq!(alice.referrer_count, 1);
        assert_eq!(bob.referrer_count, 1);
    }

    #[test]
    fn test_self_reference_is_excluded() {
        let config = config();
        let code = encode_address(ALICE);
        let mut recipients = tracked(vec![holder(ALICE, eth(1), Some(&code))]);

        resolve_referrals(&config, &mut recipients, [ALICE], T0 + 3_600_000);
        let alice = &recipients[&ALICE].recipient;
        assert_eq!(alice.points, eth(10_000));
        assert_eq!(alice.referral_points, U256::ZERO);
        assert_eq!(alice.referral_count, 0);
        assert_eq!(alice.referrer_count, 0);
    }

    #[test]
    fn test_invalid_code_still_accrues() {
        let config = config();
        let mut recipients = tracked(vec![holder(ALICE, eth(1), Some("nobody"))]);

        resolve_referrals(&config, &mut recipients, [ALICE], T0 + 3_600_000);
        let alice = &recipients[&ALICE].recipient;
        assert_eq!(alice.points, eth(10_000));
        assert_eq!(alice.referral_count, 0);
    }

    #[test]
    fn test_referrer_credited_for_exact_codes_only() {
        let config = config();
        let uppercase = format!("0x{}", hex::encode_upper(ALICE.as_slice()));
        let padded = format!(" {} ", encode_address(ALICE));
        let mut recipients = tracked(vec![
            holder(ALICE, U256::ZERO, None),
            holder(BOB, eth(1), Some(&uppercase)),
            holder(CAROL, eth(1), Some(&padded)),
        ]);

        let all: Vec<Address> = recipients.keys().copied().collect();
        resolve_referrals(&config, &mut recipients, all, T0 + 3_600_000);

        // The codes still attribute to Alice, so the referees earn their bonus.
        assert_eq!(recipients[&BOB].recipient.points, eth(11_000));
        assert_eq!(recipients[&CAROL].recipient.points, eth(11_000));
        let alice = &recipients[&ALICE].recipient;
        assert_eq!(alice.points, U256::ZERO);
        assert_eq!(alice.referrer_count, 0);
    }

    #[test]
    fn test_referrer_root_pulls_in_referees() {
        let config = config();
        let mut recipients =
            tracked(vec![holder(ALICE, eth(1), Some("bob")), holder(BOB, U256::ZERO, None)]);

        let visited = resolve_referrals(&config, &mut recipients, [BOB], T0 + 3_600_000);
        assert_eq!(visited, vec![BOB, ALICE]);
        assert_eq!(recipients[&ALICE].lots[0].points_date, T0 + 3_600_000);
        assert_eq!(recipients[&BOB].recipient.points, eth(2_000));
    }
}
