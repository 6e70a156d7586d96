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

//! Referral code directory and address-derived referral codes.

use std::str::FromStr;

use alloy::primitives::{address, Address};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// A named referral code owned by a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralEntry {
    pub code: String,
    pub address: Address,
    /// Extra basis-100 multiplier granted to the referrer on top of the referee multiplier.
    pub outgoing_multiplier: u64,
}

/// Who a referral code points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralTarget {
    pub address: Address,
    pub outgoing_multiplier: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferralDirectory {
    entries: Vec<ReferralEntry>,
}

impl ReferralDirectory {
    pub fn new(entries: Vec<ReferralEntry>) -> Self {
        Self { entries }
    }

    /// Official codes of the mainnet program. Every referrer earns an extra 0.1x.
    pub fn mainnet() -> Self {
        let official: [(&str, Address); 29] = [
            ("alexwacy", address!("769c1c6754308B71b9080476dC5bE43Fc07805fc")),
            ("gideon", address!("Cc263863362fe3d31784cb467111dE8eD9C95FB1")),
            ("xeus", address!("6bccf642b6bcb4e0c8ac490ead141dedd03a4c4f")),
            ("potens", address!("5a6DB0FF376b539d0dc1202c20Ab3efDAc81482d")),
            ("hermes", address!("9E4C537E9bAc8799E5dc2355219f21338f4801eA")),
            ("michael", address!("15e243363d02b57d1e8ad83ad1898f9eea8929f4")),
            ("davidgmi", address!("CE381A18BcE0A27e6a5DBCef8b7f58b425bc9d93")),
            ("tanaka", address!("313e2223436e151C6B4167c63a5e0324aC8FbcED")),
            ("salazar", address!("9Ef9e304E1f8E9792005aBf5d01241b1E9CEDD1b")),
            ("cryptonova", address!("b338B3177B1668eb4c921c5971853712Ae1F7219")),
            ("resdegen", address!("f8d1AE33b2454548939f8C8B08a2f07fD0535805")),
            ("brill", address!("b5a35e549d114923a7c60cdc70ce9fd4e1048c17")),
            ("marsdefi", address!("0Eb904f5d2CBA4FD6425097E091Bd5dd109C87fD")),
            ("viktordefi", address!("Dcf8c3e582198a20559a5952145680510209b9b8")),
            ("arndxt", address!("ce76ebf1c9fb4a4bde0b4256c3814ca5cb938914")),
            ("bmsbonus", address!("156B1156833aBEA5c5779ee8FD88edc21CADcf23")),
            ("stacymuur", address!("aA9543F2eFF0e7A4b267F839612945841172B02F")),
            ("shoal", address!("0E99f7d366711f8cCf05Eaf871f72D37AbEC1937")),
            ("rethboost", address!("dead000000000000000000000000000000000001")),
            ("ethxboost", address!("dead000000000000000000000000000000000002")),
            ("exodus", address!("dB2e6ef9a200D4F7330C900623382a14F1cE091C")),
            // Native staking
            ("ashraf", address!("c6CA1Ee4583fBdb912c74b6Bf3aA2A6a4dA10E22")),
            ("zcrypto", address!("FA2CEE4C10CE5E9c81E2C6d87567f8C87ECfF555")),
            ("mrcrypto", address!("519e9aa581e8a00cf4aa51ffc85b5e2bd2beca75")),
            ("yahya", address!("249265F9B06d2F7Ab5282126786ae3F73b1Ddd29")),
            ("nickypham", address!("7A510789FF98074bC6A75B06D0f447c7BA8b6842")),
            ("banklessdiscord", address!("dead000000000000000000000000000000000003")),
            ("banklesspod", address!("dead000000000000000000000000000000000004")),
            ("banklessnl", address!("dead000000000000000000000000000000000005")),
        ];
        Self::new(
            official
                .into_iter()
                .map(|(code, address)| ReferralEntry {
                    code: code.to_string(),
                    address,
                    outgoing_multiplier: 10,
                })
                .collect(),
        )
    }

    /// Resolves a referral code.
    ///
    /// Tries the directory, then a raw address, then an address-derived code. Returns `None`
    /// when the code cannot be attributed to anyone.
    pub fn lookup(&self, code: &str) -> Option<ReferralTarget> {
        if let Some(entry) = self.entries.iter().find(|e| e.code == code) {
            return Some(ReferralTarget {
                address: entry.address,
                outgoing_multiplier: entry.outgoing_multiplier,
            });
        }
        parse_address(code)
            .or_else(|| decode_address(code))
            .map(|address| ReferralTarget { address, outgoing_multiplier: 0 })
    }

    /// The exact codes credited to `address` as a referrer: its directory codes, its lowercase
    /// hex address and its address-derived code.
    pub fn codes_for(&self, address: Address) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.address == address)
            .map(|e| e.code.clone())
            .chain([format!("{address:#x}"), encode_address(address)])
            .collect()
    }
}

/// Derives the shareable referral code of an address.
pub fn encode_address(address: Address) -> String {
    URL_SAFE_NO_PAD.encode(address.as_slice())
}

/// Reverses [encode_address].
pub fn decode_address(code: &str) -> Option<Address> {
    let bytes = URL_SAFE_NO_PAD.decode(code.trim()).ok()?;
    (bytes.len() == 20).then(|| Address::from_slice(&bytes))
}

fn parse_address(code: &str) -> Option<Address> {
    if !code.starts_with("0x") {
        return None;
    }
    Address::from_str(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_directory_code() {
        let directory = ReferralDirectory::mainnet();
        let target = directory.lookup("gideon").unwrap();
        assert_eq!(target.address, address!("cc263863362fe3d31784cb467111de8ed9c95fb1"));
        assert_eq!(target.outgoing_multiplier, 10);
    }

    #[test]
    fn test_lookup_raw_and_encoded_address() {
        let directory = ReferralDirectory::mainnet();
        let holder = address!("ad9898452b692ef4fcf89517bb224306000a3625");

        let raw = directory.lookup("0xad9898452b692ef4fcf89517bb224306000a3625").unwrap();
        assert_eq!(raw, ReferralTarget { address: holder, outgoing_multiplier: 0 });

        let encoded = directory.lookup(&encode_address(holder)).unwrap();
        assert_eq!(encoded, ReferralTarget { address: holder, outgoing_multiplier: 0 });
    }

    #[test]
    fn test_lookup_invalid_code() {
        let directory = ReferralDirectory::mainnet();
        assert!(directory.lookup("not-a-code").is_none());
        assert!(directory.lookup("").is_none());
        assert!(directory.lookup("0x1234").is_none());
    }

    #[test]
    fn test_codes_for_owner() {
        let directory = ReferralDirectory::mainnet();
        let owner = address!("dead000000000000000000000000000000000001");
        let codes = directory.codes_for(owner);
        assert_eq!(
            codes,
            vec![
                "rethboost".to_string(),
                "0xdead000000000000000000000000000000000001".to_string(),
                encode_address(owner),
            ]
        );
        for code in &codes {
            assert_eq!(directory.lookup(code).unwrap().address, owner);
        }
    }
}
