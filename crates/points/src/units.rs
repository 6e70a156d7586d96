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

//! Fixed-point helpers shared by the accrual and EL point calculations.

use alloy::primitives::U256;

/// 10^18, the fixed-point scale of token amounts and points.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Multipliers are expressed in basis 100, i.e. `100` is 1.00x.
pub const MULTIPLIER_BASIS: u64 = 100;

/// Milliseconds in one hour.
pub const HOUR_MS: u64 = 3_600_000;

/// Milliseconds in one day.
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Returns `amount` whole tokens in 18 decimal fixed point.
pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * WAD
}

/// Scales `value` by a basis-100 multiplier, truncating.
pub fn apply_multiplier(value: U256, multiplier: u64) -> U256 {
    value * U256::from(multiplier) / U256::from(MULTIPLIER_BASIS)
}

/// Serializes [U256] values as base 10 strings.
///
/// Deserialization accepts both base 10 and `0x` prefixed hex strings.
pub mod dec_u256 {
    use std::str::FromStr;

    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let value = String::deserialize(deserializer)?;
        U256::from_str(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_matches_one_ether() {
        assert_eq!(WAD, U256::from(10u64).pow(U256::from(18)));
        assert_eq!(eth(3), U256::from(3_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_apply_multiplier_truncates() {
        assert_eq!(apply_multiplier(U256::from(1000), 10), U256::from(100));
        assert_eq!(apply_multiplier(U256::from(999), 15), U256::from(149));
    }
}
