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

//! Referral codes appended to Uniswap V3 `exactInputSingle` calls.

use crate::referrals::decode_address;

/// `exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))`
pub const EXACT_INPUT_SINGLE_SELECTOR: &str = "0x414bf389";

// Selector, eight argument words and one trailing referral word.
const EXACT_INPUT_SINGLE_WITH_REFERRAL_LEN: usize = 10 + 8 * 64 + 64;

/// Extracts the referral code a swap front end appended to an `exactInputSingle` call.
///
/// The trailing word holds a left padded UTF-8 address-derived code. Returns the referrer
/// address as a hex string, or `None` if the input does not carry a decodable code.
pub fn referral_from_exact_input_single(input: &str) -> Option<String> {
    if !input.starts_with(EXACT_INPUT_SINGLE_SELECTOR)
        || input.len() != EXACT_INPUT_SINGLE_WITH_REFERRAL_LEN
    {
        return None;
    }
    let word = hex::decode(input.get(input.len() - 64..)?).ok()?;
    let start = word.iter().position(|b| *b != 0)?;
    let code = std::str::from_utf8(&word[start..]).ok()?;
    decode_address(code).map(|address| format!("{address:#x}"))
}
