//! # Validate Module
//!
//! Pure, total predicates over raw user input, and the uniform
//! [`Validator`] capability the schema binds to each field.
//!
//! None of the predicates panic, whatever the input.

use crate::field::FieldValue;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeSet;

/// Number of hex digits in an EVM address (20 bytes).
pub const ADDRESS_HEX_LEN: usize = 40;

/// Maximum length of a token symbol.
pub const MAX_TOKEN_SYMBOL_LEN: usize = 6;

// =============================================================================
// VALIDATION RESULT
// =============================================================================

/// Structured validity of a single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Validation {
    Valid,
    Invalid { reason: String },
}

impl Validation {
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason } => Some(reason),
        }
    }

    /// `Valid` when `ok`, otherwise `Invalid` with the given reason.
    #[must_use]
    pub fn check(ok: bool, reason: impl FnOnce() -> String) -> Self {
        if ok { Self::Valid } else { Self::invalid(reason()) }
    }
}

// =============================================================================
// VALIDATOR CAPABILITY
// =============================================================================

/// Maps a raw field value to a [`Validation`].
///
/// Implementations must be pure and total.
pub trait Validator: Send + Sync {
    fn check(&self, value: &FieldValue) -> Validation;
}

impl<F> Validator for F
where
    F: Fn(&FieldValue) -> Validation + Send + Sync,
{
    fn check(&self, value: &FieldValue) -> Validation {
        self(value)
    }
}

// =============================================================================
// RAW PREDICATES
// =============================================================================

/// True iff `input` is `0x` followed by exactly 40 hex digits.
///
/// Case-insensitive: all-lower, all-upper and checksum-cased forms pass.
#[must_use]
pub fn is_valid_address(input: &str) -> bool {
    input
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == ADDRESS_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// EIP-55 checksum casing of a well-formed address.
///
/// Returns `None` if the input fails [`is_valid_address`].
#[must_use]
pub fn to_checksum_address(input: &str) -> Option<String> {
    if !is_valid_address(input) {
        return None;
    }
    let lower = input[2..].to_ascii_lowercase();
    let hash = hex::encode(Keccak256::digest(lower.as_bytes()));

    let mut out = String::with_capacity(ADDRESS_HEX_LEN + 2);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(hash.chars()) {
        // nibble >= 8 means uppercase
        if c.is_ascii_alphabetic() && h.to_digit(16).is_some_and(|n| n >= 8) {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// True iff `input` is already in EIP-55 checksum casing.
#[must_use]
pub fn is_checksum_address(input: &str) -> bool {
    to_checksum_address(input).is_some_and(|c| c == input)
}

/// True iff every character is ASCII and in `[A-Za-z0-9 ]`.
///
/// The empty string is vacuously valid here; the `l1Name` field validator
/// adds the non-empty requirement.
#[must_use]
pub fn is_valid_l1_name(name: &str) -> bool {
    name.chars()
        .all(|c| (c as u32) <= 127 && (c.is_ascii_alphanumeric() || c == ' '))
}

/// Chain ids must be non-zero.
#[must_use]
pub fn is_valid_chain_id(id: u64) -> bool {
    id != 0
}

/// 1 to 6 ASCII alphanumerics.
#[must_use]
pub fn is_valid_token_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_TOKEN_SYMBOL_LEN
        && symbol.bytes().all(|b| b.is_ascii_alphanumeric())
}

// =============================================================================
// FIELD VALIDATORS
// =============================================================================

fn wrong_type(expected: &str) -> Validation {
    Validation::invalid(format!("expected {expected}"))
}

/// Validator for `evmChainId`.
pub fn chain_id_field(value: &FieldValue) -> Validation {
    match value {
        FieldValue::ChainId(id) => {
            Validation::check(is_valid_chain_id(*id), || "chain id must be non-zero".into())
        }
        _ => wrong_type("a chain id"),
    }
}

/// Validator for `l1Name`.
pub fn l1_name_field(value: &FieldValue) -> Validation {
    match value {
        FieldValue::Text(name) if name.is_empty() => Validation::invalid("name must not be empty"),
        FieldValue::Text(name) => Validation::check(is_valid_l1_name(name), || {
            "name may only contain ASCII letters, digits and spaces".into()
        }),
        _ => wrong_type("text"),
    }
}

/// Validator for `walletAddress`.
pub fn wallet_address_field(value: &FieldValue) -> Validation {
    match value {
        FieldValue::Address(addr) => Validation::check(is_valid_address(addr), || {
            format!("'{addr}' is not a 0x-prefixed 20-byte hex address")
        }),
        _ => wrong_type("an address"),
    }
}

/// Validator for `tokenSymbol`.
pub fn token_symbol_field(value: &FieldValue) -> Validation {
    match value {
        FieldValue::Text(symbol) => Validation::check(is_valid_token_symbol(symbol), || {
            format!("token symbol must be 1-{MAX_TOKEN_SYMBOL_LEN} ASCII letters or digits")
        }),
        _ => wrong_type("text"),
    }
}

/// Validator for `allocations`.
///
/// Every address must be well-formed, every balance non-zero, and no address
/// may appear twice (compared case-insensitively).
pub fn allocations_field(value: &FieldValue) -> Validation {
    let Some(list) = value.as_allocations() else {
        return wrong_type("a list of allocations");
    };

    let mut seen = BTreeSet::new();
    for alloc in list {
        if !is_valid_address(&alloc.address) {
            return Validation::invalid(format!("'{}' is not a valid address", alloc.address));
        }
        if alloc.balance == 0 {
            return Validation::invalid(format!("allocation to {} has zero balance", alloc.address));
        }
        if !seen.insert(alloc.address.to_ascii_lowercase()) {
            return Validation::invalid(format!("{} is allocated twice", alloc.address));
        }
    }
    Validation::Valid
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Allocation;
    use proptest::prelude::*;

    const EIP55_VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn address_accepts_all_casings() {
        for addr in EIP55_VECTORS {
            assert!(is_valid_address(addr));
            assert!(is_valid_address(&addr.to_ascii_lowercase()));
            assert!(is_valid_address(&format!("0x{}", addr[2..].to_ascii_uppercase())));
        }
    }

    #[test]
    fn address_rejects_malformed() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
        assert!(!is_valid_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!is_valid_address("0X5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        // 39 and 41 digits
        assert!(!is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAe"));
        assert!(!is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAedd"));
        assert!(!is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeg"));
        assert!(!is_valid_address(" 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[test]
    fn checksum_matches_eip55_vectors() {
        for addr in EIP55_VECTORS {
            let lower = addr.to_ascii_lowercase();
            assert_eq!(to_checksum_address(&lower).as_deref(), Some(addr));
            assert!(is_checksum_address(addr));
            assert!(!is_checksum_address(&lower));
        }
        assert_eq!(to_checksum_address("0x123"), None);
    }

    #[test]
    fn name_boundaries() {
        assert!(is_valid_l1_name("My Chain 1"));
        assert!(is_valid_l1_name(""));
        assert!(!is_valid_l1_name("Ça va?"));
        assert!(!is_valid_l1_name("dash-chain"));
        assert!(!is_valid_l1_name("tab\tchain"));
        assert!(!is_valid_l1_name("émoji 🚀"));
    }

    #[test]
    fn name_field_rejects_empty() {
        assert_eq!(
            l1_name_field(&FieldValue::Text(String::new())),
            Validation::invalid("name must not be empty")
        );
        assert!(l1_name_field(&FieldValue::Text("My Chain 1".into())).is_valid());
        assert!(!l1_name_field(&FieldValue::ChainId(1)).is_valid());
    }

    #[test]
    fn chain_id_field_rules() {
        assert!(chain_id_field(&FieldValue::ChainId(43114)).is_valid());
        assert!(!chain_id_field(&FieldValue::ChainId(0)).is_valid());
        assert!(!chain_id_field(&FieldValue::Text("43114".into())).is_valid());
    }

    #[test]
    fn token_symbol_rules() {
        assert!(is_valid_token_symbol("AVAX"));
        assert!(is_valid_token_symbol("TOK123"));
        assert!(!is_valid_token_symbol(""));
        assert!(!is_valid_token_symbol("TOOLONG"));
        assert!(!is_valid_token_symbol("T K"));
    }

    #[test]
    fn allocations_rules() {
        let a = EIP55_VECTORS[0];
        let b = EIP55_VECTORS[1];
        let ok = FieldValue::Allocations(vec![Allocation::new(a, 1), Allocation::new(b, 2)]);
        assert!(allocations_field(&ok).is_valid());

        let dup = FieldValue::Allocations(vec![
            Allocation::new(a, 1),
            Allocation::new(a.to_ascii_lowercase(), 2),
        ]);
        assert!(!allocations_field(&dup).is_valid());

        let zero = FieldValue::Allocations(vec![Allocation::new(a, 0)]);
        assert!(!allocations_field(&zero).is_valid());

        let bad = FieldValue::Allocations(vec![Allocation::new("0x12", 5)]);
        assert!(!allocations_field(&bad).is_valid());

        assert!(allocations_field(&FieldValue::Allocations(Vec::new())).is_valid());
    }

    #[test]
    fn closures_are_validators() {
        let even = |v: &FieldValue| {
            Validation::check(v.as_chain_id().is_some_and(|n| n % 2 == 0), || "odd".into())
        };
        assert!(Validator::check(&even, &FieldValue::ChainId(4)).is_valid());
        assert_eq!(Validator::check(&even, &FieldValue::ChainId(3)).reason(), Some("odd"));
    }

    proptest! {
        #[test]
        fn names_with_non_ascii_are_rejected(prefix in "[A-Za-z0-9 ]{0,8}", c in prop::char::range('\u{80}', char::MAX), suffix in "[A-Za-z0-9 ]{0,8}") {
            let name = format!("{prefix}{c}{suffix}");
            prop_assert!(!is_valid_l1_name(&name));
        }

        #[test]
        fn names_from_allowed_class_are_accepted(name in "[A-Za-z0-9 ]{0,32}") {
            prop_assert!(is_valid_l1_name(&name));
        }

        #[test]
        fn well_formed_addresses_are_accepted(hex in "[0-9a-fA-F]{40}") {
            let addr = format!("0x{hex}");
            prop_assert!(is_valid_address(&addr));
            let checksummed = to_checksum_address(&addr);
            prop_assert!(checksummed.is_some());
            let checksummed = checksummed.unwrap_or_default();
            prop_assert!(is_checksum_address(&checksummed));
            prop_assert_eq!(checksummed.to_ascii_lowercase(), addr.to_ascii_lowercase());
        }

        #[test]
        fn wrong_length_addresses_are_rejected(hex in "[0-9a-f]{0,80}".prop_filter("not 40", |h| h.len() != 40)) {
            let addr = format!("0x{hex}");
            prop_assert!(!is_valid_address(&addr));
        }

        #[test]
        fn unprefixed_addresses_are_rejected(s in "[^0x].{0,45}") {
            prop_assert!(!is_valid_address(&s));
        }
    }
}
