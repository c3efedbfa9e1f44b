//! # Genesis Builder
//!
//! Derives a Subnet-EVM style genesis document from a snapshot of the wizard
//! fields and the configured chain parameters.
//!
//! Derivation is pure: equal requests always produce byte-identical JSON.
//! Struct field order is the JSON key order and `alloc` is a `BTreeMap`.

use crate::error::GenesisGenerationError;
use crate::field::{FieldEntry, FieldKey, FieldValue};
use crate::validate::to_checksum_address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Native token decimals.
pub const TOKEN_DECIMALS: u32 = 18;

const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// =============================================================================
// PARAMETERS
// =============================================================================

/// Chain configuration constants that are not collected by wizard steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisParams {
    pub gas_limit: u64,
    /// Target seconds between blocks.
    pub target_block_rate: u64,
    /// Minimum base fee in wei.
    pub min_base_fee: u64,
    pub target_gas: u64,
    pub base_fee_change_denominator: u64,
    pub min_block_gas_cost: u64,
    pub max_block_gas_cost: u64,
    pub block_gas_cost_step: u64,
    /// Balance given to the connected wallet, in whole tokens.
    pub initial_balance: u64,
    pub warp_quorum_numerator: u64,
    pub require_primary_network_signers: bool,
    /// Restrict contract deployment to the wallet (as admin).
    pub deployer_allow_list: bool,
    /// Restrict transaction submission to the wallet (as admin).
    pub tx_allow_list: bool,
    /// Genesis block timestamp (unix seconds).
    pub timestamp: u64,
}

impl Default for GenesisParams {
    fn default() -> Self {
        Self {
            gas_limit: 12_000_000,
            target_block_rate: 2,
            min_base_fee: 25_000_000_000,
            target_gas: 60_000_000,
            base_fee_change_denominator: 36,
            min_block_gas_cost: 0,
            max_block_gas_cost: 1_000_000,
            block_gas_cost_step: 200_000,
            initial_balance: 1_000_000,
            warp_quorum_numerator: 67,
            require_primary_network_signers: false,
            deployer_allow_list: false,
            tx_allow_list: false,
            timestamp: 0,
        }
    }
}

impl GenesisParams {
    /// `initial_balance` converted to wei.
    #[must_use]
    pub fn initial_balance_wei(&self) -> u128 {
        u128::from(self.initial_balance).saturating_mul(10u128.pow(TOKEN_DECIMALS))
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    pub gas_limit: u64,
    pub target_block_rate: u64,
    pub min_base_fee: u64,
    pub target_gas: u64,
    pub base_fee_change_denominator: u64,
    pub min_block_gas_cost: u64,
    pub max_block_gas_cost: u64,
    pub block_gas_cost_step: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpConfig {
    pub block_timestamp: u64,
    pub quorum_numerator: u64,
    pub require_primary_network_signers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowListConfig {
    pub admin_addresses: Vec<String>,
    pub block_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub homestead_block: u64,
    pub eip150_block: u64,
    pub eip155_block: u64,
    pub eip158_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub petersburg_block: u64,
    pub istanbul_block: u64,
    pub muir_glacier_block: u64,
    pub fee_config: FeeConfig,
    pub warp_config: WarpConfig,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contract_deployer_allow_list_config: Option<AllowListConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_allow_list_config: Option<AllowListConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Hex-encoded wei.
    pub balance: String,
}

/// The derived genesis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    pub config: ChainConfig,
    /// Keyed by lowercase hex address without the `0x` prefix.
    pub alloc: BTreeMap<String, GenesisAccount>,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    pub number: String,
    pub gas_used: String,
    pub parent_hash: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token_symbol: Option<String>,
}

impl Genesis {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, GenesisGenerationError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GenesisGenerationError::Serialization(e.to_string()))
    }

    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Sum of all allocated balances in wei.
    ///
    /// Returns `None` if a balance is not valid hex.
    #[must_use]
    pub fn total_supply(&self) -> Option<u128> {
        self.alloc.values().try_fold(0u128, |acc, account| {
            let hex = account.balance.strip_prefix("0x")?;
            let value = u128::from_str_radix(hex, 16).ok()?;
            acc.checked_add(value)
        })
    }
}

fn hex_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

// =============================================================================
// REQUEST
// =============================================================================

/// Everything a derivation needs: the field snapshot and the parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisRequest {
    fields: BTreeMap<FieldKey, FieldEntry>,
    params: GenesisParams,
}

impl GenesisRequest {
    #[must_use]
    pub fn new(fields: BTreeMap<FieldKey, FieldEntry>, params: GenesisParams) -> Self {
        Self { fields, params }
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<FieldKey, FieldEntry> {
        &self.fields
    }

    #[must_use]
    pub fn params(&self) -> &GenesisParams {
        &self.params
    }

    /// A present field, rejected if its stored validation failed.
    fn valid_field(&self, key: FieldKey) -> Result<Option<&FieldValue>, GenesisGenerationError> {
        match self.fields.get(&key) {
            None => Ok(None),
            Some(entry) => match entry.validation.reason() {
                None => Ok(Some(&entry.value)),
                Some(reason) => Err(GenesisGenerationError::InvalidField {
                    field: key,
                    reason: reason.to_string(),
                }),
            },
        }
    }

    fn type_error(key: FieldKey) -> GenesisGenerationError {
        GenesisGenerationError::InvalidField {
            field: key,
            reason: "value has the wrong type".into(),
        }
    }

    /// Derive the genesis document.
    pub fn derive(&self) -> Result<Genesis, GenesisGenerationError> {
        let chain_id = self
            .valid_field(FieldKey::EvmChainId)?
            .ok_or(GenesisGenerationError::MissingChainId)?
            .as_chain_id()
            .ok_or_else(|| Self::type_error(FieldKey::EvmChainId))?;

        let chain_name = self
            .valid_field(FieldKey::L1Name)?
            .map(|v| v.as_text().map(str::to_string).ok_or_else(|| Self::type_error(FieldKey::L1Name)))
            .transpose()?;

        let token_symbol = self
            .valid_field(FieldKey::TokenSymbol)?
            .map(|v| {
                v.as_text()
                    .map(str::to_string)
                    .ok_or_else(|| Self::type_error(FieldKey::TokenSymbol))
            })
            .transpose()?;

        let owner = self
            .valid_field(FieldKey::WalletAddress)?
            .map(|v| {
                v.as_text()
                    .and_then(to_checksum_address)
                    .ok_or_else(|| Self::type_error(FieldKey::WalletAddress))
            })
            .transpose()?;

        let extra = match self.valid_field(FieldKey::Allocations)? {
            None => &[][..],
            Some(v) => v
                .as_allocations()
                .ok_or_else(|| Self::type_error(FieldKey::Allocations))?,
        };

        let mut balances: BTreeMap<String, u128> = BTreeMap::new();
        let mut total: u128 = 0;
        let owner_balance = owner.as_ref().map(|addr| (addr.clone(), self.params.initial_balance_wei()));
        let explicit = extra.iter().map(|a| (a.address.clone(), a.balance));

        for (address, balance) in owner_balance.into_iter().chain(explicit) {
            let key = address.trim_start_matches("0x").to_ascii_lowercase();
            if balances.insert(key, balance).is_some() {
                return Err(GenesisGenerationError::DuplicateAllocation { address });
            }
            total = total
                .checked_add(balance)
                .ok_or(GenesisGenerationError::BalanceOverflow)?;
        }

        let admin_list = |enabled: bool| -> Result<Option<AllowListConfig>, GenesisGenerationError> {
            if !enabled {
                return Ok(None);
            }
            let admin = owner.clone().ok_or_else(|| GenesisGenerationError::InvalidField {
                field: FieldKey::WalletAddress,
                reason: "a connected wallet is required as allow-list admin".into(),
            })?;
            Ok(Some(AllowListConfig {
                admin_addresses: vec![admin],
                block_timestamp: 0,
            }))
        };

        let p = &self.params;
        let config = ChainConfig {
            chain_id,
            homestead_block: 0,
            eip150_block: 0,
            eip155_block: 0,
            eip158_block: 0,
            byzantium_block: 0,
            constantinople_block: 0,
            petersburg_block: 0,
            istanbul_block: 0,
            muir_glacier_block: 0,
            fee_config: FeeConfig {
                gas_limit: p.gas_limit,
                target_block_rate: p.target_block_rate,
                min_base_fee: p.min_base_fee,
                target_gas: p.target_gas,
                base_fee_change_denominator: p.base_fee_change_denominator,
                min_block_gas_cost: p.min_block_gas_cost,
                max_block_gas_cost: p.max_block_gas_cost,
                block_gas_cost_step: p.block_gas_cost_step,
            },
            warp_config: WarpConfig {
                block_timestamp: p.timestamp,
                quorum_numerator: p.warp_quorum_numerator,
                require_primary_network_signers: p.require_primary_network_signers,
            },
            contract_deployer_allow_list_config: admin_list(p.deployer_allow_list)?,
            tx_allow_list_config: admin_list(p.tx_allow_list)?,
        };

        debug!(
            chain_id,
            accounts = balances.len(),
            total_wei = %total,
            "derived genesis"
        );

        Ok(Genesis {
            config,
            alloc: balances
                .into_iter()
                .map(|(addr, balance)| (addr, GenesisAccount { balance: hex_quantity(balance) }))
                .collect(),
            nonce: "0x0".into(),
            timestamp: hex_quantity(u128::from(p.timestamp)),
            extra_data: "0x".into(),
            gas_limit: hex_quantity(u128::from(p.gas_limit)),
            difficulty: "0x0".into(),
            mix_hash: ZERO_HASH.into(),
            coinbase: ZERO_ADDRESS.into(),
            number: "0x0".into(),
            gas_used: "0x0".into(),
            parent_hash: ZERO_HASH.into(),
            chain_name,
            token_symbol,
        })
    }

    /// Derive and render as pretty JSON.
    pub fn render(&self) -> Result<(Genesis, String), GenesisGenerationError> {
        let genesis = self.derive()?;
        let json = genesis.to_json_pretty()?;
        Ok((genesis, json))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Allocation;
    use crate::validate::Validation;

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const OTHER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    fn valid(value: FieldValue) -> FieldEntry {
        FieldEntry {
            value,
            validation: Validation::Valid,
        }
    }

    fn request(fields: Vec<(FieldKey, FieldEntry)>) -> GenesisRequest {
        GenesisRequest::new(fields.into_iter().collect(), GenesisParams::default())
    }

    #[test]
    fn missing_chain_id_fails() {
        let req = request(vec![(FieldKey::L1Name, valid(FieldValue::Text("A".into())))]);
        assert_eq!(req.derive(), Err(GenesisGenerationError::MissingChainId));
    }

    #[test]
    fn invalid_chain_id_fails() {
        let req = request(vec![(
            FieldKey::EvmChainId,
            FieldEntry {
                value: FieldValue::ChainId(0),
                validation: Validation::invalid("chain id must be non-zero"),
            },
        )]);
        assert!(matches!(
            req.derive(),
            Err(GenesisGenerationError::InvalidField {
                field: FieldKey::EvmChainId,
                ..
            })
        ));
    }

    #[test]
    fn minimal_genesis_has_chain_id_and_no_alloc() {
        let req = request(vec![(FieldKey::EvmChainId, valid(FieldValue::ChainId(43114)))]);
        let genesis = req.derive();
        assert!(genesis.is_ok());
        let genesis = genesis.unwrap_or_else(|_| unreachable!());
        assert_eq!(genesis.chain_id(), 43114);
        assert!(genesis.alloc.is_empty());
        assert_eq!(genesis.gas_limit, "0xb71b00");
        assert_eq!(genesis.chain_name, None);
    }

    #[test]
    fn owner_gets_initial_balance() {
        let req = request(vec![
            (FieldKey::EvmChainId, valid(FieldValue::ChainId(99))),
            (FieldKey::WalletAddress, valid(FieldValue::Address(OWNER.to_ascii_lowercase()))),
        ]);
        let genesis = req.derive().unwrap_or_else(|e| unreachable!("{e}"));
        let key = OWNER[2..].to_ascii_lowercase();
        let account = genesis.alloc.get(&key).map(|a| a.balance.clone());
        // 1_000_000 * 10^18
        assert_eq!(account.as_deref(), Some("0xd3c21bcecceda1000000"));
        assert_eq!(genesis.total_supply(), Some(GenesisParams::default().initial_balance_wei()));
    }

    #[test]
    fn explicit_allocations_are_merged() {
        let req = request(vec![
            (FieldKey::EvmChainId, valid(FieldValue::ChainId(99))),
            (FieldKey::WalletAddress, valid(FieldValue::Address(OWNER.into()))),
            (
                FieldKey::Allocations,
                valid(FieldValue::Allocations(vec![Allocation::new(OTHER, 255)])),
            ),
        ]);
        let genesis = req.derive().unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(genesis.alloc.len(), 2);
        let other = genesis.alloc.get(&OTHER[2..].to_ascii_lowercase()).map(|a| a.balance.as_str());
        assert_eq!(other, Some("0xff"));
    }

    #[test]
    fn allocation_to_owner_is_duplicate() {
        let req = request(vec![
            (FieldKey::EvmChainId, valid(FieldValue::ChainId(99))),
            (FieldKey::WalletAddress, valid(FieldValue::Address(OWNER.into()))),
            (
                FieldKey::Allocations,
                valid(FieldValue::Allocations(vec![Allocation::new(OWNER.to_ascii_lowercase(), 1)])),
            ),
        ]);
        assert!(matches!(
            req.derive(),
            Err(GenesisGenerationError::DuplicateAllocation { .. })
        ));
    }

    #[test]
    fn balance_overflow_is_reported() {
        let req = request(vec![
            (FieldKey::EvmChainId, valid(FieldValue::ChainId(99))),
            (
                FieldKey::Allocations,
                valid(FieldValue::Allocations(vec![
                    Allocation::new(OWNER, u128::MAX),
                    Allocation::new(OTHER, 1),
                ])),
            ),
        ]);
        assert_eq!(req.derive(), Err(GenesisGenerationError::BalanceOverflow));
    }

    #[test]
    fn allow_lists_need_a_wallet() {
        let params = GenesisParams {
            deployer_allow_list: true,
            ..GenesisParams::default()
        };
        let fields: BTreeMap<_, _> =
            [(FieldKey::EvmChainId, valid(FieldValue::ChainId(5)))].into_iter().collect();
        let without = GenesisRequest::new(fields.clone(), params.clone());
        assert!(matches!(
            without.derive(),
            Err(GenesisGenerationError::InvalidField {
                field: FieldKey::WalletAddress,
                ..
            })
        ));

        let mut with_wallet = fields;
        with_wallet.insert(FieldKey::WalletAddress, valid(FieldValue::Address(OWNER.into())));
        let genesis = GenesisRequest::new(with_wallet, params)
            .derive()
            .unwrap_or_else(|e| unreachable!("{e}"));
        let admins = genesis
            .config
            .contract_deployer_allow_list_config
            .map(|c| c.admin_addresses);
        assert_eq!(admins, Some(vec![OWNER.to_string()]));
        assert!(genesis.config.tx_allow_list_config.is_none());
    }

    #[test]
    fn json_uses_subnet_evm_keys_and_is_deterministic() {
        let req = request(vec![
            (FieldKey::EvmChainId, valid(FieldValue::ChainId(43114))),
            (FieldKey::L1Name, valid(FieldValue::Text("My Chain 1".into()))),
        ]);
        let (_, first) = req.render().unwrap_or_else(|e| unreachable!("{e}"));
        let (_, second) = req.render().unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(first, second);

        for key in ["\"chainId\": 43114", "\"feeConfig\"", "\"muirGlacierBlock\"", "\"chainName\": \"My Chain 1\""] {
            assert!(first.contains(key), "missing {key}");
        }
        assert!(!first.contains("tokenSymbol"));
        assert!(!first.contains("txAllowListConfig"));
        // config comes first
        assert!(first.find("\"config\"") < first.find("\"alloc\""));
    }

    #[test]
    fn params_fill_missing_toml_style_keys() {
        let parsed: GenesisParams =
            serde_json::from_str(r#"{"gas_limit": 8000000}"#).unwrap_or_default();
        assert_eq!(parsed.gas_limit, 8_000_000);
        assert_eq!(parsed.target_block_rate, GenesisParams::default().target_block_rate);
    }
}
