//! # Wallet Providers
//!
//! Concrete [`WalletProvider`]s for the command line. There is no browser
//! extension to talk to, so the "connected" address comes from a flag, the
//! config file or the environment.

use l1_launcher_core::WalletProvider;

/// Environment variable read by [`EnvWallet::default`].
pub const WALLET_ENV_VAR: &str = "L1_LAUNCHER_WALLET";

/// A fixed address, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticWallet {
    address: Option<String>,
}

impl StaticWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    /// A provider with no wallet connected.
    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl WalletProvider for StaticWallet {
    fn wallet_address(&self) -> Option<String> {
        self.address.clone()
    }
}

/// Reads the address from an environment variable at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvWallet {
    var: String,
}

impl EnvWallet {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvWallet {
    fn default() -> Self {
        Self::new(WALLET_ENV_VAR)
    }
}

impl WalletProvider for EnvWallet {
    fn wallet_address(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Tries each provider in order and returns the first address found.
pub struct ChainedWallet {
    providers: Vec<Box<dyn WalletProvider + Send + Sync>>,
}

impl ChainedWallet {
    pub fn new() -> Self {
        Self { providers: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, provider: impl WalletProvider + Send + Sync + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl Default for ChainedWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletProvider for ChainedWallet {
    fn wallet_address(&self) -> Option<String> {
        self.providers.iter().find_map(|p| p.wallet_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_wallet_returns_its_address() {
        assert_eq!(StaticWallet::new("0xabc").wallet_address().as_deref(), Some("0xabc"));
        assert_eq!(StaticWallet::disconnected().wallet_address(), None);
    }

    #[test]
    fn env_wallet_without_variable_is_disconnected() {
        let wallet = EnvWallet::new("L1_LAUNCHER_TEST_VARIABLE_THAT_IS_NEVER_SET");
        assert_eq!(wallet.wallet_address(), None);
    }

    #[test]
    fn chained_wallet_takes_first_hit() {
        let wallet = ChainedWallet::new()
            .with(StaticWallet::disconnected())
            .with(StaticWallet::new("0x01"))
            .with(StaticWallet::new("0x02"));
        assert_eq!(wallet.wallet_address().as_deref(), Some("0x01"));
        assert_eq!(ChainedWallet::new().wallet_address(), None);
    }
}
