//! # Wallet Module
//!
//! The wallet provider seam. The core treats a provider as an opaque source
//! of one address; it validates whatever comes back before accepting it.

/// Source of the connected wallet's address.
pub trait WalletProvider {
    /// The connected address, or `None` if no wallet is connected.
    fn wallet_address(&self) -> Option<String>;
}

impl<P: WalletProvider + ?Sized> WalletProvider for &P {
    fn wallet_address(&self) -> Option<String> {
        (**self).wallet_address()
    }
}

impl WalletProvider for Option<String> {
    fn wallet_address(&self) -> Option<String> {
        self.clone()
    }
}
