//! Local signing key
//!
//! The only place a private key exists. It is read into a
//! [`SecretString`], parsed into alloy's `PrivateKeySigner`, and from then
//! on only reachable through the [`EthereumWallet`] handed to the RPC
//! provider. Nothing here is serializable and `Debug` is redacted.

use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

pub struct SecureWallet {
    address: Address,
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Load the key from an environment variable
    pub fn from_env(var_name: &str) -> Result<Self> {
        let key = std::env::var(var_name).map_err(|_| {
            Error::Wallet(format!(
                "Environment variable {} not set. Required for the local wallet.",
                var_name
            ))
        })?;

        Self::from_secret(SecretString::from(key))
    }

    pub fn from_hex(key_hex: &str) -> Result<Self> {
        Self::from_secret(SecretString::from(key_hex.to_string()))
    }

    fn from_secret(key: SecretString) -> Result<Self> {
        let exposed = key.expose_secret();
        let key_hex = exposed.strip_prefix("0x").unwrap_or(exposed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signing handle for alloy providers; never exposes the raw key
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known local development key
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_hex() {
        let wallet = SecureWallet::from_hex(DEV_KEY).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        let unprefixed = SecureWallet::from_hex(&DEV_KEY[2..]).unwrap();
        assert_eq!(unprefixed.address(), wallet.address());
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            SecureWallet::from_hex("0xnothex").unwrap_err(),
            Error::Wallet(_)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let wallet = SecureWallet::from_hex(DEV_KEY).unwrap();
        let debug_str = format!("{:?}", wallet);

        assert!(!debug_str.contains("ac0974bec"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_env_var() {
        let err = SecureWallet::from_env("VOTING_CLIENT_TEST_UNSET_KEY").unwrap_err();
        assert!(err.to_string().contains("VOTING_CLIENT_TEST_UNSET_KEY"));
    }
}
