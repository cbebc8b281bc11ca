//! RPC endpoint configuration
//!
//! Resolution order, following Ethereum ecosystem conventions:
//! 1. `VOTING_RPC_URL` - applies to whichever chain the contract lives on
//! 2. Per-chain env vars (ETH_RPC_URL, SEPOLIA_RPC_URL, LOCAL_RPC_URL)
//! 3. Provider API keys (ALCHEMY_API_KEY, INFURA_API_KEY)
//! 4. Public RPC fallbacks - for testing only
//!
//! ```bash
//! export SEPOLIA_RPC_URL="https://eth-sepolia.g.alchemy.com/v2/YOUR_KEY"
//! ```

use std::collections::HashMap;

/// RPC configuration for the chains a voting contract may be deployed on
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
    /// Explicit override for the configured chain
    override_url: Option<String>,
}

/// Chain ID constants
pub mod chains {
    pub const ETHEREUM: u64 = 1;
    pub const SEPOLIA: u64 = 11155111;
    pub const LOCAL: u64 = 31337;
}

mod env_vars {
    pub const VOTING_RPC_URL: &str = "VOTING_RPC_URL";

    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";
    pub const LOCAL_RPC_URL: &str = "LOCAL_RPC_URL";

    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const ETHEREUM: &str = "https://eth.llamarpc.com";
    pub const SEPOLIA: &str = "https://rpc.sepolia.org";
    pub const LOCAL: &str = "http://127.0.0.1:8545";
}

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        let override_url = std::env::var(env_vars::VOTING_RPC_URL).ok();
        if override_url.is_some() {
            tracing::debug!("Using VOTING_RPC_URL for the configured chain");
        }

        if let Ok(url) = std::env::var(env_vars::ETH_RPC_URL) {
            tracing::debug!("Using ETH_RPC_URL for Ethereum");
            urls.insert(chains::ETHEREUM, url);
        }
        if let Ok(url) = std::env::var(env_vars::SEPOLIA_RPC_URL) {
            tracing::debug!("Using SEPOLIA_RPC_URL for Sepolia");
            urls.insert(chains::SEPOLIA, url);
        }
        if let Ok(url) = std::env::var(env_vars::LOCAL_RPC_URL) {
            tracing::debug!("Using LOCAL_RPC_URL for local devnet");
            urls.insert(chains::LOCAL, url);
        }

        if !urls.contains_key(&chains::ETHEREUM) && !urls.contains_key(&chains::SEPOLIA) {
            if let Ok(key) = std::env::var(env_vars::ALCHEMY_API_KEY) {
                tracing::info!("Building RPC URLs from ALCHEMY_API_KEY");
                urls.insert(
                    chains::ETHEREUM,
                    format!("https://eth-mainnet.g.alchemy.com/v2/{}", key),
                );
                urls.insert(
                    chains::SEPOLIA,
                    format!("https://eth-sepolia.g.alchemy.com/v2/{}", key),
                );
            } else if let Ok(key) = std::env::var(env_vars::INFURA_API_KEY) {
                tracing::info!("Building RPC URLs from INFURA_API_KEY");
                urls.insert(
                    chains::ETHEREUM,
                    format!("https://mainnet.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::SEPOLIA,
                    format!("https://sepolia.infura.io/v3/{}", key),
                );
            }
        }

        urls.entry(chains::ETHEREUM)
            .or_insert_with(|| public_rpcs::ETHEREUM.to_string());
        urls.entry(chains::SEPOLIA)
            .or_insert_with(|| public_rpcs::SEPOLIA.to_string());
        urls.entry(chains::LOCAL)
            .or_insert_with(|| public_rpcs::LOCAL.to_string());

        Self { urls, override_url }
    }

    /// RPC URL for a chain, honouring `VOTING_RPC_URL`
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.override_url
            .as_deref()
            .or_else(|| self.urls.get(&chain_id).map(|s| s.as_str()))
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
