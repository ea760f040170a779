use anyhow::Context as _;
use kiln_types::U256;
use serde::Deserialize;

/// Configuration of the sandbox node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SandboxConfig {
    /// Chain id of the sandbox network.
    #[serde(default = "SandboxConfig::default_chain_id")]
    pub chain_id: u32,
    /// Gas price (in wei) the node advertises to clients building transactions.
    #[serde(default = "SandboxConfig::default_gas_price")]
    pub gas_price: u64,
    /// Number of pre-funded dev accounts created at genesis.
    #[serde(default = "SandboxConfig::default_dev_accounts")]
    pub dev_accounts: usize,
    /// Balance, in ether, each dev account is funded with at genesis.
    #[serde(default = "SandboxConfig::default_dev_balance")]
    pub dev_balance: u64,
    /// Capacity of the storage values cache in bytes.
    #[serde(default = "SandboxConfig::default_values_cache_capacity")]
    pub values_cache_capacity: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            chain_id: Self::default_chain_id(),
            gas_price: Self::default_gas_price(),
            dev_accounts: Self::default_dev_accounts(),
            dev_balance: Self::default_dev_balance(),
            values_cache_capacity: Self::default_values_cache_capacity(),
        }
    }
}

impl SandboxConfig {
    const fn default_chain_id() -> u32 {
        1337
    }

    const fn default_gas_price() -> u64 {
        20_000_000_000 // 20 gwei
    }

    const fn default_dev_accounts() -> usize {
        10
    }

    const fn default_dev_balance() -> u64 {
        100
    }

    const fn default_values_cache_capacity() -> u64 {
        32 << 20 // 32 MiB
    }

    /// Loads the configuration from `KILN_SANDBOX_`-prefixed environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed("KILN_SANDBOX_")
            .from_env()
            .context("failed loading sandbox config from env")
    }

    pub fn dev_balance_wei(&self) -> U256 {
        U256::from(self.dev_balance) * U256::exp10(18)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = SandboxConfig::default();
        assert_eq!(config.chain_id, 1337);
        assert_eq!(config.dev_accounts, 10);
        assert_eq!(config.dev_balance_wei(), U256::exp10(20));
    }

    #[test]
    fn config_can_be_loaded_from_env() {
        std::env::set_var("KILN_SANDBOX_CHAIN_ID", "271");
        std::env::set_var("KILN_SANDBOX_DEV_ACCOUNTS", "3");
        let config = SandboxConfig::from_env().unwrap();
        std::env::remove_var("KILN_SANDBOX_CHAIN_ID");
        std::env::remove_var("KILN_SANDBOX_DEV_ACCOUNTS");

        assert_eq!(config.chain_id, 271);
        assert_eq!(config.dev_accounts, 3);
        // Unset variables fall back to defaults.
        assert_eq!(config.gas_price, SandboxConfig::default_gas_price());
    }
}
