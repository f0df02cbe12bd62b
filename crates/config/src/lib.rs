//! Cosmoscope configuration
use clap::Parser;
use url::Url;

/// Clickhouse database configuration options
#[derive(Debug, Clone, Parser)]
pub struct ClickhouseOpts {
    /// Clickhouse URL
    #[clap(long, env = "CLICKHOUSE_URL")]
    pub url: Url,
    /// Clickhouse database
    #[clap(long, env = "CLICKHOUSE_DB")]
    pub db: String,
    /// Clickhouse username
    #[clap(long, env = "CLICKHOUSE_USERNAME")]
    pub username: String,
    /// Clickhouse password
    #[clap(long, env = "CLICKHOUSE_PASSWORD")]
    pub password: String,
}

/// Node endpoint configuration options
#[derive(Debug, Clone, Parser)]
pub struct NodeOpts {
    /// Tendermint RPC URL (block, status and validator-set queries)
    #[clap(long, env = "TENDERMINT_RPC_URL")]
    pub rpc_url: Url,
    /// Cosmos LCD REST URL (staking and slashing queries)
    #[clap(long, env = "COSMOS_LCD_URL")]
    pub lcd_url: Url,
}

/// Chain identity configuration options
#[derive(Debug, Clone, Parser)]
pub struct ChainOpts {
    /// Chain ID used for the chain-status singleton
    #[clap(long, env = "CHAIN_ID")]
    pub chain_id: String,
    /// Bech32 human-readable prefix; `valcons`, `pub` and `valoperpub`
    /// variants are derived from it
    #[clap(long, env = "BECH32_PREFIX", default_value = "cosmos")]
    pub bech32_prefix: String,
}

/// Sync engine configuration options
#[derive(Debug, Clone, Parser)]
pub struct SyncOpts {
    /// Height floor used when the store is empty
    #[clap(long, env = "SYNC_START_HEIGHT", default_value = "0")]
    pub start_height: u64,
    /// Block time recorded for the very first synced height, in milliseconds
    #[clap(long, env = "SYNC_DEFAULT_BLOCK_TIME_MS", default_value = "5000")]
    pub default_block_time_ms: u64,
    /// Full validator-row upserts and uptime refresh happen every this many
    /// heights (and at the run boundaries)
    #[clap(long, env = "SYNC_VALIDATOR_UPDATE_WINDOW", default_value = "100")]
    pub validator_update_window: u64,
    /// Self-delegation sampling and profile refresh happen at the first
    /// height of a run and every this many heights
    #[clap(long, env = "SYNC_ENRICHMENT_WINDOW", default_value = "300")]
    pub enrichment_window: u64,
    /// Seconds between sync trigger attempts
    #[clap(long, env = "SYNC_POLL_INTERVAL_SECS", default_value = "30")]
    pub poll_interval_secs: u64,
}

/// Identity profile collaborator configuration options
#[derive(Debug, Clone, Parser)]
pub struct IdentityOpts {
    /// Keybase API base URL
    #[clap(long, env = "KEYBASE_URL", default_value = "https://keybase.io")]
    pub keybase_url: Url,
}

/// CLI options for cosmoscope
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// Node endpoint configuration
    #[clap(flatten)]
    pub node: NodeOpts,

    /// Chain identity configuration
    #[clap(flatten)]
    pub chain: ChainOpts,

    /// Sync engine configuration
    #[clap(flatten)]
    pub sync: SyncOpts,

    /// Identity profile collaborator configuration
    #[clap(flatten)]
    pub identity: IdentityOpts,

    /// If set, drop & re-create all tables (local/dev only)
    #[clap(long)]
    pub reset_db: bool,
}

#[cfg(test)]
mod tests {
    use super::Opts;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Opts::command().debug_assert()
    }
}
