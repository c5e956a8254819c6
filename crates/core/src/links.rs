//! Dashboard links printed after a successful verification

/// Dashboard network slug for a chain id
pub fn network_name(chain_id: &str) -> Option<&'static str> {
    let name = match chain_id.trim() {
        "1" => "mainnet",
        "3" => "ropsten",
        "4" => "rinkeby",
        "5" => "goerli",
        "10" => "optimistic",
        "30" => "rsk",
        "31" => "rsk-testnet",
        "42" => "kovan",
        "56" => "binance",
        "97" => "rialto",
        "99" => "poa-core",
        "100" => "xdai",
        "106" => "velas-mainnet",
        "137" => "polygon",
        "250" => "fantom",
        "420" => "optimistic-goerli",
        "1284" => "moonbeam",
        "1285" => "moonriver",
        "1287" => "moonbase-alpha",
        "8453" => "base",
        "42161" => "arbitrum",
        "42220" => "celo",
        "43113" => "avalanche-fuji",
        "43114" => "avalanche",
        "80001" => "polygon-mumbai",
        "84531" => "base-goerli",
        "421613" => "arbitrum-goerli",
        "11155111" => "sepolia",
        _ => return None,
    };
    Some(name)
}

/// Link to a publicly verified contract.
///
/// Chains missing from the name table fall back to the numeric chain id.
pub fn public_contract_url(dashboard_base: &str, network_id: &str, address: &str) -> String {
    let network = network_name(network_id).unwrap_or(network_id);
    format!("{dashboard_base}/contract/{network}/{address}")
}

/// Link to the contracts page of a project
pub fn project_contracts_url(dashboard_base: &str, username: &str, project: &str) -> String {
    format!("{dashboard_base}/{username}/{project}/contracts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_name() {
        assert_eq!(network_name("1"), Some("mainnet"));
        assert_eq!(network_name(" 5 "), Some("goerli"));
        assert_eq!(network_name("999999"), None);
    }

    #[test]
    fn test_public_contract_url() {
        assert_eq!(
            public_contract_url("https://dashboard.tenderly.co", "1", "0xabc"),
            "https://dashboard.tenderly.co/contract/mainnet/0xabc"
        );
        assert_eq!(
            public_contract_url("https://dashboard.tenderly.co", "999999", "0xabc"),
            "https://dashboard.tenderly.co/contract/999999/0xabc"
        );
    }

    #[test]
    fn test_project_contracts_url() {
        assert_eq!(
            project_contracts_url("https://dashboard.tenderly.co", "alice", "demo"),
            "https://dashboard.tenderly.co/alice/demo/contracts"
        );
    }
}
