//! Parsed settings document model.
//!
//! The document is a hierarchy of named entries: orderbooks reference a
//! network, orders reference a network and an orderbook, deployments
//! reference an order. References are plain string keys and may dangle
//! while a document and the persisted selection disagree; the session
//! cascade repairs that, so nothing here validates cross-references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Key into `ConfigDocument::networks`.
pub type NetworkRef = String;
/// Key into `ConfigDocument::subgraphs`.
pub type SubgraphRef = String;
/// Key into `ConfigDocument::orderbooks`.
pub type OrderbookRef = String;
/// Key into `ConfigDocument::orders`.
pub type OrderRef = String;
/// Key into `ConfigDocument::deployments`.
pub type DeploymentRef = String;

/// A chain the desk can operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    /// RPC endpoint for the chain.
    pub rpc: Url,
    pub chain_id: u64,
    /// Optional display label; falls back to the mapping key.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// An orderbook contract on one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Orderbook {
    pub network: NetworkRef,
    /// Contract address, kept opaque; validation happens outside the core.
    pub address: String,
    #[serde(default)]
    pub subgraph: Option<SubgraphRef>,
    #[serde(default)]
    pub label: Option<String>,
}

/// An order definition tied to a network and (optionally) an orderbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Order {
    pub network: NetworkRef,
    #[serde(default)]
    pub orderbook: Option<OrderbookRef>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A deployable instance of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Deployment {
    pub order: OrderRef,
    #[serde(default)]
    pub label: Option<String>,
}

/// The parsed settings document.
///
/// Every mapping preserves document insertion order; default selection
/// ("first key") depends on it. The document is recreated on every parse,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDocument {
    #[serde(default)]
    pub networks: IndexMap<NetworkRef, Network>,
    #[serde(default)]
    pub subgraphs: IndexMap<SubgraphRef, Url>,
    #[serde(default)]
    pub orderbooks: IndexMap<OrderbookRef, Orderbook>,
    #[serde(default)]
    pub orders: IndexMap<OrderRef, Order>,
    #[serde(default)]
    pub deployments: IndexMap<DeploymentRef, Deployment>,
}

impl ConfigDocument {
    /// True when all mappings are empty (the parse-failure fallback state).
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
            && self.subgraphs.is_empty()
            && self.orderbooks.is_empty()
            && self.orders.is_empty()
            && self.deployments.is_empty()
    }

    /// Orderbooks belonging to the given network, in document order.
    ///
    /// Returns an empty mapping when no network is selected; an orderbook
    /// cannot be active without an active network.
    pub fn orderbooks_for_network(
        &self,
        network: Option<&NetworkRef>,
    ) -> IndexMap<OrderbookRef, Orderbook> {
        let Some(network) = network else {
            return IndexMap::new();
        };
        self.orderbooks
            .iter()
            .filter(|(_, ob)| ob.network == *network)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Deployments whose underlying order matches the given network and
    /// orderbook, in document order.
    ///
    /// Deployments reference orders, not networks, so the filter goes
    /// through the `orders` indirection. Deployments with a dangling order
    /// reference are skipped rather than treated as a fault.
    pub fn deployments_for(
        &self,
        network: Option<&NetworkRef>,
        orderbook: Option<&OrderbookRef>,
    ) -> IndexMap<DeploymentRef, Deployment> {
        let (Some(network), Some(orderbook)) = (network, orderbook) else {
            return IndexMap::new();
        };
        self.deployments
            .iter()
            .filter(|(_, dep)| {
                self.orders.get(&dep.order).is_some_and(|order| {
                    order.network == *network && order.orderbook.as_deref() == Some(orderbook)
                })
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ConfigDocument {
        serde_yaml::from_str(
            r#"
networks:
  polygon:
    rpc: https://rpc.example/polygon
    chain-id: 137
  mainnet:
    rpc: https://rpc.example/eth
    chain-id: 1
    label: Ethereum
orderbooks:
  ob-poly:
    network: polygon
    address: "0x1111111111111111111111111111111111111111"
  ob-eth:
    network: mainnet
    address: "0x2222222222222222222222222222222222222222"
orders:
  order-a:
    network: polygon
    orderbook: ob-poly
deployments:
  dep-a:
    order: order-a
  dep-dangling:
    order: missing-order
"#,
        )
        .unwrap()
    }

    #[test]
    fn mappings_preserve_document_order() {
        let doc = doc();
        let keys: Vec<_> = doc.networks.keys().collect();
        assert_eq!(keys, vec!["polygon", "mainnet"]);
    }

    #[test]
    fn missing_mappings_default_to_empty() {
        let doc: ConfigDocument = serde_yaml::from_str("networks: {}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn orderbooks_filter_by_network() {
        let doc = doc();
        let net = "polygon".to_string();
        let obs = doc.orderbooks_for_network(Some(&net));
        assert_eq!(obs.keys().collect::<Vec<_>>(), vec!["ob-poly"]);
        assert!(doc.orderbooks_for_network(None).is_empty());
    }

    #[test]
    fn deployments_filter_through_order_indirection() {
        let doc = doc();
        let net = "polygon".to_string();
        let ob = "ob-poly".to_string();
        let deps = doc.deployments_for(Some(&net), Some(&ob));
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["dep-a"]);

        // Dangling order reference is skipped, not an error.
        assert!(!deps.contains_key("dep-dangling"));

        // Wrong orderbook matches nothing.
        let other = "ob-eth".to_string();
        assert!(doc.deployments_for(Some(&net), Some(&other)).is_empty());
    }
}
