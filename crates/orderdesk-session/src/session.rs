//! The settings session: every cell of the selection graph plus the
//! cascade-reset edges, owned by one context object.
//!
//! Cascade rules, in the order they fire on any trigger:
//! 1. document settled: reset network if the active ref is undefined or
//!    gone; reset orderbook/deployment if defined but gone from the
//!    document
//! 2. network cleared: reset orderbook
//! 3. filtered orderbooks recomputed: reset orderbook if it no longer
//!    belongs
//! 4. orderbook cleared: reset deployment
//! 5. filtered deployments recomputed: reset deployment if it no longer
//!    belongs
//!
//! Every reset picks the first key of the relevant mapping in document
//! order, or clears the selection when the mapping is empty, so the
//! application keeps a usable default after any configuration edit. No
//! rule throws; dangling references degrade to `None`.

use indexmap::IndexMap;
use orderdesk_chain::ChainMetadata;
use orderdesk_core::{
    ConfigDocument, Deployment, DeploymentRef, ErrorReporter, KvStore, Network, NetworkRef,
    Orderbook, OrderbookRef,
};
use orderdesk_reactive::{
    async_derived, cached_string, cached_string_optional, derived, derived2, derived3,
    AsyncDerived, CachedCell, Derived, Observable, Subscription,
};
use orderdesk_settings::{ParseError, SettingsParser};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const KEY_SETTINGS_TEXT: &str = "settings";
const KEY_ACTIVE_NETWORK: &str = "settings.activeNetworkRef";
const KEY_ACTIVE_ORDERBOOK: &str = "settings.activeOrderbookRef";
const KEY_ACTIVE_DEPLOYMENT: &str = "settings.activeDeploymentRef";

/// One application session's selection state.
///
/// Constructed once per session, inside a tokio runtime. All cell handles
/// returned by the accessors are read/subscribe views; selections change
/// only through the `set_*`/`reset_*` methods here or through the cascade.
pub struct SettingsSession {
    settings_text: CachedCell<String>,
    settings: AsyncDerived<ConfigDocument>,

    active_network_ref: CachedCell<Option<NetworkRef>>,
    active_network: Derived<Option<Network>>,
    rpc_url: Derived<Option<Url>>,
    chain_id: Derived<Option<u64>>,
    active_chain: Derived<Option<ChainMetadata>>,
    active_chain_has_block_explorer: Derived<bool>,

    active_orderbook_ref: CachedCell<Option<OrderbookRef>>,
    active_network_orderbooks: Derived<IndexMap<OrderbookRef, Orderbook>>,
    active_orderbook: Derived<Option<Orderbook>>,
    subgraph_url: Derived<Option<Url>>,
    orderbook_address: Derived<Option<String>>,
    has_required_settings: Derived<bool>,

    active_deployment_ref: CachedCell<Option<DeploymentRef>>,
    deployments: Derived<IndexMap<DeploymentRef, Deployment>>,
    active_deployment: Derived<Option<Deployment>>,

    _cascade: Vec<Subscription>,
}

impl SettingsSession {
    pub fn new(
        store: Arc<dyn KvStore>,
        parser: Arc<dyn SettingsParser>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let settings_text = cached_string(Arc::clone(&store), KEY_SETTINGS_TEXT, "");

        let settings = {
            let parser = Arc::clone(&parser);
            async_derived(
                &settings_text,
                ConfigDocument::default(),
                ConfigDocument::default(),
                move |text: String| {
                    let parser = Arc::clone(&parser);
                    async move { parser.parse(&text).await }
                },
                move |e: &ParseError| reporter.report(&e.to_string()),
            )
        };

        let active_network_ref = cached_string_optional(Arc::clone(&store), KEY_ACTIVE_NETWORK);
        let active_orderbook_ref = cached_string_optional(Arc::clone(&store), KEY_ACTIVE_ORDERBOOK);
        let active_deployment_ref = cached_string_optional(store, KEY_ACTIVE_DEPLOYMENT);

        let mut cascade = Vec::new();

        // Document-settled repair is wired before any derived cell exists,
        // so on a settle it runs ahead of the filtered mappings' own
        // broadcasts: a vanished network is replaced first, and the
        // orderbook repair then sees the filtered set of the repaired
        // network instead of a transiently empty one.
        cascade.push(settings.on_change({
            let settings = settings.clone();
            let net = active_network_ref.clone();
            let ob = active_orderbook_ref.clone();
            let dep = active_deployment_ref.clone();
            move |doc: &ConfigDocument| {
                if !net
                    .get()
                    .is_some_and(|r| doc.networks.contains_key(&r))
                {
                    reset_network_cell(&settings, &net);
                }
                if ob
                    .get()
                    .is_some_and(|r| !doc.orderbooks.contains_key(&r))
                {
                    reset_orderbook_cell(&settings, &net, &ob);
                }
                if dep
                    .get()
                    .is_some_and(|r| !doc.deployments.contains_key(&r))
                {
                    reset_deployment_cell(&settings, &net, &ob, &dep);
                }
            }
        }));

        let active_network = derived2(
            &settings,
            &active_network_ref,
            |doc: &ConfigDocument, r: &Option<NetworkRef>| {
                r.as_ref().and_then(|r| doc.networks.get(r).cloned())
            },
        );
        let rpc_url = derived(&active_network, |n: &Option<Network>| {
            n.as_ref().map(|n| n.rpc.clone())
        });
        let chain_id = derived(&active_network, |n: &Option<Network>| {
            n.as_ref().map(|n| n.chain_id)
        });
        let active_chain = derived(&chain_id, |id: &Option<u64>| {
            id.as_ref()
                .and_then(|id| orderdesk_chain::find_chain(*id))
                .copied()
        });
        let active_chain_has_block_explorer =
            derived(&active_chain, |chain: &Option<ChainMetadata>| {
                chain.as_ref().is_some_and(ChainMetadata::has_block_explorer)
            });

        let active_network_orderbooks = derived2(
            &settings,
            &active_network_ref,
            |doc: &ConfigDocument, r: &Option<NetworkRef>| doc.orderbooks_for_network(r.as_ref()),
        );
        let active_orderbook = derived2(
            &settings,
            &active_orderbook_ref,
            |doc: &ConfigDocument, r: &Option<OrderbookRef>| {
                r.as_ref().and_then(|r| doc.orderbooks.get(r).cloned())
            },
        );
        let subgraph_url = derived2(
            &settings,
            &active_orderbook,
            |doc: &ConfigDocument, ob: &Option<Orderbook>| {
                ob.as_ref()
                    .and_then(|ob| ob.subgraph.as_ref())
                    .and_then(|sg| doc.subgraphs.get(sg).cloned())
            },
        );
        let orderbook_address = derived(&active_orderbook, |ob: &Option<Orderbook>| {
            ob.as_ref().map(|ob| ob.address.clone())
        });
        let has_required_settings = derived2(
            &active_network_ref,
            &active_orderbook_ref,
            |n: &Option<NetworkRef>, o: &Option<OrderbookRef>| n.is_some() && o.is_some(),
        );

        let deployments = derived3(
            &settings,
            &active_network_ref,
            &active_orderbook_ref,
            |doc: &ConfigDocument, n: &Option<NetworkRef>, o: &Option<OrderbookRef>| {
                doc.deployments_for(n.as_ref(), o.as_ref())
            },
        );
        let active_deployment = derived2(
            &deployments,
            &active_deployment_ref,
            |deps: &IndexMap<DeploymentRef, Deployment>, r: &Option<DeploymentRef>| {
                r.as_ref().and_then(|r| deps.get(r).cloned())
            },
        );

        // Network cleared: an orderbook cannot be active without a network.
        cascade.push(active_network_ref.on_change({
            let settings = settings.clone();
            let net = active_network_ref.clone();
            let ob = active_orderbook_ref.clone();
            move |r: &Option<NetworkRef>| {
                if r.is_none() {
                    reset_orderbook_cell(&settings, &net, &ob);
                }
            }
        }));

        // Filtered orderbooks recomputed: repair a selection that no
        // longer belongs to the active network.
        cascade.push(active_network_orderbooks.on_change({
            let settings = settings.clone();
            let net = active_network_ref.clone();
            let ob = active_orderbook_ref.clone();
            move |filtered: &IndexMap<OrderbookRef, Orderbook>| {
                if ob.get().is_some_and(|r| !filtered.contains_key(&r)) {
                    reset_orderbook_cell(&settings, &net, &ob);
                }
            }
        }));

        // Deployment level mirrors the orderbook rules one level deeper.
        cascade.push(active_orderbook_ref.on_change({
            let settings = settings.clone();
            let net = active_network_ref.clone();
            let ob = active_orderbook_ref.clone();
            let dep = active_deployment_ref.clone();
            move |r: &Option<OrderbookRef>| {
                if r.is_none() {
                    reset_deployment_cell(&settings, &net, &ob, &dep);
                }
            }
        }));
        cascade.push(deployments.on_change({
            let settings = settings.clone();
            let net = active_network_ref.clone();
            let ob = active_orderbook_ref.clone();
            let dep = active_deployment_ref.clone();
            move |filtered: &IndexMap<DeploymentRef, Deployment>| {
                if dep.get().is_some_and(|r| !filtered.contains_key(&r)) {
                    reset_deployment_cell(&settings, &net, &ob, &dep);
                }
            }
        }));

        // The first parse launches only now, with every edge and derived
        // cell already subscribed; an early settle cannot slip past the
        // document repair edge.
        settings.refresh();

        Self {
            settings_text,
            settings,
            active_network_ref,
            active_network,
            rpc_url,
            chain_id,
            active_chain,
            active_chain_has_block_explorer,
            active_orderbook_ref,
            active_network_orderbooks,
            active_orderbook,
            subgraph_url,
            orderbook_address,
            has_required_settings,
            active_deployment_ref,
            deployments,
            active_deployment,
            _cascade: cascade,
        }
    }

    /// Replace the raw settings text and kick off a reparse.
    pub fn set_settings_text(&self, text: String) {
        self.settings_text.set(text);
    }

    /// Wait for any in-flight parse and return the settled document.
    pub async fn load_settings(&self) -> ConfigDocument {
        self.settings.load().await
    }

    pub fn set_active_network_ref(&self, network: Option<NetworkRef>) {
        info!(?network, "selecting network");
        self.active_network_ref.set(network);
    }

    pub fn set_active_orderbook_ref(&self, orderbook: Option<OrderbookRef>) {
        info!(?orderbook, "selecting orderbook");
        self.active_orderbook_ref.set(orderbook);
    }

    pub fn set_active_deployment_ref(&self, deployment: Option<DeploymentRef>) {
        info!(?deployment, "selecting deployment");
        self.active_deployment_ref.set(deployment);
    }

    /// Reset the network selection to the first available, else clear it.
    pub fn reset_active_network_ref(&self) {
        reset_network_cell(&self.settings, &self.active_network_ref);
    }

    /// Reset the orderbook selection to the first available on the active
    /// network, else clear it.
    pub fn reset_active_orderbook_ref(&self) {
        reset_orderbook_cell(
            &self.settings,
            &self.active_network_ref,
            &self.active_orderbook_ref,
        );
    }

    /// Reset the deployment selection to the first available under the
    /// active network and orderbook, else clear it.
    pub fn reset_active_deployment_ref(&self) {
        reset_deployment_cell(
            &self.settings,
            &self.active_network_ref,
            &self.active_orderbook_ref,
            &self.active_deployment_ref,
        );
    }

    pub fn settings_text(&self) -> &CachedCell<String> {
        &self.settings_text
    }

    pub fn settings(&self) -> &AsyncDerived<ConfigDocument> {
        &self.settings
    }

    pub fn active_network_ref(&self) -> &CachedCell<Option<NetworkRef>> {
        &self.active_network_ref
    }

    pub fn active_network(&self) -> &Derived<Option<Network>> {
        &self.active_network
    }

    pub fn rpc_url(&self) -> &Derived<Option<Url>> {
        &self.rpc_url
    }

    pub fn chain_id(&self) -> &Derived<Option<u64>> {
        &self.chain_id
    }

    pub fn active_chain(&self) -> &Derived<Option<ChainMetadata>> {
        &self.active_chain
    }

    pub fn active_chain_has_block_explorer(&self) -> &Derived<bool> {
        &self.active_chain_has_block_explorer
    }

    pub fn active_orderbook_ref(&self) -> &CachedCell<Option<OrderbookRef>> {
        &self.active_orderbook_ref
    }

    pub fn active_network_orderbooks(&self) -> &Derived<IndexMap<OrderbookRef, Orderbook>> {
        &self.active_network_orderbooks
    }

    pub fn active_orderbook(&self) -> &Derived<Option<Orderbook>> {
        &self.active_orderbook
    }

    pub fn subgraph_url(&self) -> &Derived<Option<Url>> {
        &self.subgraph_url
    }

    pub fn orderbook_address(&self) -> &Derived<Option<String>> {
        &self.orderbook_address
    }

    pub fn has_required_settings(&self) -> &Derived<bool> {
        &self.has_required_settings
    }

    pub fn deployments(&self) -> &Derived<IndexMap<DeploymentRef, Deployment>> {
        &self.deployments
    }

    pub fn active_deployment_ref(&self) -> &CachedCell<Option<DeploymentRef>> {
        &self.active_deployment_ref
    }

    pub fn active_deployment(&self) -> &Derived<Option<Deployment>> {
        &self.active_deployment
    }
}

/// Reset-network: first network in document order, else `None`.
fn reset_network_cell(
    settings: &AsyncDerived<ConfigDocument>,
    cell: &CachedCell<Option<NetworkRef>>,
) {
    let next = settings.get().networks.keys().next().cloned();
    debug!(?next, "resetting active network");
    cell.set(next);
}

/// Reset-orderbook: first orderbook of the active network, else `None`.
///
/// Computed from the settled document and current network ref directly
/// rather than from the derived mapping, so the pick is correct even when
/// invoked mid-wave, before the derived cell has recomputed.
fn reset_orderbook_cell(
    settings: &AsyncDerived<ConfigDocument>,
    net: &CachedCell<Option<NetworkRef>>,
    cell: &CachedCell<Option<OrderbookRef>>,
) {
    let next = settings
        .get()
        .orderbooks_for_network(net.get().as_ref())
        .keys()
        .next()
        .cloned();
    debug!(?next, "resetting active orderbook");
    cell.set(next);
}

/// Reset-deployment: first deployment under the active network and
/// orderbook, else `None`.
fn reset_deployment_cell(
    settings: &AsyncDerived<ConfigDocument>,
    net: &CachedCell<Option<NetworkRef>>,
    ob: &CachedCell<Option<OrderbookRef>>,
    cell: &CachedCell<Option<DeploymentRef>>,
) {
    let next = settings
        .get()
        .deployments_for(net.get().as_ref(), ob.get().as_ref())
        .keys()
        .next()
        .cloned();
    debug!(?next, "resetting active deployment");
    cell.set(next);
}
