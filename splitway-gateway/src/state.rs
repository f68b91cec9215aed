//! Shared state handed to every connection.

use std::sync::Arc;

use splitway_control::{VirtualServiceSource, WeightReader, WeightSync};
use splitway_core::{DecisionHistory, SharedWeightStore, TopologyInventory, WeightedSelector};

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;

/// Everything a request handler needs.
#[derive(Debug)]
pub struct GatewayState {
    /// Routes service traffic.
    pub dispatcher: Dispatcher,
    /// Re-reads routing weights for reporting.
    pub sync: Arc<WeightSync>,
    /// Recent routing decisions.
    pub history: Arc<DecisionHistory>,
    /// Static topology skeleton.
    pub inventory: TopologyInventory,
}

impl GatewayState {
    /// Wire the core components together for `config`.
    pub fn new(
        config: &GatewayConfig,
        store: SharedWeightStore,
        source: Arc<dyn VirtualServiceSource>,
    ) -> Self {
        let history = Arc::new(DecisionHistory::new());
        let reader = WeightReader::new(source, Arc::clone(&store), &config.control_plane);
        let sync = Arc::new(WeightSync::new(reader));

        let inventory = match &config.relay_node {
            Some(relay) => TopologyInventory::standard().with_relay(relay.clone()),
            None => TopologyInventory::standard(),
        };

        let dispatcher = Dispatcher::new(
            WeightedSelector::new(Arc::clone(&history)),
            store,
            Arc::clone(&sync),
            config.backends.clone(),
            config.refresh,
        );

        Self {
            dispatcher,
            sync,
            history,
            inventory,
        }
    }
}

/// A shared reference to the gateway state.
pub type SharedGatewayState = Arc<GatewayState>;
