//! Flow Query Module.

use std::sync::Arc;
use std::time::Duration;

use pflow_cache::{Mutation, QueryCache, QueryOptions, QueryState, Subscription};
use pflow_core::{ClientResult, CreateFlowInput, Flow, FlowApi, FlowId};
use serde::Serialize;
use tracing::{info, warn};

use crate::drafts::FlowDraft;
use crate::error::SubmitError;
use crate::keys;

/// Staleness window of the flow catalogue
pub const FLOWS_STALE_TIME: Duration = Duration::from_secs(30);

/// One entry of a flow selection control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowOption {
    /// `"<name> v<version>"`
    pub label: String,
    pub value: FlowId,
}

/// Projects flows into selection options, preserving order
pub fn flow_options(flows: &[Flow]) -> Vec<FlowOption> {
    flows
        .iter()
        .map(|flow| FlowOption {
            label: flow.label(),
            value: flow.id.clone(),
        })
        .collect()
}

/// Typed access to the `["flows"]` query and the create-flow mutation
#[derive(Clone)]
pub struct FlowQueries {
    cache: QueryCache,
    api: Arc<dyn FlowApi>,
    create: Mutation,
}

impl FlowQueries {
    pub fn new(cache: QueryCache, api: Arc<dyn FlowApi>) -> Self {
        let create = Mutation::new("create flow", cache.clone());
        Self { cache, api, create }
    }

    pub fn query_options() -> QueryOptions {
        QueryOptions::default().stale_time(FLOWS_STALE_TIME)
    }

    /// Reads the flow list, refreshing it in the background when stale
    pub fn query(&self) -> QueryState<Vec<Flow>> {
        let api = Arc::clone(&self.api);
        self.cache.query(
            &keys::flows(),
            move || {
                let api = Arc::clone(&api);
                async move { api.list_flows().await }
            },
            Self::query_options(),
        )
    }

    /// Subscribes to the flow list and issues the initial read
    pub fn subscribe<L>(&self, listener: L) -> Subscription<Vec<Flow>>
    where
        L: Fn(&QueryState<Vec<Flow>>) + Send + Sync + 'static,
    {
        let subscription = self.cache.subscribe(&keys::flows(), listener);
        self.query();
        subscription
    }

    /// Cached flows without triggering a fetch
    pub fn cached(&self) -> Option<Arc<Vec<Flow>>> {
        self.cache.state::<Vec<Flow>>(&keys::flows()).data
    }

    /// Selection options for dependent forms, recomputed from the cache on every call
    pub fn options(&self) -> Vec<FlowOption> {
        self.cached()
            .map(|flows| flow_options(&flows))
            .unwrap_or_default()
    }

    /// `POST /flows`, then invalidates `["flows"]` whatever the outcome.
    ///
    /// Edges referencing unknown nodes are logged and submitted as they are.
    pub async fn create(&self, input: &CreateFlowInput) -> ClientResult<Flow> {
        let dangling = input.definition.dangling_edges();
        if !dangling.is_empty() {
            let ids: Vec<&str> = dangling.iter().map(|edge| edge.id.as_str()).collect();
            warn!(name = %input.name, edges = ?ids, "Submitting flow with dangling edges");
        }

        let flow = self
            .create
            .run(
                || self.api.create_flow(input),
                |cache, _| {
                    cache.invalidate(&keys::flows());
                },
            )
            .await?;
        info!(flow_id = %flow.id, name = %flow.name, "Flow created");
        Ok(flow)
    }

    /// Validates a designer draft and creates the flow it describes
    pub async fn submit(&self, draft: &FlowDraft) -> Result<Flow, SubmitError> {
        let input = draft.to_input()?;
        Ok(self.create(&input).await?)
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_pending()
    }

    pub fn create_mutation(&self) -> &Mutation {
        &self.create
    }
}
