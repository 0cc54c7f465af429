use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConsoleConfig;

/// Flow catalogue and work-order dashboard for the pflow engine
#[derive(Parser, Debug)]
#[command(name = "pflow")]
#[command(author, version, about)]
pub struct Cli {
    /// Configuration file (default: ./pflow.{toml,yaml,json} if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Engine API root, overrides PFLOW_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds, overrides PFLOW_TIMEOUT_SECS
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Log directives, overrides PFLOW_LOG_FILTER
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List flows as "<name> v<version>"
    Flows,

    /// Create a flow from the default canvas plus extra nodes
    CreateFlow {
        /// Flow name
        #[arg(short, long, default_value = pflow_queries::drafts::DEFAULT_FLOW_NAME)]
        name: String,

        /// Extra node ids, placed below the start node
        #[arg(long = "node")]
        nodes: Vec<String>,

        /// Edges as source:target
        #[arg(long = "connect")]
        connections: Vec<String>,
    },

    /// Show the latest work orders
    WorkOrders {
        /// How many to show, overrides PFLOW_LATEST
        #[arg(short, long)]
        latest: Option<usize>,

        /// Keep polling and print status transitions until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Create a work order for a flow
    CreateWorkOrder {
        /// Flow id
        #[arg(short, long)]
        flow: String,

        #[arg(short, long, default_value = pflow_queries::drafts::DEFAULT_WORK_ORDER_TITLE)]
        title: String,

        #[arg(short, long, default_value = "")]
        assignee: String,

        /// JSON object handed to the engine
        #[arg(short, long, default_value = pflow_queries::drafts::DEFAULT_PAYLOAD)]
        payload: String,
    },

    /// Retry a failed work order
    Retry {
        /// Work order id
        id: String,

        /// Send the retry even if the order was not last seen as failed
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Applies command-line overrides on top of loaded configuration
    pub fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(log_filter) = &self.log_filter {
            config.log_filter = log_filter.clone();
        }
        if self.json_logs {
            config.json_logs = true;
        }
        if let Command::WorkOrders { latest: Some(latest), .. } = self.command {
            config.latest = latest;
        }
    }
}
