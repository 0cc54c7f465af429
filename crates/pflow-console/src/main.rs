use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pflow_cache::QueryCache;
use pflow_client::HttpRemoteClient;
use pflow_console::{render, Cli, Command, Console, ConsoleConfig};
use pflow_core::WorkOrderId;
use pflow_queries::WorkOrderDraft;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid command-line overrides")?;

    pflow_monitoring::init_logging(&config.monitoring_config()).context("Failed to initialize logging")?;

    let client = HttpRemoteClient::new(config.client_config()).context("Failed to create remote client")?;
    let console = Console::new(QueryCache::new(), Arc::new(client));

    match cli.command {
        Command::Flows => {
            let options = console.flow_options().await?;
            print!("{}", render::flow_table(&options));
        }
        Command::CreateFlow {
            name,
            nodes,
            connections,
        } => {
            let flow = console.create_flow(&name, &nodes, &connections).await?;
            println!("Created flow {} ({})", flow.id, flow.label());
        }
        Command::WorkOrders { watch: false, .. } => {
            let orders = console.work_orders().await?;
            print!(
                "{}",
                render::work_order_table(pflow_queries::latest_work_orders(&orders, config.latest))
            );
        }
        Command::WorkOrders { watch: true, .. } => {
            console
                .watch(config.latest, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "Failed to listen for ctrl-c");
                    }
                })
                .await?;
        }
        Command::CreateWorkOrder {
            flow,
            title,
            assignee,
            payload,
        } => {
            let draft = WorkOrderDraft {
                flow_id: flow,
                title,
                assignee,
                payload,
            };
            let order = console.create_work_order(&draft).await?;
            println!("Created work order {} ({})", order.id, order.status);
        }
        Command::Retry { id, force } => {
            let id = WorkOrderId::from(id);
            console.retry(&id, force).await?;
            println!("Retry requested for {}", id);
        }
    }

    Ok(())
}
