use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    stats::DashboardStats,
    view::{derive_view, OrderFilter, Tab},
    ClientConfig, ClientEvent, CredentialStore, MemoryCredentialStore, MissingCredentialStore,
    OrdersClient, RefreshFailureMode,
};
use shared::{
    domain::{CustomerId, Order, OrderId, OrderStatus, Viewer},
    lifecycle,
};
use tokio::sync::broadcast;
use tracing::info;

mod config;

#[derive(Parser, Debug)]
#[command(name = "counter", about = "Counter terminal for the café orders API")]
struct Cli {
    /// Settings file; defaults to ./counter.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    customer_id: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One-shot fetch and print of the full order board.
    Board,
    /// Keep the board on screen, refreshed by polling, until Ctrl-C.
    Watch,
    /// Filtered, sorted order listing.
    Orders {
        #[arg(long, default_value = "active")]
        tab: String,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        isolate: Option<String>,
    },
    /// Move one order to a new status, gated by the role transition table.
    Advance { order_id: String, status: String },
    /// Archive a completed or cancelled order.
    Archive { order_id: String },
    /// Locally aggregated order statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref());
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(token) = cli.token {
        settings.token = Some(token);
    }
    if let Some(role) = cli.role {
        settings.role = role;
    }
    if let Some(customer_id) = cli.customer_id {
        settings.customer_id = Some(customer_id);
    }

    config::validate_limits(&settings)?;
    let api_url = config::normalize_api_url(&settings.api_url)?;
    let role = config::parse_role(&settings.role)?;
    let viewer = if role.is_staff() {
        Viewer::staff(role)
    } else {
        let customer_id = settings
            .customer_id
            .clone()
            .context("customer role needs --customer-id (or customer_id in settings)")?;
        Viewer::customer(CustomerId::new(customer_id))
    };
    info!(api_url = %api_url, role = role.label(), "counter session configured");

    let credentials: Arc<dyn CredentialStore> = match settings.token.clone() {
        Some(token) => Arc::new(MemoryCredentialStore::with_token(token)),
        None => Arc::new(MissingCredentialStore),
    };
    let client = OrdersClient::with_credentials(
        ClientConfig {
            api_url,
            fetch_limit: settings.fetch_limit,
            poll_interval: Duration::from_secs(settings.poll_seconds),
            request_timeout: Duration::from_secs(settings.request_timeout_seconds),
        },
        credentials,
    );
    client.set_viewer(viewer.clone()).await;

    match cli.command {
        Command::Board => {
            client.refresh(RefreshFailureMode::ClearSnapshot).await?;
            let orders = client.orders().await;
            print_board(&orders, &viewer);
            print_stats(&DashboardStats::from_orders(&orders));
        }
        Command::Watch => watch(&client, &viewer).await?,
        Command::Orders {
            tab,
            search,
            isolate,
        } => {
            client.refresh(RefreshFailureMode::ClearSnapshot).await?;
            let filter = OrderFilter {
                tab: parse_tab(&tab)?,
                search,
                isolated: isolate.map(OrderId::new),
            };
            let view = derive_view(&client.orders().await, &viewer, &filter);
            if view.is_empty() {
                println!("no matching orders");
            }
            for order in &view {
                print_order_line(order);
            }
        }
        Command::Advance { order_id, status } => {
            let order_id = OrderId::new(order_id);
            let status = parse_status(&status)?;
            client.refresh(RefreshFailureMode::ClearSnapshot).await?;
            let Some(order) = client.order(&order_id).await else {
                bail!("order {order_id} is not in the current fetch window");
            };

            let allowed = lifecycle::allowed_transitions(viewer.role, order.status);
            if !allowed.contains(&status) {
                let allowed_text = if allowed.is_empty() {
                    "nothing".to_string()
                } else {
                    allowed
                        .iter()
                        .map(|next| next.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                bail!(
                    "a {} may not move order {} from {} to {}; allowed next: {}",
                    viewer.role.label(),
                    order.ticket_number,
                    order.status.label(),
                    status.label(),
                    allowed_text
                );
            }

            client.update_status(&order_id, status).await?;
            println!("order {} -> {}", order.ticket_number, status.label());
        }
        Command::Archive { order_id } => {
            let order_id = OrderId::new(order_id);
            client.refresh(RefreshFailureMode::ClearSnapshot).await?;
            let Some(order) = client.order(&order_id).await else {
                bail!("order {order_id} is not in the current fetch window");
            };
            if !lifecycle::can_archive(viewer.role, order.status) {
                bail!(
                    "order {} is {} and the viewer is a {}; archiving needs a completed or cancelled order and a manager or cashier",
                    order.ticket_number,
                    order.status.label(),
                    viewer.role.label()
                );
            }
            client.archive(&order_id).await?;
            println!("order {} archived", order.ticket_number);
        }
        Command::Stats => {
            client.refresh(RefreshFailureMode::KeepSnapshot).await?;
            print_stats(&DashboardStats::from_orders(&client.orders().await));
        }
    }

    Ok(())
}

async fn watch(client: &Arc<OrdersClient>, viewer: &Viewer) -> Result<()> {
    let mut events = client.subscribe_events();
    client.start_polling(RefreshFailureMode::ClearSnapshot).await;
    println!("watching orders (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ClientEvent::SnapshotRefreshed { .. }) => {
                    print_board(&client.orders().await, viewer);
                }
                Ok(ClientEvent::Notice(message)) => println!("* {message}"),
                Ok(ClientEvent::Error(message)) => eprintln!("! {message}"),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("! skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    client.stop_polling().await;
    Ok(())
}

fn print_board(orders: &[Order], viewer: &Viewer) {
    let active = derive_view(orders, viewer, &OrderFilter::default());
    let completed = derive_view(
        orders,
        viewer,
        &OrderFilter {
            tab: Tab::Completed,
            ..OrderFilter::default()
        },
    );

    println!("== active ({}) ==", active.len());
    for order in &active {
        print_order_line(order);
    }
    println!("== completed ({}) ==", completed.len());
    for order in &completed {
        print_order_line(order);
    }
}

fn print_order_line(order: &Order) {
    let items: u32 = order.items.iter().map(|item| item.quantity).sum();
    println!(
        "  {:<10} {:<9} {:<20} {:>2} items  ${:>6.2}",
        order.ticket_number,
        order.status.label(),
        order.customer_name,
        items,
        order.total
    );
}

fn print_stats(stats: &DashboardStats) {
    println!("orders: {} total / {} active", stats.total, stats.active);
    println!(
        "  pending {}  preparing {}  ready {}  completed {}  cancelled {}",
        stats.pending, stats.preparing, stats.ready, stats.completed, stats.cancelled
    );
    println!(
        "completed revenue ${:.2}  avg order ${:.2}",
        stats.completed_revenue, stats.average_order_value
    );
}

fn parse_tab(raw: &str) -> Result<Tab> {
    if raw.eq_ignore_ascii_case("active") {
        Ok(Tab::Active)
    } else if raw.eq_ignore_ascii_case("completed") {
        Ok(Tab::Completed)
    } else {
        bail!("unknown tab '{raw}'; expected active or completed");
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    for status in OrderStatus::ALL {
        if raw.eq_ignore_ascii_case(status.label()) {
            return Ok(status);
        }
    }
    bail!("unknown status '{raw}'; expected one of pending, preparing, ready, completed, cancelled");
}
