//! `NightDesk` console command line
//!
//! Thin terminal front end over the console state: browse collections with
//! the same filters and paging the UI uses, delete records optimistically,
//! sign in on a POS device and print dashboard figures.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nightdesk_client::{ListFilter, ResourceApi};
use nightdesk_console::dashboard::{daily_revenue, top_events_by_fill};
use nightdesk_console::{ALL, AppState, Filterable, Managed, start_pos_session};
use nightdesk_core::types::{
    Artist, Employee, Event, PaymentMethod, PosDevice, Promotion, Ticket, TicketType, Transaction,
};
use nightdesk_core::{Config, RecordId, Resource, init_logging};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

/// Command line interface for the `NightDesk` console
#[derive(Parser)]
#[command(
    name = "nightdesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Events, ticketing and POS console for nightlife venues"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "NIGHTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Print revenue, fill rates and event counts
    Dashboard {
        /// Number of events in the fill-rate ranking
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Show one page of a collection
    List {
        /// Collection to show
        collection: Collection,
        /// Filters and paging
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Delete a record, reconciling with the server afterwards
    Delete {
        /// Collection the record belongs to
        collection: Collection,
        /// Record identifier
        id: RecordId,
    },
    /// Sign an employee in on a POS device
    Login {
        /// Employee identifier
        #[arg(long)]
        employee: RecordId,
        /// POS device identifier
        #[arg(long)]
        device: RecordId,
    },
    /// Forget the signed-in operator
    Logout,
    /// Show the signed-in operator
    Whoami,
}

/// Collections the console manages
#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Events,
    TicketTypes,
    Tickets,
    Artists,
    Promotions,
    Devices,
    Employees,
    Transactions,
    PaymentMethods,
}

/// Filters and paging for `list`
#[derive(Args)]
struct ViewArgs {
    /// Case-insensitive search text
    #[arg(long, default_value = "")]
    search: String,
    /// Status key, or `all`
    #[arg(long, default_value = ALL)]
    status: String,
    /// Category key, or `all`
    #[arg(long, default_value = ALL)]
    category: String,
    /// Page number, 1-based
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Only records belonging to this event
    #[arg(long)]
    event: Option<RecordId>,
}

macro_rules! with_collection {
    ($collection:expr, $func:ident($($arg:expr),*)) => {
        match $collection {
            Collection::Events => $func::<Event>($($arg),*).await,
            Collection::TicketTypes => $func::<TicketType>($($arg),*).await,
            Collection::Tickets => $func::<Ticket>($($arg),*).await,
            Collection::Artists => $func::<Artist>($($arg),*).await,
            Collection::Promotions => $func::<Promotion>($($arg),*).await,
            Collection::Devices => $func::<PosDevice>($($arg),*).await,
            Collection::Employees => $func::<Employee>($($arg),*).await,
            Collection::Transactions => $func::<Transaction>($($arg),*).await,
            Collection::PaymentMethods => $func::<PaymentMethod>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        }),
    };
    init_logging(&config.logging)?;

    let state = AppState::new(config)?;
    let result = run(&state, cli.command).await;

    for toast in state.toasts.drain() {
        eprintln!("[{}] {}", toast.level, toast.message);
    }
    result
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Dashboard { top } => dashboard(state, top).await,
        Commands::List { collection, view } => with_collection!(collection, list(state, &view)),
        Commands::Delete { collection, id } => with_collection!(collection, delete(state, id)),
        Commands::Login { employee, device } => login(state, employee, device).await,
        Commands::Logout => {
            state.session.sign_out()?;
            Ok(())
        }
        Commands::Whoami => print_json(&json!({ "session": state.session.current() })),
    }
}

async fn dashboard(state: &AppState, top: usize) -> Result<()> {
    let data = state.dashboard().await;
    print_json(&json!({
        "summary": data.summary(),
        "daily_revenue": daily_revenue(&data.transactions),
        "top_events": top_events_by_fill(&data.events, top),
    }))
}

async fn list<R>(state: &AppState, view: &ViewArgs) -> Result<()>
where
    R: Resource + Filterable + Managed,
{
    let page = state.page::<R>();
    let filter = view
        .event
        .map_or_else(ListFilter::new, |id| ListFilter::new().event(id));
    page.mount_with(filter).await;

    page.set_search(view.search.as_str());
    page.set_status(view.status.as_str());
    page.set_category(view.category.as_str());
    page.set_page(view.page);

    let slice = page.visible();
    print_json(&json!({
        "collection": R::COLLECTION,
        "page": slice.page,
        "total_pages": slice.total_pages,
        "total_items": slice.total_items,
        "editable": page.can_edit(),
        "items": slice.items,
    }))
}

async fn delete<R>(state: &AppState, id: RecordId) -> Result<()>
where
    R: Resource + Filterable + Managed,
{
    let page = state.page::<R>();
    if !page.can_edit() {
        warn!(collection = R::COLLECTION, id, "deleting without the managing capability");
    }
    page.mount().await;
    let outcome = page.delete(id).await;
    info!(collection = R::COLLECTION, id, ?outcome, "delete finished");
    print_json(&json!({
        "id": id,
        "confirmed": outcome.confirmed,
        "reconciled": outcome.reconciled,
    }))
}

async fn login(state: &AppState, employee_id: RecordId, device_id: RecordId) -> Result<()> {
    let all = ListFilter::new();
    let employees = ResourceApi::<Employee>::list(&state.api_client, &all).await?;
    let devices = ResourceApi::<PosDevice>::list(&state.api_client, &all).await?;

    let employee = employees
        .iter()
        .find(|e| e.id == employee_id)
        .with_context(|| format!("employee {employee_id} not found"))?;
    let device = devices
        .iter()
        .find(|d| d.id == device_id)
        .with_context(|| format!("POS device {device_id} not found"))?;

    let session = start_pos_session(&state.session, employee, device)?;
    print_json(&json!({ "session": session }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
