//! Command line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use toolrent_core::{Money, RentalStatus};

#[derive(Debug, Parser)]
#[command(name = "toolrent", about = "Tool rental shop ledger", version)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (default: platform config dir)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Database file, overrides config and environment")]
    pub db: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    Category(CategoryCommands),
    #[command(subcommand)]
    Tool(ToolCommands),
    #[command(subcommand)]
    Customer(CustomerCommands),
    #[command(subcommand)]
    Rental(RentalCommands),
    /// Stock counters, today's income, popular tools and recent rentals
    Dashboard,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CategoryCommands {
    Add {
        name: String,
    },
    List,
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ToolCommands {
    Add(AddToolArgs),
    List {
        #[arg(long, action = ArgAction::SetTrue, help = "Only active tools with stock on the shelf")]
        rentable: bool,
    },
    Update(UpdateToolArgs),
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct AddToolArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, help = "Category id")]
    pub category: String,
    #[arg(long, help = "Daily price, e.g. 150.00")]
    pub price: Money,
    #[arg(long, help = "Units the shop owns")]
    pub quantity: i64,
}

#[derive(Debug, Args)]
pub struct UpdateToolArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, help = "Category id")]
    pub category: Option<String>,
    #[arg(long, help = "New daily price; existing line items keep their rate")]
    pub price: Option<Money>,
    #[arg(long, help = "New total; available stock moves by the same difference")]
    pub quantity: Option<i64>,
    #[arg(long, help = "true to offer the tool for rent, false to withdraw it")]
    pub active: Option<bool>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CustomerCommands {
    Add(CustomerArgs),
    List,
    Update {
        id: String,
        #[command(flatten)]
        details: CustomerArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct CustomerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub address: String,
}

// =============================================================================
// Rentals
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum RentalCommands {
    Create {
        #[arg(long, help = "Customer id")]
        customer: String,
        #[arg(long, help = "Start date YYYY-MM-DD (default: today)")]
        start: Option<NaiveDate>,
    },
    AddItem {
        rental: String,
        #[arg(long, help = "Tool id")]
        tool: String,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },
    RemoveItem {
        rental: String,
        item: String,
    },
    Complete {
        id: String,
    },
    Cancel {
        id: String,
    },
    Delete {
        id: String,
    },
    Show {
        id: String,
    },
    List {
        #[arg(long, help = "active, completed or cancelled")]
        status: Option<RentalStatus>,
    },
    SetStart {
        id: String,
        date: NaiveDate,
    },
}
