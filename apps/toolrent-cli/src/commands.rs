//! Command handlers: call the repositories, render text or JSON.

use anyhow::Result;
use serde::Serialize;
use toolrent_core::{
    Customer, Money, NewCustomer, NewTool, PopularTool, Rental, RentalDetail, Tool, ToolCategory,
    ToolUpdate,
};
use toolrent_db::{Database, DbError};
use tracing::debug;

use crate::cli::{CategoryCommands, Commands, CustomerCommands, RentalCommands, ToolCommands};
use crate::config::AppConfig;

/// Output settings shared by every handler.
pub struct Output {
    json: bool,
    currency: String,
}

impl Output {
    pub fn new(json: bool, config: &AppConfig) -> Self {
        Self {
            json,
            currency: config.shop.currency.clone(),
        }
    }

    fn money(&self, cents: i64) -> String {
        Money::from_cents(cents).format_with(&self.currency)
    }

    /// Prints `value` as JSON, or runs `text` for the human form.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&Self)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(self);
        }
        Ok(())
    }

    fn done(&self, message: String) -> Result<()> {
        self.emit(&serde_json::json!({ "ok": true, "message": message }), |_| {
            println!("{}", message)
        })
    }
}

pub async fn run(db: &Database, config: &AppConfig, command: Commands, out: &Output) -> Result<()> {
    match command {
        Commands::Category(cmd) => category(db, cmd, out).await,
        Commands::Tool(cmd) => tool(db, cmd, out).await,
        Commands::Customer(cmd) => customer(db, cmd, out).await,
        Commands::Rental(cmd) => rental(db, cmd, out).await,
        Commands::Dashboard => dashboard(db, config, out).await,
    }
}

// =============================================================================
// Catalog
// =============================================================================

async fn category(db: &Database, cmd: CategoryCommands, out: &Output) -> Result<()> {
    let repo = db.categories();

    match cmd {
        CategoryCommands::Add { name } => {
            let category = repo.create(&name).await?;
            out.emit(&category, |_| render_category(&category))
        }
        CategoryCommands::List => {
            let categories = repo.list().await?;
            out.emit(&categories, |_| categories.iter().for_each(render_category))
        }
        CategoryCommands::Delete { id } => {
            repo.delete(&id).await?;
            out.done(format!("Category {} deleted", id))
        }
    }
}

async fn tool(db: &Database, cmd: ToolCommands, out: &Output) -> Result<()> {
    let repo = db.tools();

    match cmd {
        ToolCommands::Add(args) => {
            let tool = repo
                .create(&NewTool {
                    name: args.name,
                    category_id: args.category,
                    daily_price_cents: args.price.cents(),
                    quantity_total: args.quantity,
                })
                .await?;
            out.emit(&tool, |o| render_tool(o, &tool))
        }
        ToolCommands::List { rentable } => {
            let tools = if rentable {
                repo.list_rentable().await?
            } else {
                repo.list().await?
            };
            out.emit(&tools, |o| tools.iter().for_each(|t| render_tool(o, t)))
        }
        ToolCommands::Update(args) => {
            let changes = ToolUpdate {
                name: args.name,
                category_id: args.category,
                daily_price_cents: args.price.map(|p| p.cents()),
                quantity_total: args.quantity,
                is_active: args.active,
            };
            let tool = repo.update(&args.id, &changes).await?;
            out.emit(&tool, |o| render_tool(o, &tool))
        }
        ToolCommands::Delete { id } => {
            repo.delete(&id).await?;
            out.done(format!("Tool {} deleted", id))
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

async fn customer(db: &Database, cmd: CustomerCommands, out: &Output) -> Result<()> {
    let repo = db.customers();

    match cmd {
        CustomerCommands::Add(args) => {
            let customer = repo
                .create(&NewCustomer {
                    name: args.name,
                    phone: args.phone,
                    address: args.address,
                })
                .await?;
            out.emit(&customer, |_| render_customer(&customer))
        }
        CustomerCommands::List => {
            let customers = repo.list().await?;
            out.emit(&customers, |_| customers.iter().for_each(render_customer))
        }
        CustomerCommands::Update { id, details } => {
            let customer = repo
                .update(
                    &id,
                    &NewCustomer {
                        name: details.name,
                        phone: details.phone,
                        address: details.address,
                    },
                )
                .await?;
            out.emit(&customer, |_| render_customer(&customer))
        }
        CustomerCommands::Delete { id } => {
            repo.delete(&id).await?;
            out.done(format!("Customer {} deleted", id))
        }
    }
}

// =============================================================================
// Rentals
// =============================================================================

async fn rental(db: &Database, cmd: RentalCommands, out: &Output) -> Result<()> {
    let repo = db.rentals();

    match cmd {
        RentalCommands::Create { customer, start } => {
            let start = start.unwrap_or_else(|| db.clock().today());
            let rental = repo.create(&customer, start).await?;
            out.emit(&rental, |o| render_rental(o, &rental))
        }
        RentalCommands::AddItem {
            rental,
            tool,
            quantity,
        } => {
            let item = repo.add_item(&rental, &tool, quantity).await?;
            out.emit(&item, |o| {
                println!(
                    "Line {} • tool {} × {} at {}/day",
                    item.id,
                    item.tool_id,
                    item.quantity,
                    o.money(item.daily_rate_cents)
                )
            })
        }
        RentalCommands::RemoveItem { rental, item } => {
            repo.remove_item(&rental, &item).await?;
            out.done(format!("Line {} removed from rental {}", item, rental))
        }
        RentalCommands::Complete { id } => {
            let rental = repo.complete(&id).await?;
            out.emit(&rental, |o| render_rental(o, &rental))
        }
        RentalCommands::Cancel { id } => {
            let rental = repo.cancel(&id).await?;
            out.emit(&rental, |o| render_rental(o, &rental))
        }
        RentalCommands::Delete { id } => {
            repo.delete(&id).await?;
            out.done(format!("Rental {} deleted", id))
        }
        RentalCommands::Show { id } => {
            let rental = repo
                .get_by_id(&id)
                .await?
                .ok_or_else(|| DbError::not_found("Rental", id.as_str()))?;

            // The stored total of an active rental grows with every day
            if rental.is_active() {
                debug!(rental_id = %id, "Refreshing active rental total");
                repo.recalculate_total(&id).await?;
            }

            let detail = repo
                .get_detail(&id)
                .await?
                .ok_or_else(|| DbError::not_found("Rental", id.as_str()))?;
            out.emit(&detail, |o| render_detail(o, &detail))
        }
        RentalCommands::List { status } => {
            let rentals = repo.list(status).await?;
            out.emit(&rentals, |o| rentals.iter().for_each(|r| render_rental(o, r)))
        }
        RentalCommands::SetStart { id, date } => {
            let rental = repo.edit_start_date(&id, date).await?;
            out.emit(&rental, |o| render_rental(o, &rental))
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Serialize)]
struct DashboardView {
    shop: String,
    stats: toolrent_core::DashboardStats,
    popular_tools: Vec<PopularTool>,
    recent_rentals: Vec<Rental>,
}

async fn dashboard(db: &Database, config: &AppConfig, out: &Output) -> Result<()> {
    let view = DashboardView {
        shop: config.shop.name.clone(),
        stats: db.dashboard().stats().await?,
        popular_tools: db
            .dashboard()
            .popular_tools(config.shop.popular_tools_limit)
            .await?,
        recent_rentals: db
            .rentals()
            .recent(config.shop.recent_rentals_limit)
            .await?,
    };

    out.emit(&view, |o| {
        let s = &view.stats;
        println!("{}", view.shop);
        println!("  Tools:           {}", s.total_tools);
        println!("  Units available: {}", s.total_available);
        println!("  Units rented:    {}", s.total_committed);
        println!("  Active rentals:  {}", s.active_rentals);
        println!("  Today's income:  {}", o.money(s.today_income_cents));

        println!("\nPopular tools");
        for p in &view.popular_tools {
            println!(
                "  {:<28} {:>4} rentals  {}/{} on shelf",
                p.name, p.rental_count, p.quantity_available, p.quantity_total
            );
        }

        println!("\nRecent rentals");
        for r in &view.recent_rentals {
            render_rental(o, r);
        }
    })
}

// =============================================================================
// Rendering
// =============================================================================

fn render_category(category: &ToolCategory) {
    println!("- {} • {}", category.id, category.name);
}

fn render_tool(out: &Output, tool: &Tool) {
    println!(
        "- {} • {} • {}/day • {}/{} available{}",
        tool.id,
        tool.name,
        out.money(tool.daily_price_cents),
        tool.quantity_available,
        tool.quantity_total,
        if tool.is_active { "" } else { " • inactive" }
    );
}

fn render_customer(customer: &Customer) {
    println!(
        "- {} • {} • {}{}",
        customer.id,
        customer.name,
        customer.phone,
        if customer.address.is_empty() {
            String::new()
        } else {
            format!(" • {}", customer.address)
        }
    );
}

fn render_rental(out: &Output, rental: &Rental) {
    let end = rental
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "open".to_string());
    println!(
        "- Rental {} • customer {} • {} → {} • {} • total {}",
        rental.id,
        rental.customer_id,
        rental.start_date,
        end,
        rental.status,
        out.money(rental.total_cents)
    );
}

fn render_detail(out: &Output, detail: &RentalDetail) {
    render_rental(out, &detail.rental);
    println!(
        "  Customer: {} • billed days: {}",
        detail.customer_name, detail.billed_days
    );
    for line in &detail.lines {
        println!(
            "  [{}] {} × {} at {}/day = {}",
            line.item.id,
            line.tool_name,
            line.item.quantity,
            out.money(line.item.daily_rate_cents),
            out.money(line.line_total_cents)
        );
    }
}
