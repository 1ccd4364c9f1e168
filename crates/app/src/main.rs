//! `orderdesk` command line.
//!
//! ```text
//! orderdesk demo     place, pay and ship one order, then print the dashboard
//! orderdesk stats    print dashboard statistics
//! orderdesk orders   print the order listing
//! ```
//!
//! The backend comes from `ORDERDESK_STORE` (`memory` or `postgres`). The
//! in-memory store starts empty on every run.

use anyhow::{Context, bail};
use chrono::Utc;
use serde_json::json;

use orderdesk_core::{Actor, Money};
use orderdesk_infra::{
    Catalog, InMemoryStore, ListingFilter, NewOrder, OrderWorkflow, PostgresStore, ReadViews,
    Store, StoreConfig,
};
use orderdesk_parties::NewCustomer;
use orderdesk_products::{NewProduct, ProductCategory};
use orderdesk_sales::{
    Carrier, NewPayment, NewShipment, PaymentMethod, PaymentStatus, ShipmentStatus,
};

#[derive(Debug, Clone, Copy)]
enum Command {
    Demo,
    Stats,
    Orders,
}

impl Command {
    fn parse(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg {
            Some("demo") | None => Ok(Command::Demo),
            Some("stats") => Ok(Command::Stats),
            Some("orders") => Ok(Command::Orders),
            Some(other) => bail!("unknown command '{other}' (expected demo, stats or orders)"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orderdesk_observability::init();

    let arg = std::env::args().nth(1);
    let command = Command::parse(arg.as_deref())?;
    let config = StoreConfig::from_env().context("reading store configuration")?;

    match config {
        StoreConfig::Memory => {
            tracing::info!(?command, "using in-memory store");
            run(InMemoryStore::new(), command).await
        }
        StoreConfig::Postgres(pg) => {
            tracing::info!(?command, "using postgres store");
            let store = PostgresStore::connect(&pg)
                .await
                .context("connecting to postgres")?;
            store.apply_schema().await.context("applying schema")?;
            run(store, command).await
        }
    }
}

async fn run<S>(store: S, command: Command) -> anyhow::Result<()>
where
    S: Store + ReadViews + Clone,
{
    match command {
        Command::Demo => demo(store).await,
        Command::Stats => {
            let stats = store.dashboard_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Command::Orders => {
            let rows = store.order_listing(ListingFilter::all()).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}

async fn demo<S>(store: S) -> anyhow::Result<()>
where
    S: Store + ReadViews + Clone,
{
    let catalog = Catalog::new(store.clone());
    let workflow = OrderWorkflow::new(store.clone());
    let today = Utc::now().date_naive();

    let product = catalog
        .create_product(NewProduct {
            name: "Mechanical keyboard".to_string(),
            description: "tenkeyless, brown switches".to_string(),
            unit_price: Money::from_minor(8900),
            stock: 5,
            category: ProductCategory::Electronics,
        })
        .await?;
    let customer = catalog
        .register_customer(NewCustomer {
            name: "Demo Customer".to_string(),
            email: format!("demo-{}@example.com", Utc::now().timestamp_millis()),
            phone: String::new(),
            address: "1 Main Street".to_string(),
        })
        .await?;
    let actor = Actor::Customer(customer.id);

    let placed = workflow
        .create_order(
            &actor,
            NewOrder {
                customer_id: customer.id,
                product_id: product.id,
                quantity: 3,
                order_date: today,
            },
        )
        .await?;
    let paid = workflow
        .record_payment(
            &actor,
            NewPayment {
                order_id: placed.order.id,
                amount: placed.total(),
                method: PaymentMethod::CreditCard,
                payment_date: today,
                status: PaymentStatus::Completed,
            },
        )
        .await?;
    let shipped = workflow
        .record_shipment(
            &actor,
            NewShipment {
                order_id: placed.order.id,
                carrier: Carrier::Ups,
                tracking_number: format!("DEMO{}", placed.order.id),
                ship_date: today,
                status: ShipmentStatus::InTransit,
            },
        )
        .await?;

    let refused = workflow
        .create_order(
            &actor,
            NewOrder {
                customer_id: customer.id,
                product_id: product.id,
                quantity: 3,
                order_date: today,
            },
        )
        .await
        .err()
        .map(|e| e.to_string());

    let report = json!({
        "order": placed,
        "payment": paid,
        "shipment": shipped,
        "second_order_refused": refused,
        "dashboard": store.dashboard_stats().await?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
