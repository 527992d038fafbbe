use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use rene_shop::{
    config::{self, AppConfig},
    currency, db, migrator,
    services::CatalogService,
    storage::MediaStorage,
};

#[derive(Parser)]
#[command(name = "rene-shop", about = "Operator tools for the shop catalog", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or roll back schema migrations
    Migrate(MigrateArgs),
    /// Show a product's price in another currency
    ConvertPrice(ConvertPriceArgs),
    /// Show a product with its sizes, photos and categories
    ShowProduct(ShowProductArgs),
}

#[derive(Args)]
struct MigrateArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Roll back instead of applying")]
    down: bool,
    #[arg(long, requires = "down", help = "Number of migrations to roll back")]
    steps: Option<u32>,
}

#[derive(Args)]
struct ConvertPriceArgs {
    product_id: Uuid,
    #[arg(help = "Target currency code, e.g. EUR")]
    currency: String,
}

#[derive(Args)]
struct ShowProductArgs {
    product_id: Uuid,
}

#[derive(Serialize)]
struct PriceView {
    product_id: Uuid,
    currency: String,
    amount: rust_decimal::Decimal,
}

#[derive(Serialize)]
struct ProductView {
    product: rene_shop::entities::ProductModel,
    categories: Vec<String>,
    sizes: Vec<String>,
    photo_urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    info!(
        environment = %cfg.environment,
        base_currency = %cfg.base_currency,
        "Loaded configuration"
    );

    match cli.command {
        Commands::Migrate(args) => handle_migrate(&cfg, args).await?,
        Commands::ConvertPrice(args) => {
            let catalog = catalog_service(&cfg).await?;
            let amount = catalog
                .convert_price(args.product_id, &args.currency)
                .await
                .with_context(|| format!("failed to convert price of {}", args.product_id))?;
            let view = PriceView {
                product_id: args.product_id,
                currency: currency::normalize_currency(&args.currency),
                amount,
            };
            if cli.json {
                print_json(&view)?;
            } else {
                println!("{} {}", view.amount, view.currency);
            }
        }
        Commands::ShowProduct(args) => {
            let catalog = catalog_service(&cfg).await?;
            let view = product_view(&catalog, args.product_id).await?;
            if cli.json {
                print_json(&view)?;
            } else {
                println!("{}", view.product);
                println!(
                    "  price: {} {} (updated {})",
                    view.product.price,
                    catalog.base_currency(),
                    view.product.updated_price
                );
                println!("  categories: {}", view.categories.join(", "));
                println!("  sizes: {}", view.sizes.join(", "));
                for url in &view.photo_urls {
                    println!("  photo: {}", url);
                }
            }
        }
    }

    Ok(())
}

async fn handle_migrate(cfg: &AppConfig, args: MigrateArgs) -> Result<()> {
    if args.down {
        info!("Rolling back migrations");
        migrator::rollback_migration(cfg.database_url(), args.steps).await
    } else {
        info!("Applying migrations");
        migrator::run_migration(cfg.database_url()).await
    }
}

async fn catalog_service(cfg: &AppConfig) -> Result<CatalogService> {
    let pool = db::establish_connection_from_app_config(cfg)
        .await
        .context("failed to connect to database")?;
    db::check_connection(&pool)
        .await
        .context("database is not answering")?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    let storage = MediaStorage::from_config(&cfg.storage)?;
    let rates = currency::provider_from_config(cfg)?;
    Ok(CatalogService::new(
        Arc::new(pool),
        storage,
        rates,
        cfg.base_currency.clone(),
    ))
}

async fn product_view(catalog: &CatalogService, product_id: Uuid) -> Result<ProductView> {
    let product = catalog
        .get_product(product_id)
        .await
        .with_context(|| format!("failed to load product {}", product_id))?;
    let categories = catalog
        .product_categories(product_id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let sizes = catalog
        .sizes_for_product(product_id)
        .await?
        .into_iter()
        .map(|s| format!("{} ({} left)", s.size, s.quantity))
        .collect();
    let photo_urls = catalog.photo_urls(product_id).await?;

    Ok(ProductView {
        product,
        categories,
        sizes,
        photo_urls,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
