use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "msk")]
#[command(about = "MilkSync delivery operator console", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> overlay)
    #[arg(long = "config", default_value = "config/base.yaml")]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Order commands
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },

    /// Product picker utilities
    Products {
        #[command(subcommand)]
        cmd: ProductsCmd,
    },

    /// Delivery journal utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },

    /// Compute the layered config hash + print canonical JSON
    ConfigHash,
}

#[derive(Subcommand)]
enum OrdersCmd {
    /// List orders
    List {
        /// Listing scope: default | mine | all
        #[arg(long, default_value = "default")]
        scope: String,
    },

    /// Print one order in full
    Show {
        #[arg(long)]
        id: String,
    },

    /// Edit a pending order's line items and date
    Edit {
        #[arg(long)]
        id: String,

        /// Set a line's quantity: PRODUCT=QTY (repeatable)
        #[arg(long = "set-qty")]
        set_qty: Vec<String>,

        /// Bump a line's quantity: PRODUCT=+N or PRODUCT=-N (repeatable)
        #[arg(long = "bump-qty")]
        bump_qty: Vec<String>,

        /// Change a line's display unit: PRODUCT=UNIT (repeatable)
        #[arg(long)]
        unit: Vec<String>,

        /// Add a product line with quantity 1 (repeatable; needs --company)
        #[arg(long)]
        add: Vec<String>,

        /// Remove a product line (repeatable)
        #[arg(long)]
        remove: Vec<String>,

        /// Company whose catalog backs --add lookups
        #[arg(long)]
        company: Option<String>,

        /// Reschedule the order: YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Deliver a pending order, accounting damaged packets
    Deliver {
        #[arg(long)]
        id: String,

        /// Damaged packets per line: PRODUCT=PACKETS (repeatable)
        #[arg(long)]
        damage: Vec<String>,

        /// Acknowledge the printed damage summary (required when damage > 0)
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Delete a pending order
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum ProductsCmd {
    /// List the addable products of one company
    List {
        #[arg(long)]
        company: String,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the delivery journal's hash chain
    Verify {
        /// Journal path (defaults to the configured one)
        #[arg(long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev-time secrets; absence is fine.
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash => commands::config_hash(&cli.config_paths),
        Commands::Audit {
            cmd: AuditCmd::Verify { path },
        } => commands::audit::verify(&cli.config_paths, path.as_deref()),
        Commands::Products {
            cmd: ProductsCmd::List { company },
        } => {
            let console = commands::Console::build(&cli.config_paths)?;
            commands::products::list(&console, &company).await
        }
        Commands::Orders { cmd } => {
            let console = commands::Console::build(&cli.config_paths)?;
            match cmd {
                OrdersCmd::List { scope } => commands::orders::list(&console, &scope).await,
                OrdersCmd::Show { id } => commands::orders::show(&console, &id).await,
                OrdersCmd::Edit {
                    id,
                    set_qty,
                    bump_qty,
                    unit,
                    add,
                    remove,
                    company,
                    date,
                } => {
                    commands::orders::edit(
                        &console,
                        commands::orders::EditArgs {
                            id,
                            set_qty,
                            bump_qty,
                            unit,
                            add,
                            remove,
                            company,
                            date,
                        },
                    )
                    .await
                }
                OrdersCmd::Deliver { id, damage, yes } => {
                    commands::orders::deliver(&console, &id, &damage, yes).await
                }
                OrdersCmd::Delete { id } => commands::orders::delete(&console, &id).await,
            }
        }
    }
}
