//! GCDEX CLI - Main entry point

use clap::{Parser, Subcommand, ValueEnum};
use gcdex_cli::commands::{self, OrderFilter};
use gcdex_cli::AppContext;
use gcdex_exchange::OrderId;
use gcdex_runtime::DeployConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gcdex")]
#[command(about = "GCDEX - custodial token exchange", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderStatusArg {
    All,
    Open,
    Filled,
    Cancelled,
}

impl From<OrderStatusArg> for OrderFilter {
    fn from(arg: OrderStatusArg) -> Self {
        match arg {
            OrderStatusArg::All => OrderFilter::All,
            OrderStatusArg::Open => OrderFilter::Open,
            OrderStatusArg::Filled => OrderFilter::Filled,
            OrderStatusArg::Cancelled => OrderFilter::Cancelled,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the configured tokens and the exchange
    Deploy {
        /// Deployment config (JSON); defaults to $GCDEX_CONFIG or built-ins
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Transfer tokens between wallets
    Transfer {
        /// Sender account (label or 0x address)
        from: String,
        /// Recipient account
        to: String,
        /// Amount in whole units, e.g. 12.5
        amount: String,
        /// Token symbol or address
        token: String,
    },

    /// Approve a spender (the exchange by default)
    Approve {
        owner: String,
        amount: String,
        token: String,
        #[arg(long)]
        spender: Option<String>,
    },

    /// Deposit tokens into the exchange
    Deposit {
        user: String,
        amount: String,
        token: String,
        /// Approve the exchange for the amount first
        #[arg(long)]
        approve: bool,
    },

    /// Withdraw tokens from the exchange
    Withdraw {
        user: String,
        amount: String,
        token: String,
    },

    /// Offer `give` of one token for `get` of another
    MakeOrder {
        user: String,
        #[arg(long)]
        get: String,
        #[arg(long)]
        get_token: String,
        #[arg(long)]
        give: String,
        #[arg(long)]
        give_token: String,
    },

    /// Cancel an open order
    Cancel { user: String, id: OrderId },

    /// Fill an open order
    Fill { user: String, id: OrderId },

    /// Wallet and exchange balances of a user
    Balance { user: String },

    /// List orders
    Orders {
        #[arg(long, value_enum, default_value = "all")]
        status: OrderStatusArg,
        #[arg(long)]
        user: Option<String>,
    },

    /// Order book of a market
    Book {
        /// Base token (token0)
        base: String,
        /// Quote token (token1)
        quote: String,
    },

    /// Trade history of a market
    Trades {
        base: String,
        quote: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Print events as JSON lines
    Events {
        #[arg(long)]
        user: Option<String>,
    },

    /// Populate a deployed exchange with a sample market
    Seed {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay the journal (rebuild projections)
    Replay {
        /// Drop projections before replay
        #[arg(long)]
        reset: bool,
    },
}

fn deploy_config(path: Option<PathBuf>) -> Result<DeployConfig, anyhow::Error> {
    Ok(match path {
        Some(path) => DeployConfig::from_file(path)?,
        None => DeployConfig::load()?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut ctx = AppContext::new(&cli.data).await?;

    match cli.command {
        Commands::Deploy { config } => {
            let config = deploy_config(config)?;
            commands::deploy(&mut ctx, &config).await?;
        }

        Commands::Transfer { from, to, amount, token } => {
            commands::transfer(&mut ctx, &from, &to, &amount, &token).await?;
        }

        Commands::Approve {
            owner,
            amount,
            token,
            spender,
        } => {
            commands::approve(&mut ctx, &owner, spender.as_deref(), &amount, &token).await?;
        }

        Commands::Deposit {
            user,
            amount,
            token,
            approve,
        } => {
            if approve {
                commands::approve(&mut ctx, &user, None, &amount, &token).await?;
            }
            commands::deposit(&mut ctx, &user, &amount, &token).await?;
        }

        Commands::Withdraw { user, amount, token } => {
            commands::withdraw(&mut ctx, &user, &amount, &token).await?;
        }

        Commands::MakeOrder {
            user,
            get,
            get_token,
            give,
            give_token,
        } => {
            commands::make_order(&mut ctx, &user, (&get, &get_token), (&give, &give_token)).await?;
        }

        Commands::Cancel { user, id } => {
            commands::cancel(&mut ctx, &user, id).await?;
        }

        Commands::Fill { user, id } => {
            commands::fill(&mut ctx, &user, id).await?;
        }

        Commands::Balance { user } => {
            commands::balance(&ctx, &user).await?;
        }

        Commands::Orders { status, user } => {
            commands::orders(&ctx, status.into(), user.as_deref()).await?;
        }

        Commands::Book { base, quote } => {
            commands::book(&ctx, &base, &quote).await?;
        }

        Commands::Trades {
            base,
            quote,
            user,
            limit,
        } => {
            commands::trades(&ctx, &base, &quote, user.as_deref(), limit).await?;
        }

        Commands::Events { user } => {
            commands::events(&ctx, user.as_deref()).await?;
        }

        Commands::Seed { config } => {
            let config = deploy_config(config)?;
            commands::seed(&mut ctx, &config).await?;
        }

        Commands::Replay { reset } => {
            let projection_path = ctx.projection_path().to_path_buf();

            // Release the SQLite connection before touching the file
            drop(ctx);

            if reset && projection_path.exists() {
                println!("🗑️  Dropping projections...");
                std::fs::remove_file(&projection_path)?;
                println!("   Deleted {}", projection_path.display());
            }

            let ctx = AppContext::new(&cli.data).await?;
            println!(
                "✅ Replayed {} transactions ({} events)",
                ctx.last_sequence(),
                ctx.runtime.events().len()
            );
        }
    }

    Ok(())
}
