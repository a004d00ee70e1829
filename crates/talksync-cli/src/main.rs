mod import;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "talksync")]
#[command(about = "Import talks and speakers from Pretalx")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import talks and speakers from a Pretalx event
    Import(import::ImportArgs),
    /// Database maintenance commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Import(args)) => {
            let config = talksync_core::AppConfig::from_env();
            let pool = talksync_db::connect_pool_from_env().await?;
            import::run(&pool, &config, &args).await
        }
        Some(Commands::Db {
            command: DbCommands::Ping,
        }) => {
            let pool = talksync_db::connect_pool_from_env().await?;
            talksync_db::ping(&pool).await?;
            println!("database connection ok");
            Ok(())
        }
        Some(Commands::Db {
            command: DbCommands::Migrate,
        }) => {
            let pool = talksync_db::connect_pool_from_env().await?;
            talksync_db::run_migrations(&pool).await?;
            println!("migrations applied");
            Ok(())
        }
        None => {
            println!("talksync: use `import` or `db` (see --help)");
            Ok(())
        }
    }
}
