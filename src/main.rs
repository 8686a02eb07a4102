mod authz;
mod entities;
mod errors;
mod settings;
mod store;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use migration::MigratorTrait;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "vivaria",
    version,
    about = "Research-data platform authorization tools"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Resolve and print one user's effective permissions on a project
    Check {
        /// Username to resolve permissions for
        #[arg(long)]
        user: String,
        /// Project id to resolve permissions on
        #[arg(long)]
        project: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database)
    let db = store::init(&settings.database).await?;

    match cli.command {
        Command::Migrate => {
            migration::Migrator::up(&db, None).await.into_diagnostic()?;
            tracing::info!("Migrations applied");
        }
        Command::Check { user, project } => {
            let user = store::get_user_by_username(&db, &user)
                .await?
                .ok_or_else(|| errors::VivariaError::Other(format!("Unknown user: {user}")))?;
            let project = store::get_project(&db, project)
                .await?
                .ok_or_else(|| errors::VivariaError::Other(format!("Unknown project: {project}")))?;

            let mut cache = authz::PermissionCache::new();
            let set = authz::resolve(&db, &mut cache, &user, &project).await?;
            println!("{}", serde_json::to_string_pretty(&set).into_diagnostic()?);
        }
    }

    Ok(())
}
