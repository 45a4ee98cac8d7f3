use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};

use foodgram::{
    config::Config,
    fixtures::{load_ingredients, load_tags},
    routes::routes,
    state::State,
};

#[derive(Parser)]
#[command(name = "foodgram", version, about = "Recipe sharing backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Import the ingredient and tag catalogs from JSON files
    LoadData {
        #[arg(long, default_value = "data/ingredients.json")]
        ingredients: PathBuf,

        #[arg(long, default_value = "data/tags.json")]
        tags: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let state = State::connect(config).await?;

    log::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&state.pool).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state).await?,
        Commands::LoadData { ingredients, tags } => {
            let ingredient_count = load_ingredients(&ingredients, &state.pool).await?;
            let tag_count = load_tags(&tags, &state.pool).await?;
            log::info!("Imported {ingredient_count} ingredients and {tag_count} tags");
        }
    }

    Ok(())
}

async fn serve(state: State) -> Result<(), Box<dyn Error>> {
    tokio::fs::create_dir_all(&state.config.media_root).await?;

    let address = state.config.bind;
    let (address, server) =
        warp::serve(routes(&state)).try_bind_with_graceful_shutdown(address, shutdown_signal())?;

    log::info!("Server running on {address}");
    server.await;

    log::info!("Server shutting down...");
    state.pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C, shutting down");
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
