use reelgrab_api::setup;
use reelgrab_core::Config;

// Use mimalloc as the global allocator for lower fragmentation in long-running containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (storage, resolver, routes, retention sweep)
    let app = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, app.router, app.sweep).await?;

    Ok(())
}
