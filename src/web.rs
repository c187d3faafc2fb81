use inventory_grid::app;
use inventory_grid::config::Config;

/// Main entry point for the web application
///
/// Loads the configuration (see [`Config::from_env`]), opens the default
/// sheet and serves the grid API.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    app::run(config).await
}
