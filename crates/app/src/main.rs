//! Entry point for Terrascape.

use anyhow::Result;
use platform::DemoConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DemoConfig::from_args(std::env::args().skip(1));
    log::info!(
        "Starting Terrascape. window_size={}x{}, assets={}, mesh={}",
        config.width,
        config.height,
        config.asset_dir.display(),
        config
            .mesh
            .as_deref()
            .map_or_else(|| "<terrain grid>".into(), |p| p.display().to_string())
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
