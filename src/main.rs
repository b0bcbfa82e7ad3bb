use std::fs;
use std::path::Path;
use std::sync::Arc;

use umbrella_rewrite::{cfg, uuid_rewrite, ProxyInfo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: cfg::UmbrellaConfig =
        serde_json::from_reader(fs::File::open(Path::new("./config.json"))?)?;

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}/{}]: {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(config.log_level)
        .chain(std::io::stdout())
        .apply()?;

    log::info!("Umbrella logger initialized.");

    if config.uuid_rewrite.enabled && !config.is_uuid_rewrite_active() {
        log::warn!(
            "UUID rewrite is enabled but inactive: it needs online mode and no player info forwarding"
        );
    }

    let proxy_info = Arc::new(ProxyInfo::new(config));
    uuid_rewrite::on_proxy_start(&proxy_info);
    log::info!(
        "UUID rewrite {}",
        if proxy_info.config.is_uuid_rewrite_active() {
            "active"
        } else {
            "inactive"
        }
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down.");
    uuid_rewrite::on_proxy_stop(&proxy_info);
    Ok(())
}
