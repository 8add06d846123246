use std::sync::Arc;

use ptb_core::{config::Config, service::TenderService};
use ptb_prozorro::ProzorroClient;

#[tokio::main]
async fn main() -> Result<(), ptb_core::Error> {
    ptb_core::logging::init("ptb")?;

    let cfg = Arc::new(Config::load()?);

    let feed = Arc::new(ProzorroClient::from_settings(&cfg.search)?);
    let service = Arc::new(TenderService::new(cfg.search.clone(), feed));

    ptb_telegram::router::run(cfg, service)
        .await
        .map_err(|e| ptb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
