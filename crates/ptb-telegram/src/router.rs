use std::{convert::Infallible, sync::Arc};

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::{webhooks, UpdateListener},
};

use ptb_core::{
    config::{Config, WebhookConfig},
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    service::TenderService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<TenderService>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Run the bot until Ctrl-C: webhook mode when a public base URL is
/// configured, long polling otherwise.
pub async fn run(cfg: Arc<Config>, service: Arc<TenderService>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "getMe failed; continuing"),
    }
    tracing::info!(
        api = %service.settings().api_base_url,
        keywords = cfg.keywords.len(),
        "tender search configured"
    );

    // Several chunks go out back to back for long answers; space them per chat.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        service,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();

    match &cfg.webhook {
        Some(hook) => {
            let listener = webhook_listener(bot.clone(), hook).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook listener error"),
                )
                .await;
        }
        None => {
            tracing::info!("no public base URL configured; using long polling");
            dispatcher.dispatch().await;
        }
    }

    tracing::info!("bot stopped");
    Ok(())
}

/// Register the webhook and serve it next to a `GET /` health check.
///
/// The server shuts down with the listener; teloxide's stop future deletes the
/// webhook on the way out.
async fn webhook_listener(
    bot: Bot,
    hook: &WebhookConfig,
) -> anyhow::Result<impl UpdateListener<Err = Infallible>> {
    let url: reqwest::Url = hook.url().parse()?;
    tracing::info!(
        base_url = %hook.base_url,
        listen = %hook.listen_addr,
        "registering webhook"
    );

    let (mut listener, stop_flag, webhook_routes) =
        webhooks::axum_to_router(bot, webhooks::Options::new(hook.listen_addr, url)).await?;
    let stop_token = listener.stop_token();
    let server = axum::Server::try_bind(&hook.listen_addr)?;
    let app = webhook_routes.merge(health_routes());

    tokio::spawn(async move {
        let served = server
            .serve(app.into_make_service())
            .with_graceful_shutdown(stop_flag)
            .await;
        if let Err(e) = served {
            tracing::error!(error = %e, "webhook server failed");
            stop_token.stop();
        }
    });

    Ok(listener)
}

fn health_routes() -> axum::Router {
    axum::Router::new().route("/", axum::routing::get(health))
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
