use std::sync::Arc;

use teloxide::prelude::*;

use ptb_core::{domain::ChatId, messaging::types::ReplyKeyboard, service::send_with_keyboard};

use crate::router::AppState;

use super::text;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub(crate) fn greeting(lookback_hours: i64) -> String {
    format!(
        "Привіт! Я шукаю тендери в Prozorro за останні {lookback_hours} години по вибраним ключовим словам.\n\
         Натисніть кнопку або напишіть слово."
    )
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, _args) = parse_command(text);

    match cmd.as_str() {
        "start" | "help" => {
            let chat_id = ChatId(msg.chat.id.0);
            let keyboard = ReplyKeyboard::two_per_row(&state.cfg.keywords);
            let greeting = greeting(state.service.settings().lookback_hours());
            if let Err(e) =
                send_with_keyboard(state.messenger.as_ref(), chat_id, &greeting, keyboard).await
            {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send greeting");
            }
            Ok(())
        }
        // Anything else is searched like free text.
        _ => text::handle_text(msg, state).await,
    }
}
