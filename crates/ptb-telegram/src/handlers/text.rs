use std::{sync::Arc, time::Duration};

use teloxide::prelude::*;

use ptb_core::{
    domain::ChatId,
    service::{deliver, with_typing},
};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let keyword = text.trim();
    if keyword.is_empty() {
        return Ok(());
    }

    let chat_id = ChatId(msg.chat.id.0);
    let user_id = msg.from().map(|u| u.id.0);
    tracing::info!(chat_id = chat_id.0, user_id, keyword, "keyword query received");

    let replies = with_typing(
        state.messenger.clone(),
        chat_id,
        Duration::from_secs(4),
        state.service.answer_keyword(keyword),
    )
    .await;

    if let Err(e) = deliver(state.messenger.as_ref(), chat_id, &replies).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to deliver tender reply");
    }

    Ok(())
}
