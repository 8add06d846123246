//! Keyword query pipeline: cutoff → feed → matcher → formatter.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    config::SearchSettings,
    domain::{ChatId, MessageRef},
    feed::{fetch_since, FeedLimits, TenderFeedPort},
    formatting::{failure_message, no_results_message, render},
    matcher::match_keyword,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, ReplyKeyboard},
    },
    Result,
};

/// Outcome of one keyword query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    Tenders { chunks: Vec<String>, matched: usize },
    NoResults,
}

/// Answers keyword queries against the tender feed.
///
/// Stateless between calls: every query computes its own cutoff and runs its
/// own fetch, so concurrent queries share nothing but the read-only settings.
pub struct TenderService {
    settings: SearchSettings,
    feed: Arc<dyn TenderFeedPort>,
}

impl TenderService {
    pub fn new(settings: SearchSettings, feed: Arc<dyn TenderFeedPort>) -> Self {
        Self { settings, feed }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run the pipeline for `keyword` as of `now`.
    pub async fn answer_at(&self, keyword: &str, now: DateTime<Utc>) -> Result<Answer> {
        let cutoff = now - self.settings.lookback;
        let recent = fetch_since(
            self.feed.as_ref(),
            cutoff,
            FeedLimits::from(&self.settings),
        )
        .await?;
        let matched = match_keyword(keyword, &recent);

        tracing::info!(
            keyword,
            fetched = recent.len(),
            matched = matched.len(),
            "tender query finished"
        );

        if matched.is_empty() {
            return Ok(Answer::NoResults);
        }
        Ok(Answer::Tenders {
            chunks: render(keyword, &matched, &self.settings),
            matched: matched.len(),
        })
    }

    /// Texts to send back for one inbound message, in order.
    ///
    /// Empty input yields nothing. An upstream failure yields a failure
    /// notice, never the "no results" message.
    pub async fn answer_keyword(&self, text: &str) -> Vec<String> {
        let keyword = text.trim();
        if keyword.is_empty() {
            return Vec::new();
        }

        match self.answer_at(keyword, Utc::now()).await {
            Ok(Answer::Tenders { chunks, .. }) => chunks,
            Ok(Answer::NoResults) => vec![no_results_message(
                keyword,
                self.settings.lookback_hours(),
            )],
            Err(e) => {
                tracing::error!(keyword, error = %e, "tender feed query failed");
                vec![failure_message(keyword)]
            }
        }
    }
}

/// Send `chunks` to `chat_id` in order; stops at the first failed send.
///
/// Returns how many chunks were delivered.
pub async fn deliver(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    chunks: &[String],
) -> Result<usize> {
    let max_len = messenger.capabilities().max_message_len;
    for (sent, chunk) in chunks.iter().enumerate() {
        if chunk.chars().count() > max_len {
            tracing::warn!(chat_id = chat_id.0, max_len, "chunk exceeds messenger limit");
        }
        if let Err(e) = messenger.send_text(chat_id, chunk).await {
            tracing::warn!(chat_id = chat_id.0, sent, total = chunks.len(), error = %e, "delivery aborted");
            return Err(e);
        }
    }
    Ok(chunks.len())
}

/// Await `work` while a typing indicator is refreshed every `every`.
///
/// Messengers without chat actions just run `work`.
pub async fn with_typing<F: Future>(
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
    every: std::time::Duration,
    work: F,
) -> F::Output {
    if !messenger.capabilities().supports_chat_actions {
        return work.await;
    }

    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
    let typing = tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tokio::select! {
              _ = tick.tick() => {
                let _ = messenger.send_chat_action(chat_id, ChatAction::Typing).await;
              }
              _ = &mut stop_rx => break,
            }
        }
    });

    let out = work.await;
    let _ = stop_tx.send(());
    let _ = typing.await;
    out
}

/// Send `text` with `keyboard` attached, or as plain text when the messenger
/// has no keyboards.
pub async fn send_with_keyboard(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    text: &str,
    keyboard: ReplyKeyboard,
) -> Result<MessageRef> {
    if messenger.capabilities().supports_keyboards {
        messenger.send_keyboard(chat_id, text, keyboard).await
    } else {
        messenger.send_text(chat_id, text).await
    }
}
