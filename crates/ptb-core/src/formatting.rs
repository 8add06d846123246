//! Rendering matched tenders into plain-text Telegram messages.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{config::SearchSettings, tender::TenderRecord};

/// Longest title / entity name rendered inside one block.
///
/// Keeps a single block well under the chunk limit so chunking never has to
/// split one.
const MAX_FIELD_CHARS: usize = 500;

/// Longest echo of the user's keyword in a header or notice.
const MAX_KEYWORD_CHARS: usize = 200;

/// Render the reply for `keyword`: a header plus one block per shown record,
/// packed into chunks of at most `settings.chunk_limit` characters.
///
/// `records` must be non-empty and already ordered (newest first); only the
/// first `settings.display_limit` are rendered.
pub fn render(keyword: &str, records: &[TenderRecord], settings: &SearchSettings) -> Vec<String> {
    let shown = records.len().min(settings.display_limit);

    let mut blocks = Vec::with_capacity(shown + 1);
    blocks.push(header(keyword, shown, records.len(), settings.lookback_hours()));
    blocks.extend(records[..shown].iter().map(|t| tender_block(t, settings)));

    chunk_blocks(blocks, settings.chunk_limit)
}

pub fn header(keyword: &str, shown: usize, total: usize, lookback_hours: i64) -> String {
    let keyword = shorten(keyword, MAX_KEYWORD_CHARS);
    format!("🧾 Тендери за {lookback_hours} години по запиту «{keyword}»: показую {shown} з {total}\n\n")
}

pub fn no_results_message(keyword: &str, lookback_hours: i64) -> String {
    let keyword = shorten(keyword, MAX_KEYWORD_CHARS);
    format!("За останні {lookback_hours} години по запиту «{keyword}» тендерів не знайдено.")
}

pub fn failure_message(keyword: &str) -> String {
    let keyword = shorten(keyword, MAX_KEYWORD_CHARS);
    format!(
        "⚠️ Не вдалося отримати дані з Prozorro для запиту «{keyword}». Спробуйте пізніше."
    )
}

pub fn tender_block(t: &TenderRecord, settings: &SearchSettings) -> String {
    let when = t
        .date_modified
        .map(|dt| format_local_time(dt, settings.display_tz))
        .unwrap_or_else(|| "—".to_string());

    format!(
        "• {}\nЗамовник: {}\nЗмінено: {} (Kyiv)\nПосилання: {}\n\n",
        shorten(t.title_or_placeholder(), MAX_FIELD_CHARS),
        shorten(t.entity_or_placeholder(), MAX_FIELD_CHARS),
        when,
        tender_link(t, settings),
    )
}

/// Public portal page when the registry number is known, API resource otherwise.
pub fn tender_link(t: &TenderRecord, settings: &SearchSettings) -> String {
    match t.registry_number() {
        Some(number) => format!("{}/{}", settings.portal_base_url, number),
        None => format!("{}/tenders/{}", settings.api_base_url, t.id),
    }
}

/// `YYYY-MM-DD HH:MM` in the given zone.
pub fn format_local_time(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Pack whole blocks into chunks of at most `limit` characters.
///
/// A block that does not fit into the current chunk starts a new one; blocks
/// are never split. Empty chunks are never emitted.
pub fn chunk_blocks(blocks: impl IntoIterator<Item = String>, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for block in blocks {
        let block_chars = block.chars().count();
        if !buf.is_empty() && buf_chars + block_chars > limit {
            chunks.push(std::mem::take(&mut buf));
            buf_chars = 0;
        }
        buf.push_str(&block);
        buf_chars += block_chars;
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn settings() -> SearchSettings {
        SearchSettings::default()
    }

    fn tender(i: usize, title: &str) -> TenderRecord {
        TenderRecord {
            id: format!("id{i}"),
            tender_id: Some(format!("UA-2025-03-10-{i:06}-a")),
            title: Some(title.to_string()),
            description: None,
            date_modified: Some(
                Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap() - Duration::minutes(i as i64),
            ),
            procuring_entity_name: Some("КП «Міськводоканал»".to_string()),
        }
    }

    #[test]
    fn renders_block_with_local_time_and_portal_link() {
        let t = tender(0, "Геосітка для армування");
        let block = tender_block(&t, &settings());
        assert_eq!(
            block,
            "• Геосітка для армування\n\
             Замовник: КП «Міськводоканал»\n\
             Змінено: 2025-03-10 14:00 (Kyiv)\n\
             Посилання: https://prozorro.gov.ua/tender/UA-2025-03-10-000000-a\n\n"
        );
    }

    #[test]
    fn kyiv_time_follows_summer_offset() {
        let dt = Utc.with_ymd_and_hms(2025, 7, 1, 21, 30, 0).unwrap();
        assert_eq!(format_local_time(dt, chrono_tz::Europe::Kyiv), "2025-07-02 00:30");
    }

    #[test]
    fn falls_back_to_api_link_and_placeholders() {
        let t = TenderRecord {
            id: "f00d".to_string(),
            ..Default::default()
        };
        let block = tender_block(&t, &settings());
        assert!(block.starts_with("• Без назви\nЗамовник: —\nЗмінено: — (Kyiv)\n"));
        assert!(block.contains(
            "Посилання: https://public.api.openprocurement.org/api/2.5/tenders/f00d\n"
        ));
    }

    #[test]
    fn header_reports_shown_and_total() {
        let records: Vec<_> = (0..12).map(|i| tender(i, "геосітка")).collect();
        let chunks = render("геосітка", &records, &settings());
        assert!(chunks[0].starts_with(
            "🧾 Тендери за 24 години по запиту «геосітка»: показую 10 з 12\n\n"
        ));
        let joined = chunks.concat();
        assert_eq!(joined.matches("• ").count(), 10);
        assert!(joined.contains("000009"));
        assert!(!joined.contains("000010"));
    }

    #[test]
    fn chunks_never_split_blocks_and_respect_limit() {
        let mut s = settings();
        s.chunk_limit = 600;
        let records: Vec<_> = (0..8).map(|i| tender(i, &"х".repeat(150))).collect();

        let chunks = render("х", &records, &s);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 600);
            assert!(!c.is_empty());
        }

        let mut expected = header("х", 8, 8, 24);
        for t in &records {
            expected.push_str(&tender_block(t, &s));
        }
        assert_eq!(chunks.concat(), expected);

        // Every chunk after the first begins at a block boundary.
        for c in &chunks[1..] {
            assert!(c.starts_with("• "));
            assert!(c.ends_with("\n\n"));
        }
    }

    #[test]
    fn chunk_blocks_counts_characters_not_bytes() {
        // 10 Cyrillic chars = 20 bytes each.
        let blocks = vec!["ж".repeat(10), "ж".repeat(10)];
        assert_eq!(chunk_blocks(blocks.clone(), 20).len(), 1);
        assert_eq!(chunk_blocks(blocks, 19).len(), 2);
    }

    #[test]
    fn oversized_first_block_does_not_produce_empty_chunk() {
        let chunks = chunk_blocks(vec!["a".repeat(50), "b".repeat(5)], 10);
        assert_eq!(chunks, vec!["a".repeat(50), "b".repeat(5)]);
    }

    #[test]
    fn long_titles_are_shortened() {
        let t = tender(1, &"я".repeat(2000));
        let block = tender_block(&t, &settings());
        assert!(block.chars().count() < 700);
        assert!(block.contains('…'));
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            no_results_message("бентоніт", 24),
            "За останні 24 години по запиту «бентоніт» тендерів не знайдено."
        );
        assert!(failure_message("бентоніт").contains("«бентоніт»"));
        assert_ne!(failure_message("x"), no_results_message("x", 24));
    }

    #[test]
    fn long_keyword_is_shortened_in_every_message() {
        let kw = "ж".repeat(3790);
        for text in [
            header(&kw, 1, 1, 24),
            no_results_message(&kw, 24),
            failure_message(&kw),
        ] {
            assert!(text.chars().count() < 400, "{} chars", text.chars().count());
            assert!(text.contains("…»"));
        }
    }
}
