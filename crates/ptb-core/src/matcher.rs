use crate::tender::TenderRecord;

/// Keep the records whose title or description contains `keyword`
/// (case-insensitive), most recently modified first.
///
/// Records without a timestamp sort last. The sort is stable, so equal
/// timestamps keep their feed order.
pub fn match_keyword(keyword: &str, records: &[TenderRecord]) -> Vec<TenderRecord> {
    let needle = keyword.to_lowercase();

    let mut matched: Vec<TenderRecord> = records
        .iter()
        .filter(|t| {
            t.title_text().to_lowercase().contains(&needle)
                || t.description_text().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    // `None < Some(_)`, so a reversed comparison puts undated records at the end.
    matched.sort_by(|a, b| b.date_modified.cmp(&a.date_modified));
    matched
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn tender(id: &str, title: Option<&str>, descr: Option<&str>, mins_ago: Option<i64>) -> TenderRecord {
        TenderRecord {
            id: id.to_string(),
            title: title.map(str::to_string),
            description: descr.map(str::to_string),
            date_modified: mins_ago.map(|m| now() - Duration::minutes(m)),
            ..Default::default()
        }
    }

    #[test]
    fn matches_cyrillic_regardless_of_case() {
        let records = vec![
            tender("1", Some("Постачання БЕНТОНІТУ"), None, Some(1)),
            tender("2", Some("Щебінь"), Some("бентонітові мати для укосів"), Some(2)),
            tender("3", Some("Пісок"), Some("Глина"), Some(3)),
            tender("4", None, None, Some(4)),
            tender("5", Some("Бентоніт"), None, Some(5)),
        ];

        let out = match_keyword("Бентоніт", &records);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "5"]);
    }

    #[test]
    fn sorts_newest_first_with_undated_last() {
        let records = vec![
            tender("old", Some("геосітка"), None, Some(300)),
            tender("undated", Some("геосітка"), None, None),
            tender("new", Some("геосітка"), None, Some(5)),
            tender("mid", None, Some("Геосітка"), Some(60)),
        ];

        let out = match_keyword("геосітка", &records);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn no_matches_yields_empty() {
        let records = vec![tender("1", Some("Пісок"), None, Some(1))];
        assert!(match_keyword("геомембрана", &records).is_empty());
        assert!(match_keyword("x", &[]).is_empty());
    }
}
