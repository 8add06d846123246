/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// Persistent reply keyboard: each button sends its label as a plain message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    /// Lay `labels` out `per_row` buttons per row; a short last row is kept.
    pub fn grid(labels: &[String], per_row: usize) -> Self {
        let rows = labels
            .chunks(per_row.max(1))
            .map(|row| row.to_vec())
            .collect();
        Self { rows }
    }

    pub fn two_per_row(labels: &[String]) -> Self {
        Self::grid(labels, 2)
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_keyboards: bool,
    pub supports_chat_actions: bool,
    pub max_message_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_per_row_keeps_odd_tail() {
        let labels: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let kb = ReplyKeyboard::two_per_row(&labels);
        assert_eq!(
            kb.rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
                vec!["e".to_string()],
            ]
        );
    }

    #[test]
    fn empty_labels_give_empty_keyboard() {
        assert!(ReplyKeyboard::two_per_row(&[]).rows.is_empty());
    }
}
