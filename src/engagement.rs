//! Engagement ranking for recent channel messages.
//!
//! A message scores `reaction_total + char_count / 10`. The highest score wins,
//! ties go to the message seen first, and bot-authored messages never compete.

use crate::core::models::Message;

/// Outcome of scanning a window of messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    /// A message scored above zero and beat every later candidate.
    Engaging { message: &'a Message, score: f64 },
    /// Nothing scored above zero; the first non-bot message in scan order.
    MostRecent(&'a Message),
    /// Every message was bot-authored (or the window was empty).
    Nothing,
}

impl<'a> Selection<'a> {
    #[must_use]
    pub fn message(&self) -> Option<&'a Message> {
        match *self {
            Selection::Engaging { message, .. } | Selection::MostRecent(message) => Some(message),
            Selection::Nothing => None,
        }
    }
}

/// Engagement score of a single message.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_score(message: &Message) -> f64 {
    let length = message.text.chars().count() as f64;
    message.reaction_total() as f64 + length / 10.0
}

/// Pick the most engaging human-authored message from `messages`.
#[must_use]
pub fn select_most_engaging(messages: &[Message]) -> Selection<'_> {
    let mut first_candidate: Option<&Message> = None;
    let mut best: Option<(&Message, f64)> = None;
    let mut best_score = 0.0_f64;

    for message in messages.iter().filter(|m| !m.is_from_bot) {
        if first_candidate.is_none() {
            first_candidate = Some(message);
        }

        let score = engagement_score(message);
        if score > best_score {
            best_score = score;
            best = Some((message, score));
        }
    }

    match (best, first_candidate) {
        (Some((message, score)), _) => Selection::Engaging { message, score },
        (None, Some(message)) => Selection::MostRecent(message),
        (None, None) => Selection::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Reaction;

    fn msg(id: &str, text: &str, reactions: &[u32], is_from_bot: bool) -> Message {
        Message {
            id: id.to_string(),
            author_id: format!("U{id}"),
            is_from_bot,
            text: text.to_string(),
            reactions: reactions
                .iter()
                .map(|&count| Reaction {
                    name: "joy".to_string(),
                    count,
                })
                .collect(),
        }
    }

    #[test]
    fn score_counts_characters_not_bytes() {
        let m = msg("1", "héllo wörld", &[], false);
        assert!((engagement_score(&m) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn score_sums_every_reaction() {
        let m = msg("1", "", &[2, 3, 4], false);
        assert!((engagement_score(&m) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn empty_window_selects_nothing() {
        assert_eq!(select_most_engaging(&[]), Selection::Nothing);
    }

    #[test]
    fn later_message_must_strictly_beat_earlier() {
        let messages = vec![msg("a", "1234567890", &[], false), msg("b", "", &[1], false)];
        let selected = select_most_engaging(&messages);
        assert_eq!(selected.message().map(|m| m.id.as_str()), Some("a"));
    }

    #[test]
    fn bot_reactions_do_not_count_towards_fallback() {
        let messages = vec![msg("bot", "", &[50], true), msg("human", "", &[], false)];
        assert_eq!(
            select_most_engaging(&messages),
            Selection::MostRecent(&messages[1])
        );
    }
}
