//! Prompt and caption templates.

use crate::chat::mention;
use crate::core::models::Message;

/// Max characters of user text forwarded to the generation service.
pub const MAX_PROMPT_LEN: usize = 1000;

/// Max characters of quoted text shown in captions.
pub const DISPLAY_SNIPPET_LEN: usize = 80;

pub const PLACEHOLDER_TEXT: &str = "🎨 Generating your meme…";
pub const FAILURE_TEXT: &str = "Sorry, I couldn't generate that meme. Please try again later.";
pub const EMPTY_PROMPT_TEXT: &str =
    "Tell me what the meme should be about, e.g. `@memebot cats doing taxes`.";
pub const GENERIC_CAPTION: &str = "Here's a fresh meme for the channel!";

/// Remove control characters and hard-truncate user-typed text for the prompt.
#[must_use]
pub fn sanitize_prompt(raw: &str) -> String {
    strip_control(raw).chars().take(MAX_PROMPT_LEN).collect::<String>().trim().to_string()
}

/// Remove control characters, keeping newlines. Length is left alone.
#[must_use]
pub fn strip_control(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Shorten `text` to `max_chars` characters, marking the cut with an ellipsis.
#[must_use]
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Generation prompt for a scheduled post. Embeds the whole message text.
#[must_use]
pub fn cycle_prompt(message: &Message) -> String {
    format!(
        "Make a funny meme reacting to this message that user {} posted in a group chat: \"{}\"",
        message.author_id,
        strip_control(&message.text)
    )
}

/// Caption for a scheduled post, tagging the author of the source message.
#[must_use]
pub fn cycle_caption(message: &Message) -> String {
    format!(
        "{} your message inspired a meme: \"{}\"",
        mention(&message.author_id),
        truncate_for_display(&message.text, DISPLAY_SNIPPET_LEN)
    )
}

/// Caption for a meme requested through a mention or `/meme`.
#[must_use]
pub fn mention_caption(author_id: &str, prompt: &str) -> String {
    format!(
        "{} here's your meme: \"{}\"",
        mention(author_id),
        truncate_for_display(prompt, DISPLAY_SNIPPET_LEN)
    )
}
