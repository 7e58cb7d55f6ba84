//! Texts sent to Telegram chats

use crate::{
    jobs::ReadJob,
    models::{book::Book, borrowing::BorrowingSummary},
};

pub const WELCOME_SUFFIX: &str = "Welcome to the Library.";
pub const HELP_TEXT: &str = "Use /start to open the options.";
pub const FALLBACK_TEXT: &str = "I don't understand you...Please select /start or /help";
pub const UNAVAILABLE_TEXT: &str =
    "The library is not responding right now, please try again later.";
pub const NOT_LINKED_TEXT: &str = "Your Telegram account is not linked to a library user.";

/// Notification sent when a borrowing is created
pub fn borrowing_created(book: &Book) -> String {
    format!("Borrowing created - {}", book)
}

/// Reply text of a read job. `None` means the chat is not linked.
pub fn borrowings_reply(rows: Option<&[BorrowingSummary]>, kind: ReadJob) -> String {
    let Some(rows) = rows else {
        return NOT_LINKED_TEXT.to_string();
    };

    if rows.is_empty() {
        return match kind {
            ReadJob::Borrowings => "You have no borrowings.".to_string(),
            ReadJob::Overdue => "You have no overdue borrowings.".to_string(),
        };
    }

    rows.iter()
        .map(|row| {
            format!(
                "{}({}) - due {}",
                row.title,
                row.author,
                row.expected_return_date.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Heading of the edited bot message for a read job
pub fn reply_heading(kind: ReadJob) -> &'static str {
    match kind {
        ReadJob::Borrowings => "Your borrowings:",
        ReadJob::Overdue => "Your overdue borrowings:",
    }
}

/// HTML body of the bot message showing a read job result
pub fn bot_reply_html(kind: ReadJob, text: &str) -> String {
    format!(
        "<b>{}</b>\n<i>{}</i>",
        reply_heading(kind),
        escape_html(text)
    )
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
