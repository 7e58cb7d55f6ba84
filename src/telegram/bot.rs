//! Long-polling Telegram bot letting readers look up their borrowings.
//!
//! The bot keeps no state and never touches the database: lookups go through
//! read jobs on the queue and the bot waits for their reply.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    utils::command::BotCommands,
};
use url::Url;

use super::format;
use crate::jobs::{JobQueue, ReadJob};

pub const VIEW_BORROWINGS: &str = "view_borrowings";
pub const VIEW_OVERDUE_BORROWINGS: &str = "view_overdue_borrowings";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Library bot commands:")]
pub enum Command {
    #[command(description = "open the library menu")]
    Start,
    #[command(description = "show how to use the bot")]
    Help,
}

/// Static settings handed to every handler
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub website_url: Url,
}

/// Run the bot until Ctrl-C
pub async fn run(bot: Bot, queue: Arc<dyn JobQueue>, settings: BotSettings) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::endpoint(handle_text)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    tracing::info!("Starting Telegram long polling");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![queue, Arc::new(settings)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    settings: Arc<BotSettings>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            let mention = msg
                .from
                .as_ref()
                .map(|user| mention_html(user.id.0, &user.full_name()));
            bot.send_message(msg.chat.id, welcome_html(mention))
                .parse_mode(ParseMode::Html)
                .reply_markup(start_keyboard(&settings.website_url))
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, format::HELP_TEXT).await?;
        }
    }
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, format::FALLBACK_TEXT).await?;
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    queue: Arc<dyn JobQueue>,
) -> ResponseResult<()> {
    let Some(kind) = q.data.as_deref().and_then(callback_kind) else {
        tracing::debug!(data = ?q.data, "Ignoring unknown callback");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    // Private chats share the user's id
    let chat_id = q.from.id.0 as i64;
    let html = read_job_reply(queue.as_ref(), kind, chat_id).await;

    bot.answer_callback_query(q.id.clone()).await?;
    if let Some(message) = q.regular_message() {
        bot.edit_message_text(message.chat.id, message.id, html)
            .parse_mode(ParseMode::Html)
            .await?;
    }
    Ok(())
}

/// Which read job a callback button asks for
pub fn callback_kind(data: &str) -> Option<ReadJob> {
    match data {
        VIEW_BORROWINGS => Some(ReadJob::Borrowings),
        VIEW_OVERDUE_BORROWINGS => Some(ReadJob::Overdue),
        _ => None,
    }
}

/// Menu shown by `/start`
pub fn start_keyboard(website_url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::url("Website Library", website_url.clone())],
        vec![InlineKeyboardButton::callback("Your borrowings", VIEW_BORROWINGS)],
        vec![InlineKeyboardButton::callback(
            "Overdue borrowings",
            VIEW_OVERDUE_BORROWINGS,
        )],
    ])
}

/// Clickable HTML mention of a Telegram user
pub fn mention_html(user_id: u64, name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id,
        format::escape_html(name)
    )
}

pub fn welcome_html(mention: Option<String>) -> String {
    format!(
        "Hello {}! {}",
        mention.as_deref().unwrap_or("there"),
        format::WELCOME_SUFFIX
    )
}

/// Ask the worker for a read job and render the answer, or the fallback text
pub async fn read_job_reply(queue: &dyn JobQueue, kind: ReadJob, chat_id: i64) -> String {
    match queue.request(kind, chat_id).await {
        Ok(text) => format::bot_reply_html(kind, &text),
        Err(e) => {
            tracing::warn!(chat_id, error = %e, "Read job failed");
            format::escape_html(format::UNAVAILABLE_TEXT)
        }
    }
}
