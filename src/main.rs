mod messages;
mod picker;
mod stats;
mod store;
mod triggers;

use dptree::deps;
use teloxide::macros::BotCommands;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::picker::PickOutcome;
use crate::store::PickStore;

const DEFAULT_DATA_FILE: &str = "stats.json";

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case")]
enum Command {
    Pick,
    Stat,
    Help,
}

async fn reply(bot: &Bot, msg: &Message, text: String) -> Result<(), teloxide::RequestError> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(teloxide::types::ParseMode::MarkdownV2)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    store: PickStore,
) -> Result<(), teloxide::RequestError> {
    log::info!("{:?} in chat {}", cmd, msg.chat.id);

    match cmd {
        Command::Help => reply(&bot, &msg, messages::help()).await,
        Command::Pick => handle_pick(bot, msg, store).await,
        Command::Stat => handle_stat(bot, msg, store).await,
    }
}

async fn handle_pick(bot: Bot, msg: Message, store: PickStore) -> Result<(), teloxide::RequestError> {
    if msg.chat.is_private() {
        return reply(&bot, &msg, messages::group_only()).await;
    }

    let chat_id = msg.chat.id;
    let now = chrono::Utc::now();

    // spare the admin-list round trip while the cooldown is running
    if let Some(cooldown) = store.cooldown(chat_id, now).await {
        return reply(&bot, &msg, messages::on_cooldown(&cooldown)).await;
    }

    let admins = match bot.get_chat_administrators(chat_id).await {
        Ok(admins) => admins,
        Err(e) => {
            log::warn!("Failed to fetch administrators of chat {chat_id}: {e}");
            return reply(&bot, &msg, messages::admin_list_failed()).await;
        }
    };

    let candidates = picker::eligible_candidates(admins.into_iter().map(|member| member.user));

    let text = match store.attempt_pick(chat_id, now, &candidates).await {
        PickOutcome::Picked { first, second } => messages::picked(&first, &second),
        PickOutcome::OnCooldown(cooldown) => messages::on_cooldown(&cooldown),
        PickOutcome::NotEnoughCandidates => messages::not_enough_candidates(),
    };

    reply(&bot, &msg, text).await
}

async fn handle_stat(bot: Bot, msg: Message, store: PickStore) -> Result<(), teloxide::RequestError> {
    if msg.chat.is_private() {
        return reply(&bot, &msg, messages::group_only()).await;
    }

    let text = match store.stats(msg.chat.id, chrono::Utc::now()).await {
        Some(stats) => messages::stats(&stats),
        None => messages::no_stats(),
    };

    reply(&bot, &msg, text).await
}

async fn handle_text(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let sender = match &user.username {
        Some(name) => format!("@{name}"),
        None => format!("ID{}", user.id),
    };
    let chat_title = msg.chat.title().unwrap_or("private");
    log::info!(
        "Message: {text:?} | from: {sender} ({}) | chat: {chat_title} ({})",
        user.id,
        msg.chat.id
    );

    if msg.chat.is_private() {
        return Ok(());
    }

    let admins = match bot.get_chat_administrators(msg.chat.id).await {
        Ok(admins) => admins,
        Err(e) => {
            log::warn!("Failed to fetch administrators of chat {}: {e}", msg.chat.id);
            return Ok(());
        }
    };
    let is_admin = admins.iter().any(|member| member.user.id == user.id);

    if let Some(response) = triggers::response(text, is_admin) {
        log::info!("Trigger reply in chat {}: {response:?}", msg.chat.id);
        bot.send_message(msg.chat.id, response).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    log::info!("Starting bot...");

    let bot = Bot::from_env();
    let data_file =
        std::env::var("DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
    let store = PickStore::load(data_file);

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
        .branch(
            dptree::filter(|msg: Message| {
                msg.text().map(|text| !text.starts_with('/')).unwrap_or(false)
            })
            .endpoint(handle_text),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(deps![store.clone()])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher stopped, saving data...");
    store.save().await;
}
