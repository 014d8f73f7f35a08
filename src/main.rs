use std::sync::Arc;

use dotenv::dotenv;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

use quiz_tgbot::config::Config;
use quiz_tgbot::error::QuizError;
use quiz_tgbot::health;
use quiz_tgbot::leaderboard::{LeaderboardStore, PgBackend};
use quiz_tgbot::quiz::engine::{AnswerOutcome, QuizEngine};
use quiz_tgbot::quiz::{QuestionBank, QuizQuestion};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const INVALID_OPTION_TEXT: &str =
    "That answer is not one of the options. Use the buttons below the question.";
const STORAGE_FAILURE_TEXT: &str = "Something went wrong on our side. Please try again later.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start a new quiz.")]
    Start,
    #[command(description = "show the top 10 players.")]
    Leaderboard,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = Config::from_env().expect("Incomplete configuration");

    let bank =
        QuestionBank::load_path(&config.questions_file).expect("Failed to load the questions file");
    println!("Loaded {} questions", bank.len());

    println!("Establishing connection to the database...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    println!("Connection established");

    let leaderboard = LeaderboardStore::new(Box::new(PgBackend::new(pool)));
    leaderboard
        .ensure_schema()
        .await
        .expect("Failed to initialize the leaderboard table");

    // Warm the cache up front; if that fails it fills itself on first use.
    match leaderboard.load_all().await {
        Ok(entries) => log::info!("Leaderboard cache warmed with {} entries", entries.len()),
        Err(e) => log::warn!("Could not warm the leaderboard cache: {}", e),
    }

    let engine = Arc::new(QuizEngine::new(bank, leaderboard));

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            log::error!("Liveness endpoint failed: {}", e);
        }
    });

    let bot = Bot::new(&config.bot_token);

    Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(Update::filter_callback_query().endpoint(handle_answer)),
    )
    .dependencies(dptree::deps![engine])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

async fn handle_command(
    bot: Bot,
    engine: Arc<QuizEngine>,
    msg: Message,
    cmd: Command,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        // Channel posts and the like have no sender to track a quiz for.
        return Ok(());
    };

    match cmd {
        Command::Start => {
            let (question, total) = engine.begin(&user.id.to_string()).await;
            send_question(&bot, msg.chat.id, &question, 1, total).await?;
        }
        Command::Leaderboard => match engine.leaderboard_text().await {
            Ok(text) => {
                bot.send_message(msg.chat.id, text).await?;
            }
            Err(e) => {
                log::error!("Failed to load the leaderboard: {}", e);
                bot.send_message(msg.chat.id, STORAGE_FAILURE_TEXT).await?;
            }
        },
    }
    Ok(())
}

async fn handle_answer(bot: Bot, engine: Arc<QuizEngine>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let user_id = q.from.id.to_string();
    let display_name = q.from.username.as_deref();

    let chosen = match q.data.as_deref().and_then(|data| data.parse::<usize>().ok()) {
        Some(chosen) => chosen,
        None => {
            bot.send_message(chat_id, INVALID_OPTION_TEXT).await?;
            return Ok(());
        }
    };

    match engine.answer(&user_id, display_name, chosen).await {
        Ok(AnswerOutcome::Next {
            correct,
            question,
            number,
            total,
        }) => {
            bot.send_message(chat_id, verdict_text(correct)).await?;
            send_question(&bot, chat_id, &question, number, total).await?;
        }
        Ok(AnswerOutcome::Completed {
            correct,
            score,
            total,
            leaderboard,
        }) => {
            bot.send_message(chat_id, verdict_text(correct)).await?;
            bot.send_message(
                chat_id,
                format!("The quiz is over! You scored {score} out of {total}.\n\n{leaderboard}"),
            )
            .await?;
        }
        Err(QuizError::NoActiveSession) => {
            bot.send_message(chat_id, "You have no quiz in progress. Send /start to begin one.")
                .await?;
        }
        Err(QuizError::InvalidOption { .. }) => {
            bot.send_message(chat_id, INVALID_OPTION_TEXT).await?;
        }
        Err(QuizError::Storage(e)) => {
            log::error!("Failed to save a quiz result: {}", e);
            bot.send_message(chat_id, STORAGE_FAILURE_TEXT).await?;
        }
    }
    Ok(())
}

fn verdict_text(correct: bool) -> &'static str {
    if correct {
        "Correct!"
    } else {
        "Wrong!"
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    question: &QuizQuestion,
    number: usize,
    total: usize,
) -> HandlerResult {
    // One button per option; the callback data is the option's index.
    let keyboard = InlineKeyboardMarkup::new(
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| vec![InlineKeyboardButton::callback(option.clone(), i.to_string())]),
    );

    bot.send_message(
        chat_id,
        format!("Question {number}/{total}:\n{}", question.prompt),
    )
    .reply_markup(keyboard)
    .await?;
    Ok(())
}
