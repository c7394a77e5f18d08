#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod alert;
mod commands;
mod component;
mod config;
mod confirm;
mod db;
mod error;
mod gate;
mod handler;
mod manager;
mod modal;
mod reminder;
mod reminder_menu;
mod sound;
mod voice;

use config::Config;
use dotenv::dotenv;
use handler::Handler;
use log::{error, info};
use serenity::prelude::*;
use songbird::SerenityInit;
use std::process;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().unwrap_or_else(|why| {
        error!("Invalid configuration: {}", why);
        process::exit(1);
    });
    let token = config.token.clone();

    let handler = Handler::with_config(config).await.unwrap_or_else(|why| {
        error!("Cannot set up the bot: {}", why);
        process::exit(1);
    });

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird()
        .await
        .unwrap_or_else(|why| {
            error!("Error creating client: {}", why);
            process::exit(1);
        });

    info!("Starting client");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
