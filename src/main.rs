// Composition root: wires config, store, and API client together and
// drives the command handlers from a local stdin loop. A real chat
// transport would call the same handlers with the same arguments.

use std::io::BufRead;

use keystone_bot::blizzard::BlizzardClient;
use keystone_bot::commands;
use keystone_bot::config::Config;
use keystone_bot::db::{SqliteStore, UserId};
use keystone_bot::messages;

/// Owner id used for commands issued from the local loop.
const LOCAL_USER_ID: UserId = 1;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    let store = SqliteStore::connect(&config.database_url)
        .await
        .expect("Failed to initialize database");

    // Exactly one API client per process; constructed here and passed
    // by reference to whatever handles commands.
    let blizzard = config
        .blizzard
        .clone()
        .map(|cfg| BlizzardClient::new(cfg, config.seasonal_affix));
    if blizzard.is_none() {
        tracing::warn!("BLIZZARD_CLIENT_ID/SECRET not set; affix lookups are disabled");
    }

    tracing::info!("keystone bot ready; reading commands from stdin");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read stdin: {e}");
                break;
            }
        };
        match dispatch(&store, blizzard.as_ref(), line.trim()).await {
            Reply::Text(reply) => println!("{reply}"),
            Reply::Silent => {}
            Reply::Quit => break,
        }
    }
}

enum Reply {
    Text(String),
    Silent,
    Quit,
}

async fn dispatch(store: &SqliteStore, blizzard: Option<&BlizzardClient>, input: &str) -> Reply {
    let mut tokens = input.split_whitespace();
    let Some(command) = tokens.next() else {
        return Reply::Silent;
    };
    let args: Vec<&str> = tokens.collect();

    let reply = match command.trim_start_matches('!') {
        "add" => commands::handle_add(store, LOCAL_USER_ID, "add", &args).await,
        "keys" => {
            let mentioned: Vec<UserId> = if args.is_empty() {
                vec![LOCAL_USER_ID]
            } else {
                args.iter().filter_map(|t| commands::parse_mention(t)).collect()
            };
            commands::handle_keys(store, &mentioned).await
        }
        "affixes" => match blizzard {
            Some(client) => match client.current_affixes().await {
                Ok((period, affix_ids)) => messages::format_affixes(period, &affix_ids),
                Err(e) => {
                    tracing::error!("Affix lookup failed: {e}");
                    "Sorry, I couldn't reach the Blizzard API right now.".to_string()
                }
            },
            None => "Blizzard API credentials are not configured.".to_string(),
        },
        "quit" | "exit" => return Reply::Quit,
        other => format!("Unknown command `{other}`. Commands: add, keys, affixes, quit."),
    };
    Reply::Text(reply)
}
