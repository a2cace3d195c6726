// Chat command handling: argument validation/normalization for `add`
// and the keystone query command. Validation is pure and synchronous;
// only the handlers touch the store.

use thiserror::Error;

use crate::db::{KeystoneRecord, KeystoneStore, UserId};
use crate::dungeons;
use crate::messages;

/// User-input errors. These are always surfaced as plain chat text,
/// never propagated as failures; `Display` is the exact reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("I'm sorry, I didn't understand that. Try `!help {invoked_with}` for help with formatting.")]
    Format { invoked_with: String },

    #[error("@ and ` characters are not allowed for character names")]
    InvalidCharacterName,

    #[error("I'm sorry, I didn't understand the dungeon `{input}`. Try `!dungeons` to see dungeon names.")]
    UnknownDungeon { input: String },

    #[error("`{input}` isn't a valid dungeon level.")]
    InvalidLevel { input: String },
}

/// A validated insertion, not yet tied to an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingKeystone {
    pub character: String,
    pub dungeon_id: u32,
    pub level: u32,
}

/// Strip backticks (chat code markup) and line breaks. Idempotent.
pub fn sanitize(input: &str) -> String {
    input.replace(['`', '\n', '\r'], "")
}

/// Validate the arguments of an `add` command: character name, one or
/// more dungeon-name tokens, and a key level, in that order. Errors are
/// reported for the earliest invalid argument.
pub fn validate_insertion(invoked_with: &str, args: &[&str]) -> Result<PendingKeystone, CommandError> {
    if args.len() < 3 {
        return Err(CommandError::Format {
            invoked_with: invoked_with.to_string(),
        });
    }

    let character = sanitize(args[0].trim());
    let dungeon = sanitize(&args[1..args.len() - 1].join(" "));
    let level = sanitize(args[args.len() - 1]);

    // Backticks were already stripped above, so in practice this only
    // catches `@`; the contract still names both characters.
    if character.contains(['@', '`']) {
        return Err(CommandError::InvalidCharacterName);
    }

    let dungeon_id = dungeons::dungeon_id(&dungeon)
        .ok_or(CommandError::UnknownDungeon { input: dungeon })?;

    let digits = level.strip_prefix('+').unwrap_or(&level);
    let parsed = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse::<u32>().ok()
    } else {
        None
    };
    let level = parsed.ok_or(CommandError::InvalidLevel { input: level })?;

    Ok(PendingKeystone {
        character,
        dungeon_id,
        level,
    })
}

/// Handle `add <character> <dungeon...> <level>` for `owner`, returning
/// the reply to send back to chat.
pub async fn handle_add<S: KeystoneStore>(
    store: &S,
    owner: UserId,
    invoked_with: &str,
    args: &[&str],
) -> String {
    let pending = match validate_insertion(invoked_with, args) {
        Ok(pending) => pending,
        Err(e) => return e.to_string(),
    };

    // The user likely typed an alias; replies always use the canonical
    // dungeon name.
    let dungeon_name = dungeons::dungeon_name(pending.dungeon_id).unwrap_or("Unknown dungeon");

    let record = KeystoneRecord {
        owner_id: owner,
        character: pending.character,
        dungeon_id: pending.dungeon_id,
        level: pending.level,
    };

    if store.add_keystone(&record).await {
        messages::format_added(dungeon_name, record.level, &record.character)
    } else {
        messages::format_add_failed(dungeon_name, record.level, &record.character)
    }
}

/// Handle the query command: fetch every known keystone for the
/// mentioned users and format the grouped reply.
pub async fn handle_keys<S: KeystoneStore>(store: &S, mentioned: &[UserId]) -> String {
    let keys = store.keystones_for_users(mentioned).await;
    messages::format_user_keys(&keys)
}

/// Parse a user mention token: `<@123>`, the nickname form `<@!123>`,
/// or a bare id.
pub fn parse_mention(token: &str) -> Option<UserId> {
    let inner = token
        .strip_prefix("<@")
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| t.trim_start_matches('!'))
        .unwrap_or(token);
    inner.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_backticks_and_linebreaks() {
        assert_eq!(sanitize("`Fake Dungeon``"), "Fake Dungeon");
        assert_eq!(sanitize("line\nbreak\r"), "linebreak");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in ["`a`b\nc", "already clean", "``\n\n``", ""] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_too_few_args() {
        let err = validate_insertion("add", &["Moo", "Too"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "I'm sorry, I didn't understand that. Try `!help add` for help with formatting."
        );
    }

    #[test]
    fn test_character_name_with_at_sign() {
        let err = validate_insertion("add", &["@everyone", "Waycrest", "10"]).unwrap_err();
        assert_eq!(err, CommandError::InvalidCharacterName);
    }

    #[test]
    fn test_character_name_checked_before_dungeon() {
        // Both the name and the dungeon are invalid; the name error wins.
        let err = validate_insertion("add", &["@Moo", "dsjdaijdsa", "NaN"]).unwrap_err();
        assert_eq!(err, CommandError::InvalidCharacterName);
    }

    #[test]
    fn test_unknown_dungeon_echoes_sanitized_input() {
        let err = validate_insertion("add", &["Moo", "`Fake", "Dungeon``", "10"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "I'm sorry, I didn't understand the dungeon `Fake Dungeon`. \
             Try `!dungeons` to see dungeon names."
        );
    }

    #[test]
    fn test_dungeon_checked_before_level() {
        let err = validate_insertion("add", &["Moo", "dsjdaijdsa", "NaN"]).unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownDungeon {
                input: "dsjdaijdsa".to_string()
            }
        );
    }

    #[test]
    fn test_nonnumeric_level() {
        let err = validate_insertion("add", &["Moo", "Waycrest", "NaN"]).unwrap_err();
        assert_eq!(err.to_string(), "`NaN` isn't a valid dungeon level.");
    }

    #[test]
    fn test_level_with_backticks_is_echoed_sanitized() {
        let err =
            validate_insertion("add", &["Moo", "Waycrest", "`Bad`Level`"]).unwrap_err();
        assert_eq!(err.to_string(), "`BadLevel` isn't a valid dungeon level.");
    }

    #[test]
    fn test_negative_level_rejected() {
        let err = validate_insertion("add", &["Moo", "Waycrest", "-5"]).unwrap_err();
        assert_eq!(err.to_string(), "`-5` isn't a valid dungeon level.");
    }

    #[test]
    fn test_plus_only_rejected() {
        let err = validate_insertion("add", &["Moo", "Waycrest", "+"]).unwrap_err();
        assert_eq!(err.to_string(), "`+` isn't a valid dungeon level.");
    }

    #[test]
    fn test_valid_insertion() {
        let pending = validate_insertion("add", &["Moo", "Waycrest", "10"]).unwrap();
        assert_eq!(
            pending,
            PendingKeystone {
                character: "Moo".to_string(),
                dungeon_id: 248,
                level: 10,
            }
        );
    }

    #[test]
    fn test_multi_token_dungeon_and_leading_plus() {
        let pending = validate_insertion("add", &["Moo", "Waycrest", "Manor", "+10"]).unwrap();
        assert_eq!(pending.dungeon_id, 248);
        assert_eq!(pending.level, 10);
    }

    #[test]
    fn test_alias_resolves_to_canonical_id() {
        let pending = validate_insertion("add", &["Moo", "tos", "5"]).unwrap();
        assert_eq!(pending.dungeon_id, 250);
    }

    #[test]
    fn test_parse_mention_forms() {
        assert_eq!(parse_mention("<@123>"), Some(123));
        assert_eq!(parse_mention("<@!123>"), Some(123));
        assert_eq!(parse_mention("123"), Some(123));
        assert_eq!(parse_mention("<@abc>"), None);
        assert_eq!(parse_mention("Moo"), None);
    }

    #[test]
    fn test_error_messages_contain_no_markup() {
        let errors = [
            validate_insertion("add", &["Moo", "`dsj`\ndaijdsa", "10"]).unwrap_err(),
            validate_insertion("add", &["Moo", "Waycrest", "`Na`N\n"]).unwrap_err(),
        ];
        for err in errors {
            let message = err.to_string();
            // Backticks in the template quote user input; the input
            // itself must not contribute any.
            assert!(!message.contains('\n'));
            assert!(message.contains("dsjdaijdsa") || message.contains("NaN"));
        }
    }
}
