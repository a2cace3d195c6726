// User-facing response formatting. Everything here is pure string
// building; handlers decide what to format.

use std::collections::HashMap;

use crate::affixes;
use crate::db::{KeystoneRecord, UserId};
use crate::dungeons;

pub fn format_added(dungeon_name: &str, level: u32, character: &str) -> String {
    format!("Added {dungeon_name} +{level} for {character}")
}

pub fn format_add_failed(dungeon_name: &str, level: u32, character: &str) -> String {
    format!("There was a problem adding {dungeon_name} +{level} for {character}.")
}

/// Group known keystones by user mention, one character per line.
/// Users with no records are omitted entirely.
pub fn format_user_keys(keys: &HashMap<UserId, Vec<KeystoneRecord>>) -> String {
    if keys.is_empty() {
        return "I don't have any keys saved for those users.".to_string();
    }

    // Deterministic output regardless of map iteration order.
    let mut user_ids: Vec<UserId> = keys.keys().copied().collect();
    user_ids.sort_unstable();

    let mut lines = Vec::new();
    for user_id in user_ids {
        lines.push(format!("<@{user_id}>"));
        for record in &keys[&user_id] {
            let dungeon = dungeons::dungeon_name(record.dungeon_id).unwrap_or("Unknown dungeon");
            lines.push(format!("  {}: {} +{}", record.character, dungeon, record.level));
        }
    }
    lines.join("\n")
}

/// Local display of the week's affixes, lowest-level first.
pub fn format_affixes(period: u32, affix_ids: &[u32]) -> String {
    let names: Vec<String> = affix_ids
        .iter()
        .map(|&id| match affixes::affix_name(id) {
            Some(name) => name.to_string(),
            None => format!("Affix {id}"),
        })
        .collect();
    format!("Affixes for period {period}: {}", names.join(", "))
}
