// Chat-bot command handlers for tracking Mythic Keystone dungeon keys,
// plus an authenticated Blizzard API client for affix/period lookups.

pub mod affixes;
pub mod blizzard;
pub mod commands;
pub mod config;
pub mod db;
pub mod dungeons;
pub mod messages;
