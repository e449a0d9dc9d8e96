//! Backslash-delimited `\key\value` blocks, as returned by the
//! connectionless `getinfo` and `getstatus` queries.
//!
//! Decoding is best-effort: unknown keys are ignored and missing or
//! unparsable values come back as zero, `false` or an empty string.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::packet::strip_color_codes;

pub const INFO_BANNER: &str = "inforesponse";
pub const STATUS_BANNER: &str = "statusresponse";

/// Joins the lines that carry key/value data into one block. Falls back to
/// the last line when none of them contains a backslash.
pub fn reassemble(lines: &[String], banner: &str) -> String {
    let block: String = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.eq_ignore_ascii_case(banner))
        .filter(|line| line.contains('\\'))
        .collect();

    if block.is_empty() {
        lines
            .last()
            .map(|line| line.trim().to_string())
            .unwrap_or_default()
    } else {
        block
    }
}

/// Decoded key/value pairs, values already stripped of color codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues {
    pairs: HashMap<String, String>,
}

impl KeyValues {
    pub fn parse(block: &str) -> Self {
        let mut parts: Vec<&str> = block.split('\\').collect();
        if parts.first() == Some(&"") {
            parts.remove(0);
        }

        let pairs = parts
            .chunks_exact(2)
            .filter_map(|pair| {
                let key = pair[0].trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), strip_color_codes(pair[1].trim())))
            })
            .collect();

        KeyValues { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn str(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn int(&self, key: &str) -> i32 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    pub fn int64(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// `1` or `true` in any case; anything else, absence included, is false.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Reply to `getinfo`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub net_field_chk: i64,
    pub protocol: i32,
    pub session_mode: i32,
    pub hostname: String,
    pub map_name: String,
    pub is_in_game: bool,
    pub max_clients: i32,
    pub game_type: String,
    pub hw: i32,
    pub mod_enabled: bool,
    pub voice: bool,
    pub sec_key: String,
    pub sec_id: String,
    pub host_addr: String,
    pub retrieved_at: SystemTime,
}

impl ServerInfo {
    pub fn from_lines(lines: &[String]) -> Self {
        Self::from_key_values(&KeyValues::parse(&reassemble(lines, INFO_BANNER)))
    }

    pub fn from_key_values(kv: &KeyValues) -> Self {
        ServerInfo {
            net_field_chk: kv.int64("netfieldchk"),
            protocol: kv.int("protocol"),
            session_mode: kv.int("sessionmode"),
            hostname: kv.str("hostname"),
            map_name: kv.str("mapname"),
            is_in_game: kv.flag("isInGame"),
            max_clients: kv.int("com_maxclients"),
            game_type: kv.str("gametype"),
            hw: kv.int("hw"),
            mod_enabled: kv.flag("mod"),
            voice: kv.flag("voice"),
            sec_key: kv.str("seckey"),
            sec_id: kv.str("secid"),
            host_addr: kv.str("hostaddr"),
            retrieved_at: SystemTime::now(),
        }
    }
}

/// Reply to `getstatus`.
#[derive(Debug, Clone)]
pub struct ServerStatusInfo {
    pub com_max_clients: i32,
    pub game_type: String,
    pub random_seed: i32,
    pub game_name: String,
    pub map_name: String,
    pub playlist_enabled: bool,
    pub playlist_entry: i32,
    pub protocol: i32,
    pub scr_team_ff_type: i32,
    pub short_version: bool,
    pub sv_allow_aim_assist: bool,
    pub sv_allow_anonymous: bool,
    pub sv_client_fps_limit: i32,
    pub sv_disable_client_console: bool,
    pub sv_hostname: String,
    pub sv_max_clients: i32,
    pub sv_max_ping: i32,
    pub sv_min_ping: i32,
    pub sv_patch_dsr50: bool,
    pub sv_private_clients: i32,
    pub sv_private_clients_for_users: i32,
    pub sv_pure: bool,
    pub sv_voice: bool,
    pub password_enabled: bool,
    pub mod_enabled: bool,
    pub retrieved_at: SystemTime,
}

impl ServerStatusInfo {
    pub fn from_lines(lines: &[String]) -> Self {
        Self::from_key_values(&KeyValues::parse(&reassemble(lines, STATUS_BANNER)))
    }

    pub fn from_key_values(kv: &KeyValues) -> Self {
        // Some builds report this under the older name.
        let sv_private_clients_for_users = if kv.get("sv_privateClientsForClients").is_some() {
            kv.int("sv_privateClientsForClients")
        } else {
            kv.int("sv_privateClientsForUsers")
        };

        ServerStatusInfo {
            com_max_clients: kv.int("com_maxclients"),
            game_type: kv.str("g_gametype"),
            random_seed: kv.int("g_randomSeed"),
            game_name: kv.str("gamename"),
            map_name: kv.str("mapname"),
            playlist_enabled: kv.flag("playlist_enabled"),
            playlist_entry: kv.int("playlist_entry"),
            protocol: kv.int("protocol"),
            scr_team_ff_type: kv.int("scr_team_fftype"),
            short_version: kv.flag("shortversion"),
            sv_allow_aim_assist: kv.flag("sv_allowAimAssist"),
            sv_allow_anonymous: kv.flag("sv_allowAnonymous"),
            sv_client_fps_limit: kv.int("sv_clientFpsLimit"),
            sv_disable_client_console: kv.flag("sv_disableClientConsole"),
            sv_hostname: kv.str("sv_hostname"),
            sv_max_clients: kv.int("sv_maxclients"),
            sv_max_ping: kv.int("sv_maxPing"),
            sv_min_ping: kv.int("sv_minPing"),
            sv_patch_dsr50: kv.flag("sv_patch_dsr50"),
            sv_private_clients: kv.int("sv_privateClients"),
            sv_private_clients_for_users,
            sv_pure: kv.flag("sv_pure"),
            sv_voice: kv.flag("sv_voice"),
            password_enabled: kv.flag("pswrd"),
            mod_enabled: kv.flag("mod"),
            retrieved_at: SystemTime::now(),
        }
    }
}
