//! Decoder for the `status` console command.
//!
//! ```text
//! map: mp_nuketown
//! num score bot ping guid             name            lastmsg address               qport rate
//! --- ----- --- ---- ---------------- --------------- ------- --------------------- ----- -----
//!   0    10   0   48 0100000000012345 Player One            0 203.0.113.7:28960     1234  25000
//!   1     0 bot LOAD 0000000000000000 bot0                  0 loopback              5678  5000
//! ```
//!
//! Rows that do not fit the layout are skipped, never reported as errors.

use std::fmt;
use std::time::SystemTime;

use log::debug;

/// Round trip time of a player, or `LOAD` while they are still connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ping {
    Numeric(u32),
    Load,
}

impl Ping {
    fn parse(token: &str) -> Option<Ping> {
        if token == "LOAD" {
            return Some(Ping::Load);
        }
        parse_unsigned(token).map(Ping::Numeric)
    }
}

impl fmt::Display for Ping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ping::Numeric(ms) => write!(f, "{}", ms),
            Ping::Load => f.write_str("LOAD"),
        }
    }
}

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub client_num: u32,
    /// As reported, color codes included.
    pub name: String,
    pub ping: Ping,
    pub score: i32,
    pub ip: String,
    pub port: u16,
    pub qport: u32,
    pub guid: String,
    pub last_msg: u32,
    pub rate: u32,
}

/// Snapshot produced by one `status` call.
#[derive(Debug, Clone)]
pub struct ServerStatus {
    pub map: String,
    pub players: Vec<Player>,
    pub raw: Vec<String>,
    pub retrieved_at: SystemTime,
}

/// Decodes the lines of a `status` reply.
pub fn parse_status(lines: Vec<String>) -> ServerStatus {
    let map = lines
        .iter()
        .map(|line| line.trim())
        .find(|line| line.to_lowercase().starts_with("map:"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, map)| map.trim().to_string())
        .unwrap_or_default();

    let start = lines
        .iter()
        .position(|line| is_table_header(line))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut skipped = 0usize;
    let players: Vec<Player> = lines[start..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .filter_map(|line| {
            let player = parse_player_row(line);
            if player.is_none() {
                skipped += 1;
            }
            player
        })
        .collect();

    debug!(
        "status: map {:?}, {} players, {} rows skipped",
        map,
        players.len(),
        skipped
    );

    ServerStatus {
        map,
        players,
        raw: lines,
        retrieved_at: SystemTime::now(),
    }
}

/// `num score ping ...`, case-insensitive.
fn is_table_header(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    matches!(
        (tokens.next(), tokens.next(), tokens.next()),
        (Some(num), Some(score), Some(ping))
            if num.eq_ignore_ascii_case("num")
                && score.eq_ignore_ascii_case("score")
                && ping.to_ascii_lowercase().starts_with("ping")
    )
}

/// Decodes `num score [bot] ping guid name... lastmsg ip:port qport rate`.
pub fn parse_player_row(line: &str) -> Option<Player> {
    let tokens = tokenize(line);
    // The bot column is optional; try the wider layout first.
    parse_row_layout(line, &tokens, true)
        .or_else(|| parse_row_layout(line, &tokens, false))
}

fn parse_row_layout(line: &str, tokens: &[(usize, &str)], with_bot: bool) -> Option<Player> {
    let head = if with_bot { 5 } else { 4 };
    // head + at least one name token + four trailing fields
    if tokens.len() < head + 5 {
        return None;
    }

    let client_num = parse_unsigned(tokens[0].1)?;
    let score = parse_signed(tokens[1].1)?;
    if with_bot && !tokens[2].1.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let ping = Ping::parse(tokens[head - 2].1)?;
    let guid = tokens[head - 1].1;
    if !guid.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let tail = &tokens[tokens.len() - 4..];
    let last_msg = parse_unsigned(tail[0].1)?;
    let address = tail[1].1;
    let qport = parse_unsigned(tail[2].1)?;
    let rate = parse_unsigned(tail[3].1)?;

    let first_name = tokens[head];
    let last_name = tokens[tokens.len() - 5];
    let name = &line[first_name.0..last_name.0 + last_name.1.len()];

    let (ip, port) = match address.split_once(':') {
        Some((ip, port)) => (ip, port.parse().unwrap_or(0)),
        None => (address, 0),
    };

    Some(Player {
        client_num,
        name: name.to_string(),
        ping,
        score,
        ip: ip.to_string(),
        port,
        qport,
        guid: guid.to_string(),
        last_msg,
        rate,
    })
}

/// Whitespace separated tokens with their byte offsets.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

fn parse_unsigned(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_signed(token: &str) -> Option<i32> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    parse_unsigned(digits)?;
    token.parse().ok()
}
