//! Recognising the value in a dvar echo.
//!
//! Asking the console for a dvar by name makes the server print it back in
//! one of two shapes:
//!
//! ```text
//! sv_maxclients is: "18"
//! sv_maxclients: 18
//! ```
//!
//! Admin plugins on some servers also echo their own bookkeeping dvar into
//! unrelated replies; such lines are treated as pollution.

use crate::packet::strip_color_codes;

/// Dvar that admin tooling keeps echoing into other replies.
pub const POLLUTION_TOKEN: &str = "sv_iw4madmin_in";

/// Attempts for a single dvar read while replies keep being polluted.
pub const MAX_ATTEMPTS: u32 = 3;

pub fn is_polluted(line: &str) -> bool {
    line.to_lowercase().contains(POLLUTION_TOKEN)
}

/// Quotes a value for `set` if it contains whitespace or quotes, escaping
/// inner quotes.
pub fn quote_value(value: &str) -> String {
    if value.contains([' ', '\t', '"']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Returns the value if `line` is an echo of `name`, color codes removed.
/// The name is compared case-insensitively and literally.
pub fn match_value(name: &str, line: &str) -> Option<String> {
    let name = name.trim();
    let rest = strip_prefix_ignore_case(line, name)?;
    match_is_form(rest)
        .or_else(|| match_assign_form(rest))
        .map(|value| strip_color_codes(&value))
}

/// `<name> is: "<value>"`. Unquoted values end at the first whitespace.
fn match_is_form(rest: &str) -> Option<String> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = strip_prefix_ignore_case(rest.trim_start(), "is:")?;
    let rest = rest.trim_start();
    let value = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default(),
        None => rest.split_whitespace().next().unwrap_or_default(),
    };
    Some(value.to_string())
}

/// `<name>: <value>` or `<name>=<value>`, one optional surrounding quote pair.
fn match_assign_form(rest: &str) -> Option<String> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix([':', '='])?.trim_start();
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    let rest = rest.strip_suffix('"').unwrap_or(rest);
    Some(rest.to_string())
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Scans successive replies for a dvar value. The first non-matching,
/// non-polluted line across all replies is kept as the fallback answer;
/// later replies never replace it.
#[derive(Debug)]
pub struct DvarScan<'a> {
    name: &'a str,
    fallback: Option<String>,
}

/// Result of feeding one reply into a [`DvarScan`].
#[derive(Debug, PartialEq, Eq)]
pub enum ScanStep {
    Found(String),
    /// The reply contained pollution; asking again may help.
    Retry,
    /// Clean reply without a match; asking again will not help.
    Exhausted,
}

impl<'a> DvarScan<'a> {
    pub fn new(name: &'a str) -> Self {
        DvarScan {
            name,
            fallback: None,
        }
    }

    pub fn feed(&mut self, lines: &[String]) -> ScanStep {
        for line in lines {
            let clean = strip_color_codes(line);
            let clean = clean.trim();
            if clean.is_empty() {
                continue;
            }
            if let Some(value) = match_value(self.name, clean) {
                return ScanStep::Found(value);
            }
            if self.fallback.is_none() && !is_polluted(clean) {
                self.fallback = Some(clean.to_string());
            }
        }

        if lines.iter().any(|line| is_polluted(line)) {
            ScanStep::Retry
        } else {
            ScanStep::Exhausted
        }
    }

    pub fn into_fallback(self) -> Option<String> {
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn is_form() {
        assert_eq!(
            match_value("sv_maxclients", "sv_maxclients is: \"18\""),
            Some("18".to_string())
        );
        assert_eq!(
            match_value("sv_maxclients", "SV_MaxClients is: 18 default: 24"),
            Some("18".to_string())
        );
        let line = "sv_hostname is: \"^1My ^7Server\" default: \"x\"";
        assert_eq!(
            match_value("sv_hostname", line),
            Some("My Server".to_string())
        );
    }

    #[test]
    fn assign_form() {
        let value = |line| match_value("g_gametype", line);
        assert_eq!(value("g_gametype: dm"), Some("dm".to_string()));
        assert_eq!(value("g_gametype = \"war\""), Some("war".to_string()));
        assert_eq!(value("g_gametype:"), Some(String::new()));
    }

    #[test]
    fn other_names_do_not_match() {
        let value = |line| match_value("sv_maxclients", line);
        assert_eq!(value("sv_maxclientsx is: 3"), None);
        assert_eq!(value("sv_iw4madmin_in something"), None);
        assert_eq!(match_value("sv_maxclients", "sv"), None);
        assert_eq!(match_value("sv.max", "svXmax: 1"), None);
    }

    #[test]
    fn quoting_for_set() {
        assert_eq!(quote_value("mp_raid"), "mp_raid");
        assert_eq!(quote_value("My Server"), "\"My Server\"");
        assert_eq!(quote_value("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_value("a\tb"), "\"a\tb\"");
    }

    #[test]
    fn pollution_keeps_first_clean_fallback() {
        let mut scan = DvarScan::new("sv_maxclients");
        let first = lines(&["sv_iw4madmin_in something", "first unrelated"]);
        assert_eq!(scan.feed(&first), ScanStep::Retry);
        let second = lines(&["^3SV_IW4MADMIN_IN x", "second unrelated"]);
        assert_eq!(scan.feed(&second), ScanStep::Retry);
        assert_eq!(scan.into_fallback().as_deref(), Some("first unrelated"));
    }

    #[test]
    fn match_wins_over_fallback() {
        let mut scan = DvarScan::new("sv_maxclients");
        let step = scan.feed(&lines(&["noise", "sv_maxclients is: \"18\""]));
        assert_eq!(step, ScanStep::Found("18".to_string()));
    }

    #[test]
    fn clean_reply_without_match_stops() {
        let mut scan = DvarScan::new("sv_maxclients");
        let step = scan.feed(&lines(&["Unknown command"]));
        assert_eq!(step, ScanStep::Exhausted);
        assert_eq!(scan.into_fallback().as_deref(), Some("Unknown command"));
    }
}
