//! Wire framing and the text clean-up shared by every response parser.

/// Out-of-band marker that prefixes every connectionless datagram.
pub const OOB_SENTINEL: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Banner some servers put in front of console output.
const PRINT_BANNER: &[u8] = b"print\n";

/// A single request datagram.
pub struct Packet {
    body: String,
}

impl Packet {
    /// Authenticated console command: `rcon <password> <command> [args]`.
    /// Arguments that are blank after trimming are left out.
    pub fn rcon(password: &str, command: &str, args: Option<&str>) -> Self {
        let body = match args.map(str::trim).filter(|a| !a.is_empty()) {
            Some(args) => format!("rcon {} {} {}", password, command.trim(), args),
            None => format!("rcon {} {}", password, command.trim()),
        };
        Packet { body }
    }

    /// Unauthenticated query such as `getinfo` or `getstatus`.
    pub fn query(query: &str) -> Self {
        Packet {
            body: query.to_string(),
        }
    }

    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    pub fn pack(&self) -> Vec<u8> {
        // Sentinel, Body, Terminator
        let mut payload = Vec::<u8>::with_capacity(self.body.len() + 5);
        payload.extend_from_slice(&OOB_SENTINEL);
        payload.extend_from_slice(self.body.as_bytes());
        payload.push(b'\n');
        payload
    }
}

/// Cleans up a reassembled response. Works on bytes because the sentinel is
/// not valid UTF-8.
///
/// Leading sentinels and `print` banners are stripped for as long as they
/// keep appearing (fragments may each carry one), and the copies servers
/// leave between lines are collapsed to a plain newline.
pub fn normalize(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let buf = replace_all(raw, b"\r\n", b"\n");
    let mut rest: &[u8] = &buf;
    loop {
        let mut changed = false;
        if let Some(stripped) = rest.strip_prefix(&OOB_SENTINEL[..]) {
            rest = stripped;
            changed = true;
        }
        if let Some(stripped) = rest.strip_prefix(PRINT_BANNER) {
            rest = stripped;
            changed = true;
        }
        if !changed {
            break;
        }
    }

    let buf = replace_all(rest, b"\n\xFF\xFF\xFF\xFF", b"\n");
    let buf = replace_all(&buf, b"\nprint\n", b"\n");
    String::from_utf8_lossy(&buf).trim().to_string()
}

/// Splits on newlines, trims every line and drops the empty ones.
pub fn split_lines(s: &str) -> Vec<String> {
    s.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Removes `^<alphanumeric>` color codes.
pub fn strip_color_codes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' {
            if let Some(next) = chars.peek() {
                if next.is_ascii_alphanumeric() {
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Non-overlapping, left to right.
fn replace_all(haystack: &[u8], needle: &[u8], with: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(with);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rcon_packet_layout() {
        let packet = Packet::rcon("hunter2", " status ", None);
        let expected = b"\xFF\xFF\xFF\xFFrcon hunter2 status\n";
        assert_eq!(packet.pack(), expected.to_vec());

        let packet = Packet::rcon("hunter2", "say", Some("  hello there "));
        assert_eq!(packet.body(), "rcon hunter2 say hello there");

        let packet = Packet::rcon("hunter2", "map_restart", Some("   "));
        assert_eq!(packet.body(), "rcon hunter2 map_restart");
    }

    #[test]
    fn query_packet_has_no_password() {
        assert_eq!(
            Packet::query("getinfo").pack(),
            b"\xFF\xFF\xFF\xFFgetinfo\n".to_vec()
        );
    }

    #[test]
    fn normalize_strips_leading_and_embedded_markers() {
        let raw = b"\xFF\xFF\xFF\xFFprint\nmap: mp_nuketown\n\xFF\xFF\xFF\xFFprint\nnum score ping";
        assert_eq!(normalize(raw), "map: mp_nuketown\nnum score ping");
    }

    #[test]
    fn normalize_repeats_prefix_stripping() {
        let raw = b"\xFF\xFF\xFF\xFFprint\n\xFF\xFF\xFF\xFFprint\nhello\r\nworld\r\n";
        assert_eq!(normalize(raw), "hello\nworld");
    }

    #[test]
    fn normalize_of_bare_marker_is_empty() {
        assert_eq!(normalize(b"\xFF\xFF\xFF\xFFprint\n"), "");
        assert_eq!(normalize(b""), "");
    }

    #[test]
    fn split_drops_blank_lines() {
        assert_eq!(
            split_lines("  a \n\n   \n b\n"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn color_codes() {
        assert_eq!(strip_color_codes("^1Red^7 Server"), "Red Server");
        assert_eq!(strip_color_codes("^^1x"), "^x");
        assert_eq!(strip_color_codes("100%^"), "100%^");
        assert_eq!(strip_color_codes("a^ b"), "a^ b");
    }
}
