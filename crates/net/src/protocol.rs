//! IRC message types
//!
//! `[:prefix] COMMAND param... [:trailing]`, one message per CRLF line.

use std::fmt;

/// Numeric sent once registration completes
pub const RPL_WELCOME: &str = "001";
/// Nickname already taken
pub const ERR_NICKNAMEINUSE: &str = "433";

/// A parsed IRC line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn new(command: &str, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_string(),
            params,
        }
    }

    pub fn pass(password: &str) -> Self {
        Self::new("PASS", vec![sanitize(password)])
    }

    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", vec![middle(nick)])
    }

    pub fn user(user: &str, realname: &str) -> Self {
        Self::new(
            "USER",
            vec![middle(user), "0".to_string(), "*".to_string(), sanitize(realname)],
        )
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![middle(channel)])
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![middle(target), sanitize(text)])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![sanitize(token)])
    }

    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", vec![sanitize(reason)])
    }

    /// Parse one line without its CRLF. IRCv3 tags are skipped.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest.split_once(' ')?.1.trim_start();
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail.trim_start();
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut words = head.split(' ').filter(|w| !w.is_empty());
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nick part of a `nick!user@host` prefix
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split(['!', '@']).next().unwrap_or(prefix))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;

        let count = self.params.len();
        for (i, param) in self.params.iter().enumerate() {
            let last = i + 1 == count;
            if last && (param.is_empty() || param.contains(' ') || param.starts_with(':')) {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        Ok(())
    }
}

/// Line breaks would end the message early and inject a new command
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\r' || c == '\n' || c == '\0' { ' ' } else { c })
        .collect()
}

/// Single-word parameter (nick, channel, target): the first word of `text`,
/// without a leading ':'
fn middle(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\0')
        .find(|w| !w.is_empty())
        .unwrap_or("")
        .trim_start_matches(':')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_prefix_and_trailing() {
        let msg = Message::parse(":wikibot!bot@host PRIVMSG #wiki :hello there\r\n").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("wikibot!bot@host"));
        assert_eq!(msg.source_nick(), Some("wikibot"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#wiki", "hello there"]);
    }

    #[test]
    fn test_parse_numeric_and_ping() {
        let welcome = Message::parse(":irc.example.org 001 wikibot :Welcome").unwrap();
        assert_eq!(welcome.command, RPL_WELCOME);
        assert_eq!(welcome.param(0), Some("wikibot"));

        let ping = Message::parse("PING :irc.example.org").unwrap();
        assert_eq!(ping.prefix, None);
        assert_eq!(ping.param(0), Some("irc.example.org"));

        let tagged = Message::parse("@time=2024-01-01T00:00:00Z :n!u@h JOIN #wiki").unwrap();
        assert_eq!(tagged.command, "JOIN");
        assert_eq!(tagged.param(0), Some("#wiki"));

        assert!(Message::parse("").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Message::privmsg("#wiki", "Main.WebHome was modified by alice  - http://x").to_string(),
            "PRIVMSG #wiki :Main.WebHome was modified by alice  - http://x"
        );
        assert_eq!(Message::nick("wikibot").to_string(), "NICK wikibot");
        assert_eq!(Message::user("wikibot", "wikirc").to_string(), "USER wikibot 0 * wikirc");
        assert_eq!(Message::quit("").to_string(), "QUIT :");
    }

    #[test]
    fn test_line_breaks_cannot_inject_commands() {
        let msg = Message::privmsg("#wiki", "first\r\nQUIT :bye");
        let line = msg.to_string();
        assert!(!line.contains('\r') && !line.contains('\n'));
        assert_eq!(line, "PRIVMSG #wiki :first  QUIT :bye");
    }

    #[test]
    fn test_spaces_cannot_split_single_word_params() {
        assert_eq!(Message::join("#wiki ops").to_string(), "JOIN #wiki");
        assert_eq!(Message::join(" #wiki\r\n").params, vec!["#wiki"]);
        assert_eq!(Message::nick("wiki bot").to_string(), "NICK wiki");
        assert_eq!(
            Message::privmsg("#wiki 0 :x", "hi there").to_string(),
            "PRIVMSG #wiki :hi there"
        );
        assert_eq!(
            Message::user("wiki bot", "wikirc").to_string(),
            "USER wiki 0 * wikirc"
        );
        assert_eq!(Message::nick(":evil").to_string(), "NICK evil");
    }
}
