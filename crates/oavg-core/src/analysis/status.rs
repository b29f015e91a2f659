use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A response key from an operation's `responses` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// An exact status code such as `200`.
    Code(u16),
    /// A status class such as `2XX`; holds the leading digit.
    Range(u8),
    Default,
}

impl StatusKey {
    /// `(class, kind, code)`: exact codes first within a class, then the range,
    /// with `default` after everything.
    fn sort_key(&self) -> (u16, u8, u16) {
        match *self {
            StatusKey::Code(code) => (code / 100, 0, code),
            StatusKey::Range(class) => (u16::from(class), 1, 0),
            StatusKey::Default => (u16::MAX, 2, 0),
        }
    }

    /// Fragment used inside generated type names (`Response200`, `Response2XX`, `ResponseDefault`).
    pub fn label(&self) -> String {
        match self {
            StatusKey::Default => "Default".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether a concrete status received at runtime falls under this key.
    pub fn matches(&self, status: u16) -> bool {
        match *self {
            StatusKey::Code(code) => code == status,
            StatusKey::Range(class) => status / 100 == u16::from(class),
            StatusKey::Default => true,
        }
    }

    /// A status counts as success when it is 2xx; `default` never does.
    pub fn is_success(&self) -> bool {
        match *self {
            StatusKey::Code(code) => (200..300).contains(&code),
            StatusKey::Range(class) => class == 2,
            StatusKey::Default => false,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKey::Code(code) => write!(f, "{code}"),
            StatusKey::Range(class) => write!(f, "{class}XX"),
            StatusKey::Default => f.write_str("default"),
        }
    }
}

impl FromStr for StatusKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(StatusKey::Default);
        }
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(s.to_string());
        }
        if bytes[1..].eq_ignore_ascii_case(b"XX") {
            return match bytes[0] {
                b'1'..=b'5' => Ok(StatusKey::Range(bytes[0] - b'0')),
                _ => Err(s.to_string()),
            };
        }
        match s.parse::<u16>() {
            Ok(code) if (100..600).contains(&code) => Ok(StatusKey::Code(code)),
            _ => Err(s.to_string()),
        }
    }
}

impl Ord for StatusKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for StatusKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<StatusKey> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn sorts_ascending_with_default_last() {
        let mut statuses = keys(&["404", "default", "200", "500"]);
        statuses.sort();
        let rendered: Vec<String> = statuses.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["200", "404", "500", "default"]);
    }

    #[test]
    fn ranges_follow_their_exact_codes() {
        let mut statuses = keys(&["4XX", "2XX", "404", "201", "200"]);
        statuses.sort();
        let rendered: Vec<String> = statuses.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["200", "201", "2XX", "404", "4XX"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        for bad in ["20", "2000", "abc", "6XX", "099", "", "Default"] {
            assert!(bad.parse::<StatusKey>().is_err(), "{bad} should be rejected");
        }
        assert_eq!("5xx".parse::<StatusKey>(), Ok(StatusKey::Range(5)));
    }

    #[test]
    fn runtime_matching() {
        assert!(StatusKey::Range(2).matches(204));
        assert!(!StatusKey::Code(200).matches(201));
        assert!(StatusKey::Default.matches(418));
        assert_eq!(StatusKey::Default.label(), "Default");
    }
}
