//! Common types used across CLI modules

use std::fmt;
use std::str::FromStr;

/// A `key=value` job option given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl FromStr for KeyValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("option key is empty in '{}'", s));
        }

        Ok(KeyValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        let kv: KeyValue = "language=English".parse().unwrap();
        assert_eq!(kv.key, "language");
        assert_eq!(kv.value, "English");

        let kv: KeyValue = "note=a=b".parse().unwrap();
        assert_eq!(kv.value, "a=b");
    }

    #[test]
    fn test_parse_rejects_missing_separator_and_key() {
        assert!("language".parse::<KeyValue>().is_err());
        assert!("=English".parse::<KeyValue>().is_err());
    }
}
