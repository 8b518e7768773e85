use log::warn;
use std::io;
use std::io::BufRead;

/// Blocking key source. `read_key` parks the caller until a key code is
/// available; only the engine's own thread ever calls it, so the timer
/// driver keeps ticking while a program waits for input.
pub trait Input {
    fn read_key(&mut self) -> Result<u8, io::Error>;
}

/// interpret one line of text as a key code, where "1" => 0x01 and
/// "a" => 0x0a
fn parse_key(line: &str) -> Option<u8> {
    u8::from_str_radix(line.trim(), 16).ok()
}

/// simple implementation of Input: one key per line of STDIN
pub struct StdinInput;

impl StdinInput {
    pub fn new() -> Self {
        StdinInput
    }
}

impl Input for StdinInput {
    fn read_key(&mut self) -> Result<u8, io::Error> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        match parse_key(&line) {
            Some(key) => Ok(key),
            None => {
                // a bad line still counts as a keypress, of key 0
                warn!("not a hex key code: {:?}", line.trim());
                Ok(0)
            }
        }
    }
}

/// scripted Input implementation for testing
pub struct DummyInput {
    keys: Vec<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            keys: Vec::from(keys),
        }
    }
}

impl Input for DummyInput {
    fn read_key(&mut self) -> Result<u8, io::Error> {
        Ok(if self.keys.is_empty() {
            0
        } else {
            self.keys.remove(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_digits() {
        assert_eq!(parse_key("a"), Some(0x0a));
        assert_eq!(parse_key("F"), Some(0x0f));
        assert_eq!(parse_key("1f\n"), Some(0x1f));
        assert_eq!(parse_key(" 7 "), Some(0x07));
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert_eq!(parse_key("zz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("0x100"), None);
    }

    #[test]
    fn test_dummy_serves_keys_in_order() {
        let mut input = DummyInput::new(&[3, 9]);
        assert_eq!(input.read_key().unwrap(), 3);
        assert_eq!(input.read_key().unwrap(), 9);
        assert_eq!(input.read_key().unwrap(), 0); // exhausted
    }
}
