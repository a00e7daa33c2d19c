//! The transform registry: a static name → [`Transform`] mapping.
//!
//! Plugin-style dynamic loading (`dlopen`-ing a shared object per stage) is
//! one way to resolve a transform by name, but nothing here needs runtime
//! extensibility, so the registry is explicit instead: each lookup constructs
//! a fresh, independent `Transform` value, and loading the same name twice
//! just produces two distinct stages sharing a pure function.

use std::io::Write;
use std::time::Duration;

/// A pure per-stage string transformation.
///
/// Returns `None` iff `input` is `None`. Must not block, except for
/// `typewriter`, whose per-byte delay is its entire documented purpose.
pub trait Transform {
    /// Applies the transform to `input`, consuming it.
    fn apply(&self, input: Option<String>) -> Option<String>;

    /// Whether this transform's terminal stage should suppress the default
    /// `[<stage-name>] ` sink prefix because the transform already wrote the
    /// output to stdout itself. Only `typewriter` overrides this.
    fn suppresses_sink_prefix(&self) -> bool {
        false
    }
}

/// Prints `input` unchanged to stdout before forwarding it unchanged.
pub struct IdentityLog;

impl Transform for IdentityLog {
    fn apply(&self, input: Option<String>) -> Option<String> {
        let input = input?;
        println!("[identity-log] {input}");
        let _ = std::io::stdout().flush();
        Some(input)
    }
}

/// ASCII-uppercases every byte.
pub struct Uppercase;

impl Transform for Uppercase {
    fn apply(&self, input: Option<String>) -> Option<String> {
        Some(input?.to_ascii_uppercase())
    }
}

/// Reverses character order. Operates on `char`s rather than raw bytes so
/// that multi-byte UTF-8 sequences survive intact instead of being split
/// mid-character and replaced with U+FFFD.
pub struct Reverse;

impl Transform for Reverse {
    fn apply(&self, input: Option<String>) -> Option<String> {
        let input = input?;
        Some(input.chars().rev().collect())
    }
}

/// Moves the last character to the front. Strings of length ≤ 1 character
/// are unchanged. Operates on `char`s, not bytes, for the same reason as
/// [`Reverse`].
pub struct RotateRight1;

impl Transform for RotateRight1 {
    fn apply(&self, input: Option<String>) -> Option<String> {
        let input = input?;
        let mut chars: Vec<char> = input.chars().collect();
        if chars.len() <= 1 {
            return Some(input);
        }
        let last = chars.pop().expect("checked len > 1 above");
        let mut rotated = String::with_capacity(input.len());
        rotated.push(last);
        rotated.extend(chars);
        Some(rotated)
    }
}

/// Inserts a single space between adjacent characters. Strings of length ≤ 1
/// are unchanged.
pub struct LetterSpace;

impl Transform for LetterSpace {
    fn apply(&self, input: Option<String>) -> Option<String> {
        let input = input?;
        if input.chars().count() <= 1 {
            return Some(input);
        }
        let mut out = String::with_capacity(input.len() * 2);
        let mut chars = input.chars();
        if let Some(first) = chars.next() {
            out.push(first);
        }
        for c in chars {
            out.push(' ');
            out.push(c);
        }
        Some(out)
    }
}

/// Emits `input` byte-by-byte with a ~100ms inter-byte delay, side-effecting
/// to stdout. The terminal stage skips the default sink prefix for this one
/// transform, since it already wrote its output.
pub struct Typewriter;

impl Transform for Typewriter {
    fn apply(&self, input: Option<String>) -> Option<String> {
        let input = input?;
        if input.is_empty() {
            return Some(input);
        }

        print!("[typewriter] ");
        let _ = std::io::stdout().flush();
        for byte in input.bytes() {
            print!("{}", byte as char);
            let _ = std::io::stdout().flush();
            std::thread::sleep(Duration::from_millis(100));
        }
        println!();
        let _ = std::io::stdout().flush();
        Some(input)
    }
}

/// Looks up a registered transform by name. Returns `None` if `name` is not
/// registered.
pub fn lookup(name: &str) -> Option<Box<dyn Transform + Send>> {
    match name {
        "identity-log" => Some(Box::new(IdentityLog)),
        "uppercase" => Some(Box::new(Uppercase)),
        "reverse" => Some(Box::new(Reverse)),
        "rotate-right-1" => Some(Box::new(RotateRight1)),
        "letter-space" => Some(Box::new(LetterSpace)),
        "typewriter" => Some(Box::new(Typewriter)),
        _ => None,
    }
}

/// Names of every registered transform, in the order shown by `--help`.
pub const REGISTERED_NAMES: &[&str] = &[
    "identity-log",
    "uppercase",
    "reverse",
    "rotate-right-1",
    "letter-space",
    "typewriter",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_is_idempotent() {
        let t = Uppercase;
        let once = t.apply(Some("HeLLo".into()));
        let twice = t.apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.unwrap(), "HELLO");
    }

    #[test]
    fn reverse_is_involutive() {
        let t = Reverse;
        let reversed = t.apply(Some("hello".into())).unwrap();
        let back = t.apply(Some(reversed)).unwrap();
        assert_eq!(back, "hello");
    }

    #[test]
    fn rotate_right_len_times_is_identity() {
        let t = RotateRight1;
        let original = "abcd".to_string();
        let mut current = original.clone();
        for _ in 0..original.chars().count() {
            current = t.apply(Some(current)).unwrap();
        }
        assert_eq!(current, original);
    }

    #[test]
    fn rotate_right_short_strings_unchanged() {
        let t = RotateRight1;
        assert_eq!(t.apply(Some(String::new())).unwrap(), "");
        assert_eq!(t.apply(Some("x".into())).unwrap(), "x");
    }

    #[test]
    fn reverse_preserves_multi_byte_characters() {
        let t = Reverse;
        let reversed = t.apply(Some("café".into())).unwrap();
        assert_eq!(reversed, "éfac");
        let back = t.apply(Some(reversed)).unwrap();
        assert_eq!(back, "café");
    }

    #[test]
    fn rotate_right_preserves_multi_byte_characters() {
        let t = RotateRight1;
        let original = "café".to_string();
        let mut current = original.clone();
        for _ in 0..original.chars().count() {
            current = t.apply(Some(current)).unwrap();
        }
        assert_eq!(current, original);
    }

    #[test]
    fn letter_space_length_law() {
        let t = LetterSpace;
        for s in ["", "a", "ab", "abcd"] {
            let out = t.apply(Some(s.to_string())).unwrap();
            let expected = s.chars().count().saturating_mul(2).saturating_sub(1);
            let expected = if s.is_empty() { 0 } else { expected };
            assert_eq!(out.chars().count(), expected, "input {s:?}");
        }
    }

    #[test]
    fn none_in_none_out_for_every_transform() {
        for name in REGISTERED_NAMES {
            let t = lookup(name).unwrap();
            assert!(t.apply(None).is_none(), "{name} should map None to None");
        }
    }

    #[test]
    fn typewriter_suppresses_sink_prefix() {
        assert!(Typewriter.suppresses_sink_prefix());
        assert!(!Uppercase.suppresses_sink_prefix());
    }

    #[test]
    fn lookup_rejects_unknown_name() {
        assert!(lookup("not-a-real-transform").is_none());
    }
}
