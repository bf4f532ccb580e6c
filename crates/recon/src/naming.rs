//! Group display-name synthesis.
//!
//! Names are `{prefix}-{scope}-{value}` where the value is reduced to a
//! character set the identity platform accepts in display names and
//! mail nicknames. The same inputs always yield the same name, and feeding an
//! already-clean value back in is a no-op, so callers can de-duplicate on the
//! result.

fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '&' | '/' | '_')
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '/' || c == '-'
}

/// Reduce a raw value to its identifier form.
///
/// Drops disallowed characters, trims, and turns every run of whitespace,
/// `/` and `-` into a single `-`. A separator left at either end is dropped.
pub fn clean_value(raw: &str) -> String {
    let kept: String = raw.chars().filter(|c| is_kept(*c)).collect();
    let mut out = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if is_separator(c) {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.push(c);
            in_separator = false;
        }
    }
    out.trim_matches('-').to_string()
}

/// Build a group display name from a prefix, a scope and a raw value.
pub fn synthesize(prefix: &str, scope: &str, raw: &str) -> String {
    format!("{prefix}-{scope}-{}", clean_value(raw))
}
