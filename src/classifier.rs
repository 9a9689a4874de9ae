//! Keep-original classification of text content.

/// Which content classes keep their original font while the override is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepPolicy {
    pub latin: bool,
    pub digits: bool,
}

impl KeepPolicy {
    pub fn new(latin: bool, digits: bool) -> Self {
        Self { latin, digits }
    }

    /// Whether any content can keep its original font at all.
    pub fn is_active(self) -> bool {
        self.latin || self.digits
    }

    pub fn keeps_original(self, text: &str) -> bool {
        should_keep_original(text, self.latin, self.digits)
    }
}

/// Decide whether `text` should keep its original font.
///
/// Spans between `<` and `>` are formatting tags and are skipped; an
/// unterminated tag hides the rest of the string. Any visible character that
/// is neither printable ASCII nor whitespace disqualifies the whole string,
/// so mixed-script sentences are never split across fonts.
pub fn should_keep_original(text: &str, keep_latin: bool, keep_digits: bool) -> bool {
    if !keep_latin && !keep_digits {
        return false;
    }

    let mut in_tag = false;
    let mut has_latin = false;
    let mut has_digit = false;

    for c in text.chars() {
        if in_tag {
            if c == '>' {
                in_tag = false;
            }
            continue;
        }
        if c == '<' {
            in_tag = true;
            continue;
        }
        if c.is_whitespace() {
            continue;
        }
        if !(' '..='~').contains(&c) {
            return false;
        }
        has_latin |= c.is_ascii_alphabetic();
        has_digit |= c.is_ascii_digit();
    }

    (keep_latin && has_latin) || (keep_digits && has_digit)
}
