/// Text typed while the current view is displayed.
#[derive(Debug, Default, Clone)]
pub(super) struct KeyBuffer {
    text: String,
}

impl KeyBuffer {
    /// Append `text` when every character is printable ASCII or whitespace.
    pub(super) fn push(&mut self, text: &str) -> bool {
        if !is_printable(text) {
            return false;
        }
        self.text.push_str(text);
        true
    }

    pub(super) fn clear(&mut self) {
        self.text.clear();
    }

    pub(super) fn contains(&self, characters: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.text.to_lowercase().contains(&characters.to_lowercase())
        } else {
            self.text.contains(characters)
        }
    }

    pub(super) fn as_str(&self) -> &str {
        &self.text
    }
}

fn is_printable(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch.is_ascii_punctuation() || ch.is_ascii_whitespace())
}
