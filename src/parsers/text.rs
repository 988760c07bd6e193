/// Reduces text fragments to one line of plain text.
///
/// Fragments are concatenated as they appear, so inline markup inside a word
/// leaves the word intact. Line breaks become spaces and whitespace runs
/// collapse to one. Returns `None` when nothing but whitespace remains.
pub fn plain_text<'a, I>(fragments: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: String = fragments.into_iter().collect();
    let text = normalize_whitespace(&strip_newlines(&joined));
    (!text.is_empty()).then_some(text)
}

/// Replaces every line break with a space
pub fn strip_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Collapses whitespace runs into single spaces and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
