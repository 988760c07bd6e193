use crate::parsers::text;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_concatenates_fragments() {
        let result = text::plain_text(["Hello, ", "wor", "ld!"]);
        assert_eq!(result.as_deref(), Some("Hello, world!"));
    }

    #[test]
    fn test_plain_text_strips_newlines() {
        let result = text::plain_text(["Line 1\nLine 2\r\nLine 3"]);
        assert_eq!(result.as_deref(), Some("Line 1 Line 2 Line 3"));
    }

    #[test]
    fn test_plain_text_whitespace_only() {
        assert_eq!(text::plain_text(["   \n\t  ", "\r\n"]), None);
        assert_eq!(text::plain_text(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            text::normalize_whitespace("  Hello    world!  This\tis  a test. "),
            "Hello world! This is a test."
        );
    }

    #[test]
    fn test_strip_newlines_keeps_words_apart() {
        assert_eq!(text::strip_newlines("a\nb\rc\r\nd"), "a b c d");
    }
}
