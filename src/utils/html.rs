/// Sanitize user-entered listing text using the ammonia library.
///
/// Whitelist-based: safe inline tags survive, anything dangerous
/// (<script>, <iframe>, event handler attributes) is stripped before the
/// text reaches the database. Fail-safe against stored XSS in the
/// dashboards that render listing content.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags_entirely() {
        let cleaned = clean_text("<script>alert(1)</script>Bright corner flat");
        assert_eq!(cleaned, "Bright corner flat");
    }

    #[test]
    fn keeps_plain_text_untouched() {
        assert_eq!(
            clean_text("Spacious apartment close to the city center."),
            "Spacious apartment close to the city center."
        );
    }

    #[test]
    fn drops_event_handler_attributes() {
        let cleaned = clean_text(r#"<b onclick="steal()">nice</b>"#);
        assert_eq!(cleaned, "<b>nice</b>");
    }
}
