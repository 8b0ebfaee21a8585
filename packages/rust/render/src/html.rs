//! Small HTML building helpers shared by the page renderers.

use std::borrow::Cow;

/// Escape text for element content and double-quoted attribute values.
pub(crate) fn esc(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Document head up to and including `<body>`.
pub(crate) fn open_document(html: &mut String, title: &str, stylesheet: &str) {
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"ja\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", esc(title)));
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n",
        esc(stylesheet)
    ));
    html.push_str("</head>\n<body>\n");
}

pub(crate) fn close_document(html: &mut String) {
    html.push_str("</body>\n</html>\n");
}

/// `<a href="…">label</a>`, both parts escaped.
pub(crate) fn link(href: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", esc(href), esc(label))
}

/// Links to local pages for a list of RFC numbers.
pub(crate) fn rfc_links(numbers: &[String], page_prefix: &str) -> String {
    numbers
        .iter()
        .map(|n| link(&format!("{page_prefix}rfc{n}.html"), &format!("RFC {n}")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            esc(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&apos;"
        );
        assert_eq!(esc("plain"), "plain");
    }

    #[test]
    fn builds_rfc_links() {
        let links = rfc_links(&["5077".into(), "5246".into()], "");
        assert_eq!(
            links,
            "<a href=\"rfc5077.html\">RFC 5077</a>, <a href=\"rfc5246.html\">RFC 5246</a>"
        );
    }
}
