use std::fmt::Write as _;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Small append-only markup builder. Text arguments are escaped.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    buf: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, tag: &str, class: Option<&str>) -> &mut Self {
        match class {
            Some(class) => {
                let _ = write!(self.buf, "<{tag} class=\"{class}\">");
            }
            None => {
                let _ = write!(self.buf, "<{tag}>");
            }
        }
        self
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        let _ = write!(self.buf, "</{tag}>");
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(&escape(text));
        self
    }

    pub fn element(&mut self, tag: &str, class: Option<&str>, text: &str) -> &mut Self {
        self.open(tag, class).text(text).close(tag)
    }

    pub fn raw(&mut self, markup: &str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// `<div class="field">` with a label and a value span.
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        self.open("div", Some("field"))
            .element("span", Some("label"), label)
            .raw(": ")
            .element("span", Some("value"), value)
            .close("div")
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape("<b>\"R&D\"</b>"), "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;");
    }

    #[test]
    fn writes_fields() {
        let mut html = HtmlWriter::new();
        html.field("Nome", "Mario & Co");
        assert_eq!(
            html.finish(),
            "<div class=\"field\"><span class=\"label\">Nome</span>: <span class=\"value\">Mario &amp; Co</span></div>"
        );
    }
}
