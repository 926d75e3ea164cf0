//! HTML cleanup for legacy text
//!
//! Legacy names and descriptions were edited in a WYSIWYG editor and may
//! carry inline HTML. The new schema stores Markdown, so every string field
//! is converted before it is written.

use regex::{Captures, Regex};

use legacy_import_core::types::{
    ContextData, CountryData, CountryTranslationData, LanguageData, LanguageTranslationData,
};
use legacy_import_core::WriteRequest;

pub struct HtmlSanitizer {
    line_break: Regex,
    paragraph_end: Regex,
    bold: Regex,
    italic: Regex,
    link: Regex,
    tag: Regex,
    numeric_entity: Regex,
    blank_lines: Regex,
}

impl HtmlSanitizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            line_break: Regex::new(r"(?i)<br\s*/?>")?,
            paragraph_end: Regex::new(r"(?i)</p\s*>")?,
            bold: Regex::new(r"(?is)<(?:b|strong)\b[^>]*>(.*?)</(?:b|strong)\s*>")?,
            italic: Regex::new(r"(?is)<(?:i|em)\b[^>]*>(.*?)</(?:i|em)\s*>")?,
            link: Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)?,
            tag: Regex::new(r"</?[A-Za-z][^>]*>")?,
            numeric_entity: Regex::new(r"&#(x[0-9A-Fa-f]+|[0-9]+);")?,
            blank_lines: Regex::new(r"\n{3,}")?,
        })
    }

    /// Convert inline HTML to Markdown. Text without markup is returned as is.
    pub fn to_markdown(&self, text: &str) -> String {
        if !text.contains('<') && !text.contains('&') {
            return text.to_string();
        }

        let text = self.line_break.replace_all(text, "\n");
        let text = self.paragraph_end.replace_all(&text, "\n\n");
        let text = self.bold.replace_all(&text, "**$1**");
        let text = self.italic.replace_all(&text, "*$1*");
        let text = self.link.replace_all(&text, "[$2]($1)");
        let text = self.tag.replace_all(&text, "");
        let text = self.numeric_entity.replace_all(&text, |caps: &Captures<'_>| {
            let code = &caps[1];
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        });

        let text = text
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&");

        self.blank_lines
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }

    /// Apply [`HtmlSanitizer::to_markdown`] to every string field
    pub fn sanitize(&self, request: WriteRequest) -> WriteRequest {
        let md = |s: String| self.to_markdown(&s);
        match request {
            WriteRequest::Context(data) => WriteRequest::Context(ContextData {
                internal_name: md(data.internal_name),
                backward_compatibility: md(data.backward_compatibility),
                is_default: data.is_default,
            }),
            WriteRequest::Language(data) => WriteRequest::Language(LanguageData {
                id: md(data.id),
                internal_name: md(data.internal_name),
                backward_compatibility: md(data.backward_compatibility),
                is_default: data.is_default,
            }),
            WriteRequest::LanguageTranslation(data) => {
                WriteRequest::LanguageTranslation(LanguageTranslationData {
                    language_id: md(data.language_id),
                    display_language_id: md(data.display_language_id),
                    name: md(data.name),
                    backward_compatibility: md(data.backward_compatibility),
                })
            }
            WriteRequest::Country(data) => WriteRequest::Country(CountryData {
                id: md(data.id),
                internal_name: md(data.internal_name),
                backward_compatibility: md(data.backward_compatibility),
            }),
            WriteRequest::CountryTranslation(data) => {
                WriteRequest::CountryTranslation(CountryTranslationData {
                    country_id: md(data.country_id),
                    language_id: md(data.language_id),
                    name: md(data.name),
                    backward_compatibility: md(data.backward_compatibility),
                })
            }
        }
    }
}
