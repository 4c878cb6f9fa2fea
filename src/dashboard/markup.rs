//! 内联错误提示的 HTML 片段。

/// 转义文本，使其可安全放入 HTML 元素内容或属性值。
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 用 `error-message` 容器包裹一段已是安全 HTML 的内容。
pub fn error_message(inner_html: &str) -> String {
    format!("<div class=\"error-message\">{}</div>", inner_html)
}

/// 转义纯文本后再包裹。
pub fn error_message_text(text: &str) -> String {
    error_message(&escape_html(text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn wraps_trimmed_text() {
        assert_eq!(
            error_message_text("  Invalid password\n"),
            "<div class=\"error-message\">Invalid password</div>"
        );
    }
}
