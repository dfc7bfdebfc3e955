//! MOTD decoding: the recursive styled-node tree and the legacy inline
//! color-code format, both rendered to HTML markup and plain text in a
//! single pass.

use serde::Deserialize;

/// Sentinel character introducing a legacy color or style code.
pub const CODE_SENTINEL: char = '§';

/// One node of the recursive MOTD tree. Each node carries its own style
/// attributes; children are rendered independently of the parent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotdNode {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underlined: Option<bool>,
    #[serde(default)]
    pub strikethrough: Option<bool>,
    #[serde(default)]
    pub extra: Vec<MotdNode>,
}

/// Both render targets produced by one decode traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMotd {
    pub plain: String,
    pub html: String,
}

/// Active style set for one node: the base style overridden by the node's
/// own attributes.
#[derive(Debug, Clone, Default)]
struct Style {
    color: Option<String>,
    bold: bool,
    italic: bool,
    underlined: bool,
    strikethrough: bool,
}

impl Style {
    fn overridden_by(&self, node: &MotdNode) -> Style {
        Style {
            color: node
                .color
                .as_deref()
                .and_then(css_color)
                .or_else(|| self.color.clone()),
            bold: node.bold.unwrap_or(self.bold),
            italic: node.italic.unwrap_or(self.italic),
            underlined: node.underlined.unwrap_or(self.underlined),
            strikethrough: node.strikethrough.unwrap_or(self.strikethrough),
        }
    }

    fn css(&self) -> Option<String> {
        let mut rules = Vec::new();
        if let Some(color) = &self.color {
            rules.push(format!("color: {}", color));
        }
        if self.bold {
            rules.push("font-weight: bold".to_string());
        }
        if self.italic {
            rules.push("font-style: italic".to_string());
        }
        match (self.underlined, self.strikethrough) {
            (true, true) => rules.push("text-decoration: underline line-through".to_string()),
            (true, false) => rules.push("text-decoration: underline".to_string()),
            (false, true) => rules.push("text-decoration: line-through".to_string()),
            (false, false) => {}
        }
        if rules.is_empty() {
            None
        } else {
            Some(rules.join("; "))
        }
    }
}

/// The fixed 16-entry palette selected by legacy codes 0-9 and a-f.
fn palette_color(code: char) -> Option<&'static str> {
    match code.to_ascii_lowercase() {
        '0' => Some("#000000"),
        '1' => Some("#0000AA"),
        '2' => Some("#00AA00"),
        '3' => Some("#00AAAA"),
        '4' => Some("#AA0000"),
        '5' => Some("#AA00AA"),
        '6' => Some("#FFAA00"),
        '7' => Some("#AAAAAA"),
        '8' => Some("#555555"),
        '9' => Some("#5555FF"),
        'a' => Some("#55FF55"),
        'b' => Some("#55FFFF"),
        'c' => Some("#FF5555"),
        'd' => Some("#FF55FF"),
        'e' => Some("#FFFF55"),
        'f' => Some("#FFFFFF"),
        _ => None,
    }
}

/// Maps a node-tree color name to a CSS color. Hex values pass through;
/// unknown names are dropped rather than emitted as invalid CSS.
fn css_color(name: &str) -> Option<String> {
    if name.starts_with('#') {
        return Some(name.to_string());
    }
    let hex = match name {
        "black" => "#000000",
        "dark_blue" => "#0000AA",
        "dark_green" => "#00AA00",
        "dark_aqua" => "#00AAAA",
        "dark_red" => "#AA0000",
        "dark_purple" => "#AA00AA",
        "gold" => "#FFAA00",
        "gray" => "#AAAAAA",
        "dark_gray" => "#555555",
        "blue" => "#5555FF",
        "green" => "#55FF55",
        "aqua" => "#55FFFF",
        "red" => "#FF5555",
        "light_purple" => "#FF55FF",
        "yellow" => "#FFFF55",
        "white" => "#FFFFFF",
        _ => return None,
    };
    Some(hex.to_string())
}

/// Escapes text for safe embedding in the HTML rendering.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Normalizes newline variants (CRLF and the literal two-character "\n"
/// sequence some upstreams embed) to a single line feed.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace("\\n", "\n")
}

/// Decodes a flat string with embedded legacy codes into plain text and
/// HTML spans. Codes are consumed (they never reach the plain output); an
/// unknown code passes through as literal text.
pub fn decode_legacy(text: &str) -> DecodedMotd {
    let normalized = normalize_newlines(text);
    let mut plain = String::new();
    let mut html = String::new();
    let mut span_open = false;
    let mut chars = normalized.chars();

    while let Some(ch) = chars.next() {
        if ch == CODE_SENTINEL {
            match chars.next() {
                Some(code) if palette_color(code).is_some() => {
                    // A color code closes any open span and starts a new one.
                    if span_open {
                        html.push_str("</span>");
                    }
                    html.push_str(&format!(
                        "<span style=\"color: {}\">",
                        palette_color(code).unwrap()
                    ));
                    span_open = true;
                }
                Some(code) if matches!(code.to_ascii_lowercase(), 'l' | 'm' | 'n' | 'o') => {
                    if span_open {
                        html.push_str("</span>");
                    }
                    let rule = match code.to_ascii_lowercase() {
                        'l' => "font-weight: bold",
                        'm' => "text-decoration: line-through",
                        'n' => "text-decoration: underline",
                        _ => "font-style: italic",
                    };
                    html.push_str(&format!("<span style=\"{}\">", rule));
                    span_open = true;
                }
                Some(code) if code.eq_ignore_ascii_case(&'k') => {
                    // Obfuscated text has no static rendering; the code is
                    // consumed without opening a span.
                }
                Some(code) if code.eq_ignore_ascii_case(&'r') => {
                    if span_open {
                        html.push_str("</span>");
                        span_open = false;
                    }
                }
                Some(code) => {
                    // Unknown code: the sentinel and code are literal text.
                    plain.push(CODE_SENTINEL);
                    plain.push(code);
                    html.push_str(&escape_html(&format!("{}{}", CODE_SENTINEL, code)));
                }
                None => {
                    plain.push(CODE_SENTINEL);
                    html.push_str(&escape_html(&CODE_SENTINEL.to_string()));
                }
            }
        } else if ch == '\n' {
            plain.push('\n');
            html.push_str("<br>");
        } else {
            plain.push(ch);
            html.push_str(&escape_html(&ch.to_string()));
        }
    }

    if span_open {
        html.push_str("</span>");
    }

    DecodedMotd { plain, html }
}

/// Decodes a recursive node tree, producing plain text and markup in the
/// same depth-first traversal.
pub fn decode_tree(root: &MotdNode) -> DecodedMotd {
    let mut decoded = DecodedMotd::default();
    walk(root, &Style::default(), &mut decoded);
    decoded
}

fn walk(node: &MotdNode, inherited: &Style, out: &mut DecodedMotd) {
    let style = inherited.overridden_by(node);

    if let Some(text) = &node.text {
        let run = decode_legacy(text);
        out.plain.push_str(&run.plain);
        match style.css() {
            Some(css) if !run.html.is_empty() => {
                out.html
                    .push_str(&format!("<span style=\"{}\">{}</span>", css, run.html));
            }
            _ => out.html.push_str(&run.html),
        }
    }

    // Children are wrapped independently: a child without style attributes
    // of its own renders unstyled.
    for child in &node.extra {
        walk(child, &Style::default(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_tree_renders_styled_parent_and_plain_child() {
        let root: MotdNode = serde_json::from_str(
            r#"{"text":"A","color":"red","extra":[{"text":"B"}]}"#,
        )
        .unwrap();
        let decoded = decode_tree(&root);

        assert_eq!(decoded.plain, "AB");
        assert_eq!(
            decoded.html,
            "<span style=\"color: #FF5555\">A</span>B"
        );
    }

    #[test]
    fn child_styles_are_independent_of_parent() {
        let root: MotdNode = serde_json::from_str(
            r#"{"text":"A","bold":true,"extra":[{"text":"B","color":"gold"}]}"#,
        )
        .unwrap();
        let decoded = decode_tree(&root);

        assert_eq!(decoded.plain, "AB");
        assert_eq!(
            decoded.html,
            "<span style=\"font-weight: bold\">A</span><span style=\"color: #FFAA00\">B</span>"
        );
    }

    #[test]
    fn legacy_color_and_reset() {
        let decoded = decode_legacy("§cHello§r World");

        assert_eq!(decoded.plain, "Hello World");
        assert_eq!(
            decoded.html,
            "<span style=\"color: #FF5555\">Hello</span> World"
        );
    }

    #[test]
    fn legacy_color_replaces_open_span() {
        let decoded = decode_legacy("§aGreen§bAqua");

        assert_eq!(decoded.plain, "GreenAqua");
        assert_eq!(
            decoded.html,
            "<span style=\"color: #55FF55\">Green</span><span style=\"color: #55FFFF\">Aqua</span>"
        );
    }

    #[test]
    fn legacy_style_codes_open_spans() {
        let decoded = decode_legacy("§lBold§r plain");

        assert_eq!(decoded.plain, "Bold plain");
        assert_eq!(
            decoded.html,
            "<span style=\"font-weight: bold\">Bold</span> plain"
        );
    }

    #[test]
    fn unknown_code_passes_through_literally() {
        let decoded = decode_legacy("a§zb");

        assert_eq!(decoded.plain, "a§zb");
        assert_eq!(decoded.html, "a§zb");
    }

    #[test]
    fn obfuscated_code_is_consumed_without_span() {
        let decoded = decode_legacy("§kxyz§r!");

        assert_eq!(decoded.plain, "xyz!");
        assert_eq!(decoded.html, "xyz!");
    }

    #[test]
    fn trailing_sentinel_is_literal() {
        let decoded = decode_legacy("end§");

        assert_eq!(decoded.plain, "end§");
        assert_eq!(decoded.html, "end§");
    }

    #[test]
    fn multibyte_text_survives_code_scanning() {
        let decoded = decode_legacy("§6欢迎§r来到服务器");

        assert_eq!(decoded.plain, "欢迎来到服务器");
        assert_eq!(
            decoded.html,
            "<span style=\"color: #FFAA00\">欢迎</span>来到服务器"
        );
    }

    #[test]
    fn literal_text_is_escaped() {
        let decoded = decode_legacy("<b> & 'quotes'");

        assert_eq!(decoded.plain, "<b> & 'quotes'");
        assert_eq!(decoded.html, "&lt;b&gt; &amp; &#39;quotes&#39;");
    }

    #[test]
    fn newline_variants_become_line_breaks() {
        let decoded = decode_legacy("line one\\nline two\r\nline three");

        assert_eq!(decoded.plain, "line one\nline two\nline three");
        assert_eq!(decoded.html, "line one<br>line two<br>line three");
    }

    #[test]
    fn embedded_legacy_codes_inside_tree_nodes() {
        let root: MotdNode =
            serde_json::from_str(r#"{"text":"§cred§r plain","extra":[]}"#).unwrap();
        let decoded = decode_tree(&root);

        assert_eq!(decoded.plain, "red plain");
        assert_eq!(
            decoded.html,
            "<span style=\"color: #FF5555\">red</span> plain"
        );
    }

    #[test]
    fn hex_color_passes_through() {
        let root: MotdNode =
            serde_json::from_str(r##"{"text":"X","color":"#123456"}"##).unwrap();
        let decoded = decode_tree(&root);

        assert_eq!(decoded.html, "<span style=\"color: #123456\">X</span>");
    }

    #[test]
    fn combined_styles_share_one_span() {
        let root: MotdNode = serde_json::from_str(
            r#"{"text":"X","color":"aqua","bold":true,"underlined":true,"strikethrough":true}"#,
        )
        .unwrap();
        let decoded = decode_tree(&root);

        assert_eq!(
            decoded.html,
            "<span style=\"color: #55FFFF; font-weight: bold; text-decoration: underline line-through\">X</span>"
        );
    }
}
