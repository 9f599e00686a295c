//! The HTML page that loads the bundles.

/// Page used when the project has no HTML template.
const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>kiln app</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

/// Tags to inject into a page, in load order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageAssets {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

/// Insert stylesheet links before `</head>` and script tags before `</body>`.
///
/// Either tag group is appended at the end when its closing tag is missing.
pub fn render_page(template: Option<&str>, assets: &PageAssets) -> String {
    let template = template.unwrap_or(DEFAULT_SHELL);

    let links: String = assets
        .styles
        .iter()
        .map(|href| format!("    <link href=\"{}\" rel=\"stylesheet\" />\n", escape_attr(href)))
        .collect();
    let scripts: String = assets
        .scripts
        .iter()
        .map(|src| format!("    <script defer src=\"{}\"></script>\n", escape_attr(src)))
        .collect();

    let html = insert_before(template, "</head>", &links);
    insert_before(&html, "</body>", &scripts)
}

fn insert_before(html: &str, closing: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        return html.to_string();
    }
    let lower = html.to_ascii_lowercase();
    match lower.rfind(closing) {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..pos]);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(fragment);
            out.push_str(&html[pos..]);
            out
        }
        None => {
            let mut out = html.to_string();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(fragment);
            out
        }
    }
}

/// Escape text for an HTML attribute or text node.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> PageAssets {
        PageAssets {
            styles: vec!["/static/css/main.css".into()],
            scripts: vec![
                "/static/js/runtime~main.js".into(),
                "/static/js/chunk-libs.chunk.js".into(),
                "/static/js/main.js".into(),
            ],
        }
    }

    #[test]
    fn scripts_keep_load_order() {
        let html = render_page(None, &assets());
        let runtime = html.find("runtime~main.js").unwrap();
        let libs = html.find("chunk-libs.chunk.js").unwrap();
        let main = html.find("/static/js/main.js").unwrap();
        assert!(runtime < libs && libs < main);
        assert!(main < html.find("</body>").unwrap());
    }

    #[test]
    fn styles_go_into_head() {
        let html = render_page(Some("<html><HEAD><title>x</title></HEAD><body></body></html>"), &assets());
        let link = html.find("main.css").unwrap();
        assert!(link < html.find("</HEAD>").unwrap());
    }

    #[test]
    fn missing_body_appends() {
        let html = render_page(Some("<p>hello</p>"), &assets());
        assert!(html.starts_with("<p>hello</p>\n"));
        assert!(html.trim_end().ends_with("<script defer src=\"/static/js/main.js\"></script>"));
    }

    #[test]
    fn escapes_attributes() {
        assert_eq!(escape_attr(r#"a"b<c>&'"#), "a&quot;b&lt;c&gt;&amp;&#x27;");
    }
}
