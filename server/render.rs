//! Page template for the inference web app.
//!
//! Every HTML page shares `server/assets/page.html`, which carries
//! `{{TOKEN}}` placeholders. `render_page` resolves the global ones (title
//! and navigation) and lets the caller fill page-specific tokens; anything
//! left over is blanked so raw placeholders never reach the browser.

const TEMPLATE: &str = include_str!("assets/page.html");

/// Which page is active; drives the title and the highlighted nav link.
#[derive(Clone, Copy, PartialEq)]
pub enum Page {
    Simple,
    Form,
    Upload,
    Plot,
}

impl Page {
    const ALL: [Page; 4] = [Page::Simple, Page::Form, Page::Upload, Page::Plot];

    fn title(&self) -> &'static str {
        match self {
            Page::Simple => "Simple page",
            Page::Form   => "Classify by URL",
            Page::Upload => "Classify an upload",
            Page::Plot   => "Classify with probability plot",
        }
    }

    fn href(&self) -> &'static str {
        match self {
            Page::Simple => "/simple",
            Page::Form   => "/form",
            Page::Upload => "/upload",
            Page::Plot   => "/plot",
        }
    }
}

/// Renders the full page.
///
/// - `page`: active page, used for `{{TITLE}}` and `{{NAV}}`
/// - `fill`: closure that fills page-specific placeholders (`{{CONTENT}}`)
pub fn render_page<F>(page: Page, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let nav: String = Page::ALL.iter().map(|p| {
        let cls = if *p == page { " class=\"active\"" } else { "" };
        format!("<a href=\"{}\"{}>{}</a>", p.href(), cls, p.title())
    }).collect::<Vec<_>>().join("\n");

    let mut html = TEMPLATE.to_owned();
    html = html.replace("{{TITLE}}", page.title());
    html = html.replace("{{NAV}}", &nav);
    html = fill(html);
    blank_remaining(html)
}

/// Replaces any `{{TOKEN}}` that was not substituted with an empty string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_blanks_placeholders() {
        let html = render_page(Page::Form, |t| t.replace("{{CONTENT}}", "<p>body</p>"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("Classify by URL"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn marks_active_nav_link() {
        let html = render_page(Page::Plot, |t| t);
        assert!(html.contains("<a href=\"/plot\" class=\"active\">"));
        assert!(html.contains("<a href=\"/upload\">"));
    }

    #[test]
    fn blanks_unknown_tokens_only() {
        assert_eq!(blank_remaining("a{{X}}b{{Y}}c".into()), "abc");
        assert_eq!(blank_remaining("open {{ only".into()), "open {{ only");
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(html_escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
