use crate::render::{render_page, Page};
use crate::routes::Reply;
use crate::util::form::{form_get, parse_form, percent_decode};

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn root() -> Reply {
    Reply::text("Hello world".into())
}

// ---------------------------------------------------------------------------
// GET /impedance?vp=..&rho=..
// ---------------------------------------------------------------------------

/// Acoustic impedance `vp * rho`. Missing or empty parameters count as 0.
pub fn impedance(query: &str) -> Reply {
    let pairs = parse_form(query);
    let param = |key: &str| -> Result<f64, String> {
        match form_get(&pairs, key).map(str::trim) {
            None | Some("") => Ok(0.0),
            Some(v) => v.parse::<f64>().map_err(|_| format!("`{}` must be a number, got '{}'", key, v)),
        }
    };

    match (param("vp"), param("rho")) {
        (Ok(vp), Ok(rho)) => Reply::text(format!("Impedance: {:?}", vp * rho)),
        (Err(e), _) | (_, Err(e)) => Reply::text(e).with_status(400),
    }
}

// ---------------------------------------------------------------------------
// GET /hello/<name>
// ---------------------------------------------------------------------------

/// `name` is one non-empty path segment; anything else is not this route.
pub fn hello(name: &str) -> Reply {
    if name.is_empty() || name.contains('/') {
        return Reply::not_found();
    }
    Reply::text(format!("Hello {}", percent_decode(name)))
}

// ---------------------------------------------------------------------------
// GET /simple
// ---------------------------------------------------------------------------

pub fn simple() -> Reply {
    Reply::html(render_page(Page::Simple, |tmpl| {
        tmpl.replace(
            "{{CONTENT}}",
            r#"<div class="card">
  <h1>A simple page</h1>
  <p>This page is a static template. The other pages send an image to the classifier:</p>
  <ul>
    <li><a href="/form">by URL</a>,</li>
    <li><a href="/upload">by uploading a file</a>,</li>
    <li><a href="/plot">by uploading a file and plotting the class probabilities</a>.</li>
  </ul>
  <p>Programs can use <code>GET /predict?url=..</code>, <code>POST /post</code> or <code>POST /base64</code> instead.</p>
</div>"#,
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets() {
        assert_eq!(root().body_str(), "Hello world");
        assert_eq!(hello("Ada%20L").body_str(), "Hello Ada L");
        assert_eq!(hello("a+b").body_str(), "Hello a+b");
    }

    #[test]
    fn hello_needs_a_single_segment() {
        assert_eq!(hello("").status, 404);
        assert_eq!(hello("a/b").status, 404);
    }

    #[test]
    fn computes_impedance() {
        assert_eq!(impedance("vp=2500&rho=2.4").body_str(), "Impedance: 6000.0");
        assert_eq!(impedance("vp=2500").body_str(), "Impedance: 0.0");
        assert_eq!(impedance("").body_str(), "Impedance: 0.0");
        assert_eq!(impedance("vp=&rho=3").body_str(), "Impedance: 0.0");
    }

    #[test]
    fn rejects_non_numeric_impedance_inputs() {
        let reply = impedance("vp=fast&rho=2");
        assert_eq!(reply.status, 400);
        assert!(reply.body_str().contains("vp"));
    }

    #[test]
    fn simple_page_is_html() {
        let reply = simple();
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body_str().contains("A simple page"));
    }
}
