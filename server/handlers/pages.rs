use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use tracing::warn;

use plug_vision::chart::{probability_chart_svg, svg_data_uri};
use plug_vision::{ClassificationResult, ClassifyError, ImageSource};

use crate::render::{html_escape, render_page, Page};
use crate::routes::{Incoming, Reply};
use crate::state::SharedState;
use crate::util::form::{form_get as form_field, parse_form};
use crate::util::multipart::{extract_boundary, file_field};

// ---------------------------------------------------------------------------
// GET|POST /form
// ---------------------------------------------------------------------------

/// Empty form, or a classification of `?url=` when one is given.
pub fn form_get(query: &str, state: &SharedState) -> Reply {
    let pairs = parse_form(query);
    match form_get_value(&pairs, "url") {
        Some(url) => classify_url(url, state),
        None => page_reply(Page::Form, url_form(""), 200),
    }
}

pub fn form_post(req: &Incoming, state: &SharedState) -> Reply {
    let body = String::from_utf8_lossy(&req.body);
    let pairs = parse_form(&body);
    match form_get_value(&pairs, "url") {
        Some(url) => classify_url(url, state),
        None => {
            let err = ClassifyError::Input("missing `url` field".into());
            page_reply(Page::Form, format!("{}{}", url_form(""), error_box(&err)), err.status_code())
        }
    }
}

fn classify_url(url: &str, state: &SharedState) -> Reply {
    let echo = format!(
        "<div class=\"card\"><p>{}</p><img class=\"echo\" src=\"{}\" alt=\"submitted image\"></div>",
        html_escape(url),
        html_escape(url)
    );
    match state.pipeline.classify(ImageSource::Url(url.to_owned())) {
        Ok(result) => page_reply(Page::Form, format!("{}{}{}", url_form(url), echo, result_html(&result)), 200),
        Err(e) => {
            warn!(error = %e, "form classification failed");
            page_reply(Page::Form, format!("{}{}", url_form(url), error_box(&e)), e.status_code())
        }
    }
}

fn form_get_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    form_field(pairs, key).map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// GET|POST /upload, GET|POST /plot
// ---------------------------------------------------------------------------

pub fn upload_get() -> Reply {
    page_reply(Page::Upload, upload_form(Page::Upload), 200)
}

pub fn upload_post(req: &Incoming, state: &SharedState) -> Reply {
    classify_upload(req, state, Page::Upload)
}

pub fn plot_get() -> Reply {
    page_reply(Page::Plot, upload_form(Page::Plot), 200)
}

pub fn plot_post(req: &Incoming, state: &SharedState) -> Reply {
    classify_upload(req, state, Page::Plot)
}

fn classify_upload(req: &Incoming, state: &SharedState, page: Page) -> Reply {
    let outcome = uploaded_image(req).and_then(|bytes| {
        let result = state.pipeline.classify(ImageSource::Bytes(bytes.to_vec()))?;
        Ok((bytes, result))
    });

    match outcome {
        Ok((bytes, result)) => {
            let mut content = upload_form(page);
            content.push_str(&format!(
                "<div class=\"card\"><img class=\"echo\" src=\"data:{};base64,{}\" alt=\"uploaded image\"></div>",
                mime_for(bytes),
                STANDARD.encode(bytes)
            ));
            content.push_str(&result_html(&result));
            if page == Page::Plot {
                let svg = probability_chart_svg(&result.classes, &result.probs);
                content.push_str(&format!(
                    "<div class=\"card\"><img class=\"plot\" src=\"{}\" alt=\"class probabilities\"></div>",
                    svg_data_uri(&svg)
                ));
            }
            page_reply(page, content, 200)
        }
        Err(e) => {
            warn!(error = %e, "upload classification failed");
            page_reply(page, format!("{}{}", upload_form(page), error_box(&e)), e.status_code())
        }
    }
}

/// Bytes of the multipart field `image`.
fn uploaded_image(req: &Incoming) -> Result<&[u8], ClassifyError> {
    let boundary = extract_boundary(&req.content_type).ok_or_else(|| {
        ClassifyError::Input("expected a multipart/form-data upload".into())
    })?;
    file_field(&req.body, &boundary, "image")
        .ok_or_else(|| ClassifyError::Input("no file in the `image` field".into()))
}

fn mime_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::Bmp) => "image/bmp",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

fn page_reply(page: Page, content: String, status: u16) -> Reply {
    Reply::html(render_page(page, |tmpl| tmpl.replace("{{CONTENT}}", &content))).with_status(status)
}

fn url_form(current: &str) -> String {
    format!(
        r#"<div class="card">
  <h1>Classify an image by URL</h1>
  <form method="post" action="/form">
    <input type="text" name="url" size="60" placeholder="https://..." value="{}">
    <button type="submit">Classify</button>
  </form>
</div>"#,
        html_escape(current)
    )
}

fn upload_form(page: Page) -> String {
    let (heading, action) = match page {
        Page::Plot => ("Classify an upload and plot the probabilities", "/plot"),
        _ => ("Classify an uploaded image", "/upload"),
    };
    format!(
        r#"<div class="card">
  <h1>{}</h1>
  <form method="post" action="{}" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*">
    <button type="submit">Classify</button>
  </form>
</div>"#,
        heading, action
    )
}

/// Predicted label, its probability, and every class in label order.
fn result_html(result: &ClassificationResult) -> String {
    let rows: String = result.classes.iter().zip(&result.probs).map(|(label, p)| {
        let cls = if *label == result.label { " class=\"best\"" } else { "" };
        format!("<tr{}><td>{}</td><td>{:.4}</td></tr>", cls, html_escape(label), p)
    }).collect::<Vec<_>>().join("\n");

    format!(
        r#"<div class="card">
  <div class="prediction-hero">{}</div>
  <div class="prediction-sub">probability {:.4}</div>
  <table class="prob-table">
    <tr><th>Class</th><th>Probability</th></tr>
{}
  </table>
</div>"#,
        html_escape(&result.label),
        result.prob,
        rows
    )
}

fn error_box(err: &ClassifyError) -> String {
    format!("<div class=\"error-box\">{}</div>", html_escape(&err.to_string()))
}
