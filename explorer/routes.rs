use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{info, warn};

use plug_vision::dashboard::{
    cross_plot, filter_selection, well_log, Axis, AxisType, Datasets, SelectedData,
};

use crate::form::{form_get, parse_form};

const PAGE: &str = include_str!("assets/explorer.html");

/// Selections are a list of points; anything near this size is not one.
const MAX_SELECTION_BYTES: usize = 4 * 1024 * 1024;

pub type SharedData = Arc<Datasets>;

/// A response before it is handed to tiny_http.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Reply {
        Reply { status, content_type, body: body.into() }
    }

    fn figure(value: &Value) -> Reply {
        Reply::new(200, "application/json", value.to_string())
    }

    fn bad_request(msg: String) -> Reply {
        Reply::new(400, "application/json", serde_json::json!({ "error": msg }).to_string())
    }
}

/// Maps one request onto the dashboard's three routes.
pub fn route(method: &Method, url: &str, body: &[u8], data: &Datasets) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    match (method, path) {
        (Method::Get, "/") => Reply::new(200, "text/html; charset=utf-8", page()),
        (Method::Get, "/figure/cross-plot") => cross_plot_figure(query, data),
        (Method::Post, "/figure/well-log") => well_log_figure(body, data),
        (_, "/" | "/figure/cross-plot" | "/figure/well-log") => {
            Reply::new(405, "text/plain", "405 Method Not Allowed")
        }
        _ => Reply::new(404, "text/plain", "404 Not Found"),
    }
}

fn page() -> String {
    let options = |default: Axis| -> String {
        Axis::ALL.iter().map(|a| {
            let sel = if *a == default { " selected" } else { "" };
            format!("<option value=\"{0}\"{1}>{0}</option>", a.as_str(), sel)
        }).collect::<Vec<_>>().join("")
    };
    PAGE.replace("{{X_OPTIONS}}", &options(Axis::Porosity))
        .replace("{{Y_OPTIONS}}", &options(Axis::Kinf))
}

/// `?xaxis=&yaxis=&xtype=&ytype=`; absent parameters take the dashboard defaults.
fn cross_plot_figure(query: &str, data: &Datasets) -> Reply {
    let pairs = parse_form(query);
    let axis = |key: &str, default: Axis| -> Result<Axis, String> {
        match form_get(&pairs, key) {
            None | Some("") => Ok(default),
            Some(name) => Axis::from_name(name).ok_or_else(|| format!("unknown column '{}'", name)),
        }
    };
    let scale = |key: &str, default: AxisType| -> Result<AxisType, String> {
        match form_get(&pairs, key) {
            None | Some("") => Ok(default),
            Some(name) => AxisType::from_name(name).ok_or_else(|| format!("unknown axis type '{}'", name)),
        }
    };

    let parsed = (|| {
        Ok::<_, String>((
            axis("xaxis", Axis::Porosity)?,
            axis("yaxis", Axis::Kinf)?,
            scale("xtype", AxisType::Linear)?,
            scale("ytype", AxisType::Log)?,
        ))
    })();

    match parsed {
        Ok((x, y, xt, yt)) => Reply::figure(&cross_plot(&data.samples, x, y, xt, yt)),
        Err(msg) => Reply::bad_request(msg),
    }
}

/// Body is plotly's `selectedData`: `null`, empty, or `{"points": [..]}`.
fn well_log_figure(body: &[u8], data: &Datasets) -> Reply {
    let selection: Option<SelectedData> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(body) {
            Ok(s) => s,
            Err(e) => return Reply::bad_request(format!("invalid selectedData: {}", e)),
        }
    };
    let selected = filter_selection(&data.samples, selection.as_ref());
    Reply::figure(&well_log(&data.samples, &data.gamma, &selected))
}

pub fn dispatch(mut request: Request, data: SharedData) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_owned();

    let mut body = Vec::new();
    let reply = match request.as_reader().take(MAX_SELECTION_BYTES as u64 + 1).read_to_end(&mut body) {
        Ok(_) if body.len() > MAX_SELECTION_BYTES => Reply::new(413, "text/plain", "413 Payload Too Large"),
        Ok(_) => route(&method, &url, &body, &data),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            Reply::new(400, "text/plain", "400 Could not read request body")
        }
    };

    let status = reply.status;
    let len = reply.body.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .into_iter()
        .collect();
    let response = Response::new(StatusCode(status), headers, Cursor::new(reply.body), Some(len), None);
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to write response");
    }

    info!(
        method = %method,
        path = %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}
