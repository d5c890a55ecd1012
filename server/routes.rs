use std::io::{Cursor, Read};
use std::time::Instant;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{info, warn};

use plug_vision::ClassifyError;

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Request / reply
// ---------------------------------------------------------------------------

/// The parts of an HTTP request handlers look at, already read off the wire.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Incoming {
    pub fn new(method: Method, url: &str) -> Incoming {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p.to_owned(), q.to_owned()),
            None => (url.to_owned(), String::new()),
        };
        Incoming { method, path, query, content_type: String::new(), body: Vec::new() }
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Incoming {
        self.content_type = content_type.to_owned();
        self.body = body.into();
        self
    }
}

/// A response before it is handed to tiny_http.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Reply {
        Reply { status, content_type, headers: Vec::new(), body: body.into() }
    }

    pub fn html(body: String) -> Reply {
        Reply::new(200, "text/html; charset=utf-8", body)
    }

    pub fn text(body: String) -> Reply {
        Reply::new(200, "text/plain; charset=utf-8", body)
    }

    pub fn json<T: Serialize>(value: &T) -> Reply {
        match serde_json::to_vec(value) {
            Ok(bytes) => Reply::new(200, "application/json", bytes),
            Err(e) => Reply::new(500, "text/plain; charset=utf-8", format!("serialization failed: {}", e)),
        }
    }

    /// `{"error": ".."}` with the status the error maps to.
    pub fn json_error(err: &ClassifyError) -> Reply {
        let mut reply = Reply::json(&serde_json::json!({ "error": err.to_string() }));
        reply.status = err.status_code();
        reply
    }

    pub fn not_found() -> Reply {
        Reply::new(404, "text/plain", "404 Not Found")
    }

    pub fn method_not_allowed() -> Reply {
        Reply::new(405, "text/plain", "405 Method Not Allowed")
    }

    pub fn payload_too_large(limit: usize) -> Reply {
        Reply::new(413, "text/plain", format!("413 Request body exceeds {} bytes", limit))
    }

    pub fn with_status(mut self, status: u16) -> Reply {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Reply {
        self.headers.push((name, value.into()));
        self
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let len = self.body.len();
        let headers = std::iter::once(("Content-Type", self.content_type.to_owned()))
            .chain(self.headers)
            .filter_map(|(n, v)| Header::from_bytes(n.as_bytes(), v.as_bytes()).ok())
            .collect();
        Response::new(StatusCode(self.status), headers, Cursor::new(self.body), Some(len), None)
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps a request onto its handler. Known paths with the wrong method get 405.
pub fn route(req: &Incoming, state: &SharedState) -> Reply {
    let path = req.path.as_str();

    if let Some(name) = path.strip_prefix("/hello/") {
        return match req.method {
            _ if name.is_empty() || name.contains('/') => Reply::not_found(),
            Method::Get => handlers::basic::hello(name),
            _ => Reply::method_not_allowed(),
        };
    }

    match (&req.method, path) {
        (Method::Get, "/")          => handlers::basic::root(),
        (Method::Get, "/impedance") => handlers::basic::impedance(&req.query),
        (Method::Get, "/simple")    => handlers::basic::simple(),

        (Method::Get, "/predict")   => handlers::api::predict_url_query(&req.query, state),

        (Method::Get,  "/form")     => handlers::pages::form_get(&req.query, state),
        (Method::Post, "/form")     => handlers::pages::form_post(req, state),
        (Method::Get,  "/upload")   => handlers::pages::upload_get(),
        (Method::Post, "/upload")   => handlers::pages::upload_post(req, state),
        (Method::Get,  "/plot")     => handlers::pages::plot_get(),
        (Method::Post, "/plot")     => handlers::pages::plot_post(req, state),

        (Method::Post, "/post")                  => handlers::api::post_url(&req.body, state),
        (Method::Post, "/base64" | "/api/v0.1")  => handlers::api::post_image(&req.body, state),
        (Method::Post, "/api/v1.0")              => handlers::api::post_url_cors(&req.body, state),
        (Method::Options, "/api/v1.0")           => handlers::api::preflight(),

        (_, "/" | "/impedance" | "/simple" | "/predict" | "/form" | "/upload" | "/plot"
            | "/post" | "/base64" | "/api/v0.1" | "/api/v1.0") => Reply::method_not_allowed(),

        _ => Reply::not_found(),
    }
}

/// Reads at most `limit` bytes of body. A declared or actual length above
/// the limit yields a 413 reply instead.
pub fn read_body<R: Read>(reader: R, declared: Option<usize>, limit: usize) -> Result<Vec<u8>, Reply> {
    if declared.map(|n| n > limit).unwrap_or(false) {
        return Err(Reply::payload_too_large(limit));
    }
    let mut body = Vec::new();
    match reader.take(limit as u64 + 1).read_to_end(&mut body) {
        Ok(_) if body.len() > limit => Err(Reply::payload_too_large(limit)),
        Ok(_) => Ok(body),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            Err(Reply::new(400, "text/plain", "400 Could not read request body"))
        }
    }
}

/// Reads the request body (bounded), routes it, and writes the response.
pub fn dispatch(mut request: Request, state: SharedState) {
    let started = Instant::now();
    let limit = state.max_body_bytes;

    let mut incoming = Incoming::new(request.method().clone(), request.url());
    incoming.content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let declared = request.body_length();
    let reply = match read_body(request.as_reader(), declared, limit) {
        Ok(body) => {
            incoming.body = body;
            route(&incoming, &state)
        }
        Err(reply) => reply,
    };

    let status = reply.status;
    if let Err(e) = request.respond(reply.into_response()) {
        warn!(error = %e, "failed to write response");
    }

    info!(
        method = %incoming.method,
        path = %incoming.path,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}
