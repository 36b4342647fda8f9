use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::app::{DashApp, UpdateRequest};
use crate::callbacks::CallbackError;
use crate::data::table::TableQuery;
use crate::ui::page::render_page;

// ---------------------------------------------------------------------------
// Blocking HTTP/1.1 front end – one connection at a time
// ---------------------------------------------------------------------------

/// Callback bodies are a handful of species labels; anything bigger is junk.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before a request line")]
    Empty,
    #[error("malformed request line '{0}'")]
    MalformedRequestLine(String),
    #[error("malformed header '{0}'")]
    MalformedHeader(String),
    #[error("request body of {0} bytes exceeds the limit")]
    BodyTooLarge(usize),
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Vec<u8>,
}

/// Read one request: request line, headers, then `Content-Length` bytes.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request, RequestError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(RequestError::Empty);
    }
    let request_line = line.trim_end();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(_version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let (method, path, query) = (method.to_string(), path.to_string(), query.to_string());

    let mut content_length = 0usize;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| RequestError::MalformedHeader(header.to_string()))?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value
                .trim()
                .parse()
                .map_err(|_| RequestError::MalformedHeader(header.to_string()))?;
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::BodyTooLarge(content_length));
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(Request {
        method,
        path,
        query,
        body,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                log::error!("failed to serialize response: {e}");
                Self::error(500, "serialization failed")
            }
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = json!({ "error": message }).to_string().into_bytes();
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }
}

pub fn write_response<W: Write>(out: &mut W, resp: &Response) -> io::Result<()> {
    write!(
        out,
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        resp.status,
        resp.reason(),
        resp.content_type,
        resp.body.len()
    )?;
    out.write_all(&resp.body)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

pub fn route(app: &DashApp, req: &Request) -> Response {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => Response::html(render_page(&app.state.config).into_string()),
        ("GET", "/_dash-layout") => match app.layout() {
            Ok(layout) => Response::json(200, &layout),
            Err(e) => {
                log::error!("failed to build layout: {e}");
                Response::error(500, "failed to build layout")
            }
        },
        ("POST", "/_dash-update-component") => update_component(app, &req.body),
        ("GET", "/api/table") => match TableQuery::from_query_string(&req.query) {
            Ok(query) => match app.table_page(&query) {
                Ok(page) => Response::json(200, &page),
                Err(e) => Response::error(400, &e.to_string()),
            },
            Err(e) => Response::error(400, &e.to_string()),
        },
        ("GET", "/api/health") => Response::json(200, &json!({ "status": "ok" })),
        (_, "/_dash-update-component") => Response::error(405, "use POST"),
        _ => Response::error(404, "not found"),
    }
}

fn update_component(app: &DashApp, body: &[u8]) -> Response {
    let req: UpdateRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return Response::error(400, &format!("invalid callback request: {e}")),
    };
    match app.update_component(&req) {
        Ok(value) => Response::json(200, &value),
        Err(e) => {
            let status = callback_status(&e);
            if status >= 500 {
                log::error!("callback failed: {e}");
            } else {
                log::warn!("callback rejected: {e}");
            }
            Response::error(status, &e.to_string())
        }
    }
}

fn callback_status(err: &CallbackError) -> u16 {
    match err {
        CallbackError::UnknownOutput(_) => 404,
        CallbackError::Serialize { .. } => 500,
        CallbackError::DuplicateOutput(_)
        | CallbackError::InputMismatch { .. }
        | CallbackError::InvalidInput { .. } => 400,
    }
}

// ---------------------------------------------------------------------------
// Accept loop
// ---------------------------------------------------------------------------

/// Bind the configured address and serve forever.
pub fn serve(app: &DashApp) -> Result<()> {
    let addr = &app.state.config.bind_addr;
    let listener = TcpListener::bind(addr).with_context(|| format!("binding {addr}"))?;
    log::info!("Dashboard running at http://{addr}/");
    serve_listener(app, listener)
}

/// Answer connections on an already bound listener, one at a time.
pub fn serve_listener(app: &DashApp, listener: TcpListener) -> Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => handle_connection(app, stream),
            Err(e) => log::warn!("accept failed: {e}"),
        }
    }
    Ok(())
}

fn handle_connection(app: &DashApp, mut stream: TcpStream) {
    // a silent client must not hold the single accept loop
    let timeout = Some(app.state.config.request_timeout);
    if let Err(e) = stream
        .set_read_timeout(timeout)
        .and_then(|()| stream.set_write_timeout(timeout))
    {
        log::warn!("failed to set socket timeouts: {e}");
    }

    let request = {
        let mut reader = BufReader::new(&stream);
        read_request(&mut reader)
    };
    let response = match request {
        Ok(req) => {
            log::debug!("{} {}", req.method, req.path);
            route(app, &req)
        }
        Err(RequestError::Empty) => return,
        Err(RequestError::Io(e))
            if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
        {
            log::warn!(
                "timed out waiting for request from {}",
                stream
                    .peer_addr()
                    .map_or_else(|_| "unknown peer".to_string(), |a| a.to_string())
            );
            return;
        }
        Err(e) => {
            log::warn!("bad request: {e}");
            Response::error(400, &e.to_string())
        }
    };
    if let Err(e) = write_response(&mut stream, &response) {
        log::error!("failed to write response: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::callbacks::ComponentProperty;
    use crate::config::DashboardConfig;
    use crate::data::loader::load_bundled;
    use crate::state::AppState;

    fn app() -> DashApp {
        DashApp::new(AppState::new(DashboardConfig::default(), load_bundled().unwrap())).unwrap()
    }

    fn parse(raw: &str) -> Result<Request, RequestError> {
        read_request(&mut raw.as_bytes())
    }

    fn get(path: &str) -> Request {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        Request {
            method: "GET".into(),
            path: path.into(),
            query: query.into(),
            body: Vec::new(),
        }
    }

    fn body_json(resp: &Response) -> Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn parses_request_with_body() {
        let req = parse(
            "POST /_dash-update-component?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\n[\"a\"]",
        )
        .unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/_dash-update-component");
        assert_eq!(req.query, "x=1");
        assert_eq!(req.body, b"[\"a\"]");
    }

    #[test]
    fn rejects_malformed_requests() {
        assert!(matches!(parse(""), Err(RequestError::Empty)));
        assert!(matches!(
            parse("GET\r\n\r\n"),
            Err(RequestError::MalformedRequestLine(_))
        ));
        assert!(matches!(
            parse("GET / HTTP/1.1\r\nno-colon\r\n\r\n"),
            Err(RequestError::MalformedHeader(_))
        ));
        assert!(matches!(
            parse("POST / HTTP/1.1\r\nContent-Length: 999999999\r\n\r\n"),
            Err(RequestError::BodyTooLarge(_))
        ));
    }

    #[test]
    fn routes_page_and_health() {
        let app = app();
        let page = route(&app, &get("/"));
        assert_eq!(page.status, 200);
        assert!(page.content_type.starts_with("text/html"));

        let health = route(&app, &get("/api/health"));
        assert_eq!(body_json(&health)["status"], "ok");
        assert_eq!(route(&app, &get("/nope")).status, 404);
    }

    #[test]
    fn callback_round_trip_over_http() {
        let app = app();
        let body = br#"{"output":"scatterplot.figure","inputs":[{"id":"species_checklist","property":"value","value":["virginica"]}]}"#;
        let req = Request {
            method: "POST".into(),
            path: "/_dash-update-component".into(),
            query: String::new(),
            body: body.to_vec(),
        };
        let resp = route(&app, &req);
        assert_eq!(resp.status, 200);
        let v = body_json(&resp);
        let x = v["response"]["scatterplot"]["figure"]["data"][0]["x"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(x, 50);
    }

    #[test]
    fn callback_errors_map_to_status_codes() {
        let app = app();
        let post = |body: &str| Request {
            method: "POST".into(),
            path: "/_dash-update-component".into(),
            query: String::new(),
            body: body.as_bytes().to_vec(),
        };
        assert_eq!(route(&app, &post("not json")).status, 400);
        assert_eq!(
            route(
                &app,
                &post(r#"{"output":"nothing.figure","inputs":[{"id":"species_checklist","property":"value","value":[]}]}"#)
            )
            .status,
            404
        );
        assert_eq!(
            route(
                &app,
                &post(r#"{"output":"scatterplot.figure","inputs":[{"id":"species_checklist","property":"value","value":"setosa"}]}"#)
            )
            .status,
            400
        );
        assert_eq!(route(&app, &get("/_dash-update-component")).status, 405);
    }

    #[test]
    fn serialize_failures_are_server_errors() {
        let err = CallbackError::Serialize {
            output: ComponentProperty::new("scatterplot", "figure"),
            reason: "bad float".into(),
        };
        assert_eq!(callback_status(&err), 500);
        assert_eq!(callback_status(&CallbackError::UnknownOutput("x.y".into())), 404);
        let resp = Response::error(callback_status(&err), &err.to_string());
        assert_eq!(resp.reason(), "Internal Server Error");
    }

    #[test]
    fn idle_connection_does_not_block_other_clients() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let config = DashboardConfig {
                request_timeout: Duration::from_millis(200),
                ..DashboardConfig::default()
            };
            let app = DashApp::new(AppState::new(config, load_bundled().unwrap())).unwrap();
            serve_listener(&app, listener)
        });

        // connects first and never sends a byte
        let _idle = TcpStream::connect(addr).unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        client
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        let mut text = String::new();
        client.read_to_string(&mut text).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"), "{text}");
        assert!(text.ends_with(r#"{"status":"ok"}"#));
    }

    #[test]
    fn table_endpoint_pages_and_reports_errors() {
        let app = app();
        let resp = route(&app, &get("/api/table?page=1&sort=petal_length:desc"));
        assert_eq!(resp.status, 200);
        let v = body_json(&resp);
        assert_eq!(v["page_current"], 1);
        assert_eq!(v["rows"].as_array().unwrap().len(), 6);

        assert_eq!(route(&app, &get("/api/table?sort=bogus:asc")).status, 400);
    }

    #[test]
    fn response_has_status_line_and_length() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::error(404, "not found")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 21\r\n"));
        assert!(text.ends_with(r#"{"error":"not found"}"#));
    }
}
