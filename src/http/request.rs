use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
///
/// The common verbs get their own variant. Any other token from the request
/// line is kept verbatim in `Extension` so routing can still compare it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other method token, case preserved
    Extension(String),
}

impl Method {
    /// Returns the method token as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Extension(token) => token,
        }
    }
}

impl From<&str> for Method {
    /// Maps a request-line token to a method. Matching is case-sensitive:
    ///
    /// ```
    /// # use burrow::http::request::Method;
    /// assert_eq!(Method::from("GET"), Method::GET);
    /// assert_eq!(Method::from("get"), Method::Extension("get".to_string()));
    /// ```
    fn from(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Extension(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol versions the engine speaks.
pub const HTTP_10: &str = "HTTP/1.0";
pub const HTTP_11: &str = "HTTP/1.1";

/// Represents a parsed HTTP request from a client.
///
/// Built once by the parser and read-only afterwards. Header names are kept
/// exactly as they arrived and lookups are exact-match.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request-target, not percent-decoded (e.g. "/files/a.txt?x=1")
    pub path: String,
    /// HTTP version, `HTTP/1.0` or `HTTP/1.1`
    pub version: String,
    /// Request headers, last occurrence wins
    pub headers: HashMap<String, String>,
    /// Everything that followed the header block in the read buffer
    pub body: Vec<u8>,
    /// Content-coding negotiated from `Accept-Encoding`, if any
    pub encoding: Option<String>,
}

/// Builder for constructing Request objects.
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    encoding: Option<String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let path = self.path.ok_or("path missing")?;
        if path.is_empty() {
            return Err("path empty");
        }

        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path,
            version: self.version.unwrap_or_else(|| HTTP_11.to_string()),
            headers: self.headers,
            body: self.body,
            encoding: self.encoding,
        })
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Determines whether the client asked for the connection to stay open.
    ///
    /// The two versions have inverted defaults: HTTP/1.1 stays open unless
    /// `Connection: close` is sent, HTTP/1.0 closes unless
    /// `Connection: keep-alive` is sent. Both comparisons are exact.
    pub fn keep_alive(&self) -> bool {
        match self.version.as_str() {
            HTTP_11 => self.header("Connection") != Some("close"),
            HTTP_10 => self.header("Connection") == Some("keep-alive"),
            _ => false,
        }
    }
}
