//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! dispatch and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::Body;
use hyper::header::USER_AGENT;
use hyper::{Method, Request, Response};

use super::open::OpenResponder;
use crate::config::FilesConfig;
use crate::http::{self, ResponseBody};
use crate::jobs::JobClient;
use crate::logger::{self, AccessLogEntry};

/// Route of the remote file open endpoint
pub const OPEN_PATH: &str = "/open";

/// Routes requests for one job client.
///
/// The client is injected at construction and shared by all endpoints; the
/// open endpoint reads the local filesystem and never calls it.
pub struct Router<C: JobClient> {
    client: Arc<C>,
    open: OpenResponder,
    /// Access log format, `None` when access logging is off
    access_log: Option<String>,
}

impl<C: JobClient> Router<C> {
    pub fn new(client: Arc<C>, files: &FilesConfig) -> Self {
        Self {
            client,
            open: OpenResponder::new(files),
            access_log: None,
        }
    }

    #[must_use]
    pub fn with_access_log(mut self, format: impl Into<String>) -> Self {
        self.access_log = Some(format.into());
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Dispatch a request to its endpoint
    pub async fn route(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
    ) -> Response<ResponseBody> {
        match path {
            OPEN_PATH => match *method {
                Method::GET => self.open.handle(query).await,
                _ => {
                    logger::log_warning(&format!("Method not allowed: {method} {OPEN_PATH}"));
                    http::build_405_response("GET")
                }
            },
            _ => http::build_404_response(),
        }
    }

    /// Main entry point for one request on a connection from `peer_addr`
    pub async fn handle_request<B>(
        &self,
        req: Request<B>,
        peer_addr: SocketAddr,
    ) -> Result<Response<ResponseBody>, Infallible> {
        let start = Instant::now();
        // Owned copies keep the request itself out of the awaited future
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(ToString::to_string);

        let response = self.route(&method, &path, query.as_deref()).await;

        if let Some(format) = &self.access_log {
            let entry = access_entry(&req, &response, peer_addr, start);
            logger::log_access(&entry, format);
        }

        Ok(response)
    }
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    start: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact();
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::open::NO_PATH_MESSAGE;
    use crate::jobs::LocalClient;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::io::Write;

    fn router() -> Router<LocalClient> {
        Router::new(Arc::new(LocalClient), &FilesConfig::default())
    }

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_without_path() {
        let resp = router().handle_request(get("/open"), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], NO_PATH_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let resp = router()
            .handle_request(get("/open?path=/foo/bar"), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_open_existing_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"job 7 finished\n").unwrap();

        let uri = format!("/open?path={}", tmp.path().display());
        let resp = router()
            .with_access_log("common")
            .handle_request(get(&uri), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"job 7 finished\n");
    }

    #[tokio::test]
    async fn test_wrong_method_on_open() {
        let resp = router()
            .route(&Method::POST, "/open", Some("path=/tmp/x"))
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        for (path, query) in [("/", None), ("/open/extra", None), ("/status", Some("path=/tmp"))] {
            let resp = router().route(&Method::GET, path, query).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[test]
    fn test_client_is_shared() {
        let client = Arc::new(LocalClient);
        let router = Router::new(Arc::clone(&client), &FilesConfig::default());
        assert!(Arc::ptr_eq(router.client(), &client));
        assert_eq!(router.client().backend(), "local");
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::get("/open?path=/tmp/out")
            .header(USER_AGENT, "curl/8.5.0")
            .body(())
            .unwrap();
        let resp = http::build_404_response();
        let entry = access_entry(&req, &resp, peer(), Instant::now());
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.path, "/open");
        assert_eq!(entry.query.as_deref(), Some("path=/tmp/out"));
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.status, 404);
        assert_eq!(entry.body_bytes, Some(13));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.5.0"));
    }
}
