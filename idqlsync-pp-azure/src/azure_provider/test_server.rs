/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Minimal HTTP/1.1 server standing in for Azure in tests.

use super::AccessTokenCache;
use super::ArmClient;
use super::AzureCredentials;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

/// Placeholder replaced by the server's base URL in response headers and
/// bodies.
pub const BASE_URL: &str = "{base_url}";

/// A request received by the [TestServer].
#[derive(Debug, Clone)]
pub struct TestRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TestRequest {
    /// Value of a request header. Header names are lower case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Canned response of the [TestServer].
pub struct TestResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl TestResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![],
            body: String::new(),
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_owned();
        self
    }
}

type Handler = dyn Fn(&TestRequest) -> TestResponse + Send + Sync;

/// Serves token requests itself and everything else through a handler.
pub struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<TestRequest>>>,
}

impl TestServer {
    pub const SUBSCRIPTION: &str = "sub";

    pub async fn start<H>(handler: H) -> Self
    where
        H: Fn(&TestRequest) -> TestResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);
        let accept_requests = Arc::clone(&requests);
        let accept_base_url = base_url.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let requests = Arc::clone(&accept_requests);
                let base_url = accept_base_url.clone();
                tokio::spawn(async move {
                    Self::serve(stream, &handler, &requests, &base_url).await;
                });
            }
        });
        Self { base_url, requests }
    }

    /// Client using this server for both tokens and management requests.
    pub fn arm_client(&self) -> Arc<ArmClient> {
        let credentials = AzureCredentials::from_json(&format!(
            r#"{{"appId":"a","secret":"s","tenant":"t","subscription":"{}"}}"#,
            Self::SUBSCRIPTION
        ))
        .unwrap();
        let token_cache = AccessTokenCache::with_authority_host(credentials, &self.base_url);
        ArmClient::with_endpoints(&self.base_url, token_cache, Duration::from_secs(5)).unwrap()
    }

    /// Requests received so far, except token requests.
    pub fn requests(&self) -> Vec<TestRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn serve(
        mut stream: TcpStream,
        handler: &Arc<Handler>,
        requests: &Mutex<Vec<TestRequest>>,
        base_url: &str,
    ) {
        let Some(request) = Self::read_request(&mut stream).await else {
            return;
        };
        let response = if request.path.ends_with("/oauth2/v2.0/token") {
            TestResponse::json(
                200,
                r#"{"token_type":"Bearer","expires_in":3599,"access_token":"test-token"}"#,
            )
        } else {
            requests.lock().unwrap().push(request.clone());
            (**handler)(&request)
        };
        let body = response.body.replace(BASE_URL, base_url);
        let mut out = format!(
            "HTTP/1.1 {} Test\r\ncontent-length: {}\r\nconnection: close\r\n",
            response.status,
            body.len()
        );
        for (name, value) in &response.headers {
            out.push_str(&format!("{name}: {}\r\n", value.replace(BASE_URL, base_url)));
        }
        out.push_str("\r\n");
        out.push_str(&body);
        let _ = stream.write_all(out.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    async fn read_request(stream: &mut TcpStream) -> Option<TestRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_owned();
        let path = request_line.next()?.to_owned();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_owned()))
            .collect::<Vec<_>>();
        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        while buf.len() < body_start + content_length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string();
        Some(TestRequest {
            method,
            path,
            headers,
            body,
        })
    }
}
