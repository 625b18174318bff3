//! Browser sign-in. The provider redirects to a short-lived listener on the
//! loopback interface, which picks the token out of the query string.

use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::ApiError;

const CALLBACK_PATH: &str = "/callback";
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// `auth/google/login` with our callback as `redirect_uri`.
pub fn google_login_url(api_base: &Url, redirect_uri: &str) -> Result<Url, ApiError> {
    let mut url = api_base
        .join("auth/google/login")
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    url.query_pairs_mut().append_pair("redirect_uri", redirect_uri);
    Ok(url)
}

/// Stops a pending login from another task.
pub struct CancelLogin(oneshot::Sender<()>);

impl CancelLogin {
    pub fn cancel(self) {
        let _ = self.0.send(());
    }
}

pub struct OAuthLogin {
    listener: TcpListener,
    login_url: Url,
    redirect_uri: String,
    cancel_rx: oneshot::Receiver<()>,
}

impl OAuthLogin {
    /// Binds `127.0.0.1:port` (0 picks a free port).
    pub async fn bind(api_base: &Url, port: u16) -> Result<(Self, CancelLogin), ApiError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| ApiError::Network(format!("cannot open callback port: {}", e)))?;
        let addr = listener.local_addr().map_err(|e| ApiError::Network(e.to_string()))?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", addr.port(), CALLBACK_PATH);
        let login_url = google_login_url(api_base, &redirect_uri)?;
        let (tx, cancel_rx) = oneshot::channel();
        debug!("oauth callback listening on {}", redirect_uri);
        Ok((Self { listener, login_url, redirect_uri, cancel_rx }, CancelLogin(tx)))
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Resolves with the access token, or fails on provider error, timeout
    /// or cancellation. The listener is closed when this returns.
    pub async fn wait(self, timeout: Duration) -> Result<String, ApiError> {
        let Self { listener, cancel_rx, .. } = self;
        let outcome = tokio::time::timeout(timeout, async {
            tokio::select! {
                res = accept_callback(&listener) => res,
                Ok(()) = cancel_rx => Err(ApiError::Cancelled),
            }
        })
        .await;
        match outcome {
            Ok(Ok(token)) => {
                info!("oauth login completed");
                Ok(token)
            }
            Ok(Err(e)) => {
                warn!("oauth login failed: {}", e);
                Err(e)
            }
            Err(_) => Err(ApiError::Network(format!("no sign-in response within {}s", timeout.as_secs()))),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Token(String),
    Denied(String),
    /// Favicon and other stray requests.
    Ignored,
}

/// Each connection is served on its own task so an idle socket (browsers
/// open speculative ones) cannot hold up the real redirect.
async fn accept_callback(listener: &TcpListener) -> Result<String, ApiError> {
    let (tx, mut rx) = mpsc::channel(8);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(|e| ApiError::Network(e.to_string()))?;
                debug!("oauth callback connection from {}", peer);
                let tx = tx.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(CONNECTION_TIMEOUT, handle_connection(stream)).await {
                        Ok(Ok(callback)) => {
                            let _ = tx.send(callback).await;
                        }
                        Ok(Err(e)) => warn!("oauth callback read failed: {}", e),
                        Err(_) => debug!("idle oauth connection from {} dropped", peer),
                    }
                });
            }
            Some(callback) = rx.recv() => match callback {
                Callback::Token(token) => return Ok(token),
                Callback::Denied(reason) => return Err(ApiError::Forbidden(reason)),
                Callback::Ignored => {}
            },
        }
    }
}

async fn handle_connection(stream: TcpStream) -> std::io::Result<Callback> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
            break;
        }
    }
    let callback = parse_request_line(&request_line);
    let (status, page) = match &callback {
        Callback::Token(_) => ("200 OK", "Вход выполнен. Окно можно закрыть. / Signed in, you can close this window."),
        Callback::Denied(_) => ("400 Bad Request", "Вход отклонён. / Sign-in was denied."),
        Callback::Ignored => ("404 Not Found", "Not found"),
    };
    let body = format!("<!doctype html><meta charset=\"utf-8\"><title>KinoClub</title><p>{}</p>", page);
    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(callback)
}

fn parse_request_line(line: &str) -> Callback {
    let mut parts = line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return Callback::Ignored;
    };
    let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", target)) else {
        return Callback::Ignored;
    };
    if url.path() != CALLBACK_PATH {
        return Callback::Ignored;
    }
    let mut token = None;
    let mut error = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "token" | "access_token" if !v.is_empty() => token = Some(v.into_owned()),
            "error" => error = Some(v.into_owned()),
            _ => {}
        }
    }
    match (token, error) {
        (Some(t), _) => Callback::Token(t),
        (None, Some(e)) => Callback::Denied(e),
        (None, None) => Callback::Denied("missing token".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn base() -> Url {
        Url::parse("https://api.example.com/api/").unwrap()
    }

    #[test]
    fn login_url_carries_redirect() {
        let url = google_login_url(&base(), "http://127.0.0.1:5000/callback").unwrap();
        assert_eq!(url.path(), "/api/auth/google/login");
        assert_eq!(url.query(), Some("redirect_uri=http%3A%2F%2F127.0.0.1%3A5000%2Fcallback"));
    }

    #[test]
    fn request_line_parsing() {
        assert_eq!(parse_request_line("GET /callback?token=abc HTTP/1.1\r\n"), Callback::Token("abc".into()));
        assert_eq!(
            parse_request_line("GET /callback?access_token=x%2By&token_type=bearer HTTP/1.1"),
            Callback::Token("x+y".into())
        );
        assert_eq!(
            parse_request_line("GET /callback?error=access_denied HTTP/1.1"),
            Callback::Denied("access_denied".into())
        );
        assert_eq!(parse_request_line("GET /favicon.ico HTTP/1.1"), Callback::Ignored);
        assert_eq!(parse_request_line("POST /callback HTTP/1.1"), Callback::Ignored);
    }

    async fn hit(redirect_uri: &str, query: &str) -> String {
        let addr = redirect_uri.trim_start_matches("http://").trim_end_matches(CALLBACK_PATH).to_string();
        let path = if query.is_empty() { "/favicon.ico".to_string() } else { format!("{}?{}", CALLBACK_PATH, query) };
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn token_arrives_through_loopback() {
        let (login, _cancel) = OAuthLogin::bind(&base(), 0).await.unwrap();
        let redirect = login.redirect_uri().to_string();
        assert!(login.login_url().as_str().contains("redirect_uri="));
        let waiter = tokio::spawn(login.wait(Duration::from_secs(5)));
        assert!(hit(&redirect, "").await.starts_with("HTTP/1.1 404"));
        assert!(hit(&redirect, "token=jwt.value.sig").await.starts_with("HTTP/1.1 200"));
        assert_eq!(waiter.await.unwrap(), Ok("jwt.value.sig".to_string()));
    }

    #[tokio::test]
    async fn idle_connection_does_not_block_redirect() {
        let (login, _cancel) = OAuthLogin::bind(&base(), 0).await.unwrap();
        let redirect = login.redirect_uri().to_string();
        let addr = redirect.trim_start_matches("http://").trim_end_matches(CALLBACK_PATH).to_string();
        let waiter = tokio::spawn(login.wait(Duration::from_secs(3)));
        let _idle = TcpStream::connect(&addr).await.unwrap();
        assert!(hit(&redirect, "token=abc").await.starts_with("HTTP/1.1 200"));
        assert_eq!(waiter.await.unwrap(), Ok("abc".to_string()));
    }

    #[tokio::test]
    async fn provider_error_is_reported() {
        let (login, _cancel) = OAuthLogin::bind(&base(), 0).await.unwrap();
        let redirect = login.redirect_uri().to_string();
        let waiter = tokio::spawn(login.wait(Duration::from_secs(5)));
        hit(&redirect, "error=access_denied").await;
        assert_eq!(waiter.await.unwrap(), Err(ApiError::Forbidden("access_denied".into())));
    }

    #[tokio::test]
    async fn cancel_and_timeout() {
        let (login, cancel) = OAuthLogin::bind(&base(), 0).await.unwrap();
        let waiter = tokio::spawn(login.wait(Duration::from_secs(30)));
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(ApiError::Cancelled));

        let (login, _cancel) = OAuthLogin::bind(&base(), 0).await.unwrap();
        let err = login.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
