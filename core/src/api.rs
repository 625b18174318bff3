//! Typed client for the KinoClub REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::MovieSource;
use crate::error::{extract_detail, ApiError};
use crate::forms::{CommentPatch, MovieDraft, MoviePatch, NewComment, PremiumOrder, RegistrationBody, UserPatch};
use crate::models::*;
use crate::session::Session;
use crate::upload::{MovieMedia, UploadFile, UserMedia};

pub const DEFAULT_API_URL: &str = "https://aeasy-movie-server-220072593630.us-central1.run.app/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail locally without a live token.
    Required,
    /// Attach the token when there is one.
    Optional,
    None,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| ApiError::Validation(format!("invalid API URL {}: {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("kinoclub/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(8))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, base, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::Validation(format!("bad path {}: {}", path, e)))
    }

    /// Absolute URL for a media reference; relative paths resolve against the API host.
    pub fn resolve_media_url(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        self.base.join(reference).ok().map(String::from)
    }

    async fn send(&self, req: RequestBuilder, auth: Auth) -> Result<Response, ApiError> {
        let req = match auth {
            Auth::Required => req.bearer_auth(self.session.valid_token(Utc::now())?),
            Auth::Optional => match self.session.valid_token(Utc::now()) {
                Ok(token) => req.bearer_auth(token),
                Err(_) => req,
            },
            Auth::None => req,
        };
        let res = req.header(ACCEPT, "application/json").send().await?;
        let status = res.status();
        debug!(%status, url = %res.url(), "api response");
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED && auth != Auth::None {
            self.session.expire();
        }
        let err = ApiError::from_status(status.as_u16(), extract_detail(&body));
        warn!("request failed: {}", err);
        Err(err)
    }

    async fn json(&self, req: RequestBuilder, auth: Auth) -> Result<Value, ApiError> {
        let res = self.send(req, auth).await?;
        Ok(res.json::<Value>().await?)
    }

    async fn get(&self, path: &str, auth: Auth) -> Result<Value, ApiError> {
        self.json(self.http.get(self.url(path)?), auth).await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.json(self.http.post(self.url(path)?).json(body), Auth::Required).await
    }

    async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.json(self.http.patch(self.url(path)?).json(body), Auth::Required).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(path)?), Auth::Required).await?;
        Ok(())
    }

    async fn upload(&self, path: &str, file: UploadFile) -> Result<Value, ApiError> {
        let part = Part::bytes(file.bytes).file_name(file.file_name).mime_str(&file.mime)?;
        let form = Form::new().part("file", part);
        self.json(self.http.post(self.url(path)?).multipart(form), Auth::Required).await
    }

    // ---- auth & users ----

    /// Password login. Stores the token in the session on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let req = self.http.post(self.url("auth/token")?).form(&[("username", email), ("password", password)]);
        let res = match self.send(req, Auth::None).await {
            Err(ApiError::AuthenticationRequired) => return Err(ApiError::InvalidCredentials),
            other => other?,
        };
        let token: TokenResponse = res.json().await?;
        if token.access_token.trim().is_empty() {
            return Err(ApiError::Decode("token missing from login response".into()));
        }
        self.session.set_token(&token.access_token);
        info!("logged in as {}", email);
        Ok(token.access_token)
    }

    pub fn logout(&self) {
        self.session.clear();
        info!("logged out");
    }

    pub async fn register(&self, body: &RegistrationBody) -> Result<(), ApiError> {
        let req = self.http.post(self.url("users/")?).json(body);
        self.send(req, Auth::None).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let v = self.get("users/me", Auth::Required).await?;
        decode_one(&v, "user", User::from_json)
    }

    pub async fn list_users(&self, page: u32, limit: u32) -> Result<UsersPage, ApiError> {
        let mut url = self.url("users/")?;
        url.query_pairs_mut().append_pair("page", &page.to_string()).append_pair("limit", &limit.to_string());
        let v = self.json(self.http.get(url), Auth::Optional).await?;
        let users = decode_list(v, "user", User::from_json)?;
        Ok(UsersPage { total: users.len(), users, page, limit })
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        let v = self.get(&format!("users/{}", id), Auth::Optional).await?;
        decode_one(&v, "user", User::from_json)
    }

    pub async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::Validation("no changes".into()));
        }
        let v = self.patch_json(&format!("users/{}", id), patch).await?;
        decode_one(&v, "user", User::from_json)
    }

    pub async fn upload_user_media(&self, kind: UserMedia, file: UploadFile) -> Result<User, ApiError> {
        let v = self.upload(&format!("users/upload/{}", kind.path_segment()), file).await?;
        decode_one(&v, "user", User::from_json)
    }

    // ---- movies ----

    pub async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let v = self.get("movies/", Auth::Optional).await?;
        decode_list(v, "movie", Movie::from_json)
    }

    pub async fn get_movie(&self, id: i64) -> Result<Movie, ApiError> {
        let v = self.get(&format!("movies/{}", id), Auth::Optional).await?;
        decode_one(&v, "movie", Movie::from_json)
    }

    pub async fn create_movie(&self, draft: &MovieDraft) -> Result<Movie, ApiError> {
        let v = self.post_json("movies/", draft).await?;
        decode_one(&v, "movie", Movie::from_json)
    }

    pub async fn update_movie(&self, id: i64, patch: &MoviePatch) -> Result<Movie, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::Validation("no changes".into()));
        }
        let v = self.patch_json(&format!("movies/{}", id), patch).await?;
        decode_one(&v, "movie", Movie::from_json)
    }

    pub async fn delete_movie(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("movies/{}", id)).await
    }

    pub async fn upload_movie_media(&self, id: i64, kind: MovieMedia, file: UploadFile) -> Result<(), ApiError> {
        self.upload(&format!("movies/{}/upload/{}", id, kind.path_segment()), file).await?;
        Ok(())
    }

    // ---- episodes ----

    pub async fn list_episodes(&self, movie_id: i64) -> Result<Vec<Episode>, ApiError> {
        let v = self.get(&format!("episodes/movie/{}", movie_id), Auth::Optional).await?;
        decode_list(v, "episode", Episode::from_json)
    }

    pub async fn get_episode(&self, id: i64) -> Result<EpisodeDetail, ApiError> {
        let v = self.get(&format!("episodes/{}", id), Auth::Required).await?;
        decode_one(&v, "episode", EpisodeDetail::from_json)
    }

    pub async fn purchase_episode(&self, id: i64) -> Result<(), ApiError> {
        self.send(self.http.post(self.url(&format!("episodes/{}/purchase", id))?), Auth::Required).await?;
        info!(episode = id, "episode purchased");
        Ok(())
    }

    // ---- comments ----

    /// Threaded: top-level comments, replies one level deep.
    pub async fn list_comments(&self, movie_id: i64) -> Result<Vec<Comment>, ApiError> {
        let v = self.get(&format!("comments/movie/{}", movie_id), Auth::Optional).await?;
        Ok(thread_comments(decode_list(v, "comment", Comment::from_json)?))
    }

    pub async fn get_comment(&self, id: i64) -> Result<Comment, ApiError> {
        let v = self.get(&format!("comments/{}", id), Auth::Optional).await?;
        decode_one(&v, "comment", Comment::from_json)
    }

    /// Replies under one comment, flattened to a single level.
    pub async fn comment_replies(&self, id: i64) -> Result<Vec<Comment>, ApiError> {
        let v = self.get(&format!("comments/{}/replies", id), Auth::Optional).await?;
        let mut out = Vec::new();
        for mut reply in decode_list(v, "comment", Comment::from_json)? {
            let nested = std::mem::take(&mut reply.replies);
            out.push(reply);
            out.extend(nested);
        }
        Ok(out)
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let v = self.post_json("comments/", comment).await?;
        decode_one(&v, "comment", Comment::from_json)
    }

    pub async fn update_comment(&self, id: i64, patch: &CommentPatch) -> Result<Comment, ApiError> {
        let v = self.patch_json(&format!("comments/{}", id), patch).await?;
        decode_one(&v, "comment", Comment::from_json)
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("comments/{}", id)).await
    }

    // ---- premium & media ----

    pub async fn purchase_premium(&self, order: &PremiumOrder) -> Result<PremiumReceipt, ApiError> {
        let v = self.post_json("premium/purchase", order).await?;
        info!(months = order.months, "premium purchased");
        Ok(serde_json::from_value(v)?)
    }

    /// Raw bytes of a poster or avatar.
    pub async fn fetch_media(&self, reference: &str) -> Result<Vec<u8>, ApiError> {
        let url = self
            .resolve_media_url(reference)
            .ok_or_else(|| ApiError::Validation(format!("bad media reference {}", reference)))?;
        let res = self.http.get(url).send().await?.error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MovieSource for ApiClient {
    async fn fetch_movies(&self) -> Result<Vec<Movie>, ApiError> {
        self.list_movies().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers exactly one request and hands back what it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let n = sock.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{}/api", addr), handle)
    }

    fn client(base: &str, session: Session) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5), session).unwrap()
    }

    #[test]
    fn paths_join_under_api_root() {
        let api = client(DEFAULT_API_URL, Session::in_memory());
        assert_eq!(api.url("movies/").unwrap().as_str(), format!("{}/movies/", DEFAULT_API_URL));
        assert_eq!(
            api.resolve_media_url("/static/p.jpg").as_deref(),
            Some("https://aeasy-movie-server-220072593630.us-central1.run.app/static/p.jpg")
        );
        assert_eq!(api.resolve_media_url("https://cdn.example.com/a.png").as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(api.resolve_media_url(" "), None);
        assert!(ApiClient::new("not a url", Duration::from_secs(1), Session::in_memory()).is_err());
    }

    #[tokio::test]
    async fn movies_are_normalized_and_token_attached() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"movie_id":1,"title":"Solaris","rating":8.1,"genres":["Drama"," Drama"]},{"title":"no id"}]"#,
        )
        .await;
        let session = Session::in_memory();
        session.set_token("abc");
        let movies = client(&base, session).list_movies().await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].genres, vec!["Drama".to_string()]);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/movies/ "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer abc"));
    }

    #[tokio::test]
    async fn unauthorized_expires_session() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"detail":"Could not validate credentials"}"#).await;
        let session = Session::in_memory();
        session.set_token("stale");
        let err = client(&base, session.clone()).list_movies().await.unwrap_err();
        assert_eq!(err, ApiError::AuthenticationRequired);
        assert!(!session.is_logged_in());
        assert!(session.take_expired_signal());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_detail_is_kept() {
        let (base, server) = serve_once("404 Not Found", r#"{"detail":"Movie not found"}"#).await;
        let err = client(&base, Session::in_memory()).get_movie(42).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("Movie not found".into()));
        assert!(server.await.unwrap().starts_with("GET /api/movies/42 "));
    }

    fn expired_jwt() -> String {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"neo@example.com","exp":1000}"#);
        format!("e30.{}.sig", payload)
    }

    #[tokio::test]
    async fn locally_expired_token_raises_expiry_signal() {
        let session = Session::in_memory();
        session.set_token(&expired_jwt());
        let api = client("http://127.0.0.1:9/api", session.clone());
        assert_eq!(api.purchase_episode(1).await, Err(ApiError::AuthenticationRequired));
        assert!(!session.is_logged_in());
        assert!(session.take_expired_signal());
    }

    #[tokio::test]
    async fn premium_receipt_is_decoded() {
        let (base, server) = serve_once("200 OK", r#"{"message":"Premium active for 3 months"}"#).await;
        let session = Session::in_memory();
        session.set_token("abc");
        let order = PremiumOrder::new(3).unwrap();
        let receipt = client(&base, session).purchase_premium(&order).await.unwrap();
        assert_eq!(receipt.message, "Premium active for 3 months");
        assert!(server.await.unwrap().starts_with("POST /api/premium/purchase "));
    }

    #[tokio::test]
    async fn malformed_premium_receipt_is_an_error() {
        let (base, server) = serve_once("200 OK", r#"{"message":42}"#).await;
        let session = Session::in_memory();
        session.set_token("abc");
        let order = PremiumOrder::new(1).unwrap();
        let err = client(&base, session).purchase_premium(&order).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn single_comment_is_fetched() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"comment_id":5,"content":"Great","rating":9,"movie_id":7,"user_id":2,"user":{"username":"neo"}}"#,
        )
        .await;
        let comment = client(&base, Session::in_memory()).get_comment(5).await.unwrap();
        assert_eq!((comment.id, comment.movie_id, comment.rating), (5, 7, Some(9)));
        assert!(server.await.unwrap().starts_with("GET /api/comments/5 "));
    }

    #[tokio::test]
    async fn replies_come_back_flat() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"comment_id":6,"content":"Agreed","movie_id":7,"user_id":3,"parent_comment_id":5,
                 "replies":[{"comment_id":8,"content":"Same","movie_id":7,"user_id":4,"parent_comment_id":6}]},
                {"comment_id":7,"content":"No","movie_id":7,"user_id":4,"parent_comment_id":5}]"#,
        )
        .await;
        let replies = client(&base, Session::in_memory()).comment_replies(5).await.unwrap();
        let ids: Vec<i64> = replies.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![6, 8, 7]);
        assert!(replies.iter().all(|c| c.replies.is_empty()));
        assert!(server.await.unwrap().starts_with("GET /api/comments/5/replies "));
    }

    #[tokio::test]
    async fn required_auth_fails_without_token() {
        let api = client("http://127.0.0.1:9/api", Session::in_memory());
        assert_eq!(api.current_user().await, Err(ApiError::AuthenticationRequired));
        assert_eq!(api.purchase_episode(1).await, Err(ApiError::AuthenticationRequired));
    }
}
