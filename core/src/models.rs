//! Domain types. API payloads are read as `serde_json::Value` and normalized
//! here once, so everything past this module can assume well-formed entities.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::embed::{Backdrop, VideoEmbed};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" | "russian" => Language::Russian,
            _ => Language::English,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub original_title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: u32,
    pub director: String,
    /// Unique, in server order.
    pub genres: Vec<String>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    /// Always within 0..=10.
    pub rating: f32,
    pub movie_url: Option<String>,
}

impl Movie {
    pub fn from_json(v: &Value) -> Option<Self> {
        let id = number_i64(v, "movie_id").or_else(|| number_i64(v, "id"))?;
        let mut genres: Vec<String> = Vec::new();
        if let Some(arr) = v.get("genres").and_then(Value::as_array) {
            for g in arr.iter().filter_map(Value::as_str).map(str::trim) {
                if !g.is_empty() && !genres.iter().any(|x| x == g) {
                    genres.push(g.to_string());
                }
            }
        }
        let rating = number_f32(v, "rating")
            .filter(|r| r.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 10.0);
        Some(Movie {
            id,
            title: text(v, "title"),
            original_title: text(v, "original_title"),
            description: text(v, "description"),
            release_date: v.get("release_date").and_then(Value::as_str).and_then(parse_date),
            duration_minutes: number_i64(v, "duration").map(clamp_u32).unwrap_or(0),
            director: text(v, "director"),
            genres,
            poster: opt_text(v, "poster"),
            backdrop: opt_text(v, "backdrop"),
            rating,
            movie_url: opt_text(v, "movie_url"),
        })
    }

    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn backdrop_kind(&self) -> Backdrop {
        self.backdrop.as_deref().map(Backdrop::classify).unwrap_or(Backdrop::None)
    }

    pub fn trailer(&self) -> Option<VideoEmbed> {
        self.movie_url.as_deref().and_then(VideoEmbed::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Episode {
    pub id: i64,
    pub movie_id: i64,
    pub title: String,
    pub number: u32,
    /// Price in coins.
    pub cost: i64,
    /// Computed by the server for the requesting user.
    pub has_access: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Episode {
    pub fn from_json(v: &Value) -> Option<Self> {
        Some(Episode {
            id: number_i64(v, "episode_id").or_else(|| number_i64(v, "id"))?,
            movie_id: number_i64(v, "movie_id")?,
            title: text(v, "title"),
            number: number_i64(v, "episode_number").map(clamp_u32).unwrap_or(0),
            cost: number_i64(v, "cost").unwrap_or(0).max(0),
            has_access: flag(v, "has_access"),
            created_at: v.get("created_at").and_then(Value::as_str).and_then(parse_timestamp),
            updated_at: v.get("updated_at").and_then(Value::as_str).and_then(parse_timestamp),
        })
    }

    /// Premium overrides the per-episode flag.
    pub fn is_accessible_by(&self, user: Option<&User>) -> bool {
        self.has_access || user.is_some_and(|u| u.is_premium)
    }

    /// True when buying is the only way in, and the balance covers it.
    pub fn affordable_by(&self, user: &User) -> bool {
        user.money >= self.cost
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeDetail {
    pub episode: Episode,
    /// Playable media reference.
    pub video_file: Option<String>,
}

impl EpisodeDetail {
    pub fn from_json(v: &Value) -> Option<Self> {
        Some(EpisodeDetail { episode: Episode::from_json(v)?, video_file: opt_text(v, "video_file") })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "moderator" => Role::Moderator,
            "admin" => Role::Admin,
            "superadmin" | "super_admin" => Role::SuperAdmin,
            _ => Role::User,
        }
    }

    /// Moderator and above may create, edit and delete movies and episodes.
    pub fn can_manage_content(self) -> bool {
        !matches!(self, Role::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub photo: Option<String>,
    pub header_photo: Option<String>,
    pub about: String,
    pub location: String,
    pub age: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
    /// Coin balance.
    pub money: i64,
    pub level: u32,
    pub title: String,
    pub role: Role,
}

impl User {
    pub fn from_json(v: &Value) -> Option<Self> {
        Some(User {
            id: number_i64(v, "user_id").or_else(|| number_i64(v, "id"))?,
            username: text(v, "username"),
            email: text(v, "email"),
            name: text(v, "name"),
            surname: text(v, "surname"),
            photo: opt_text(v, "photo"),
            header_photo: opt_text(v, "header_photo"),
            about: text(v, "about"),
            location: text(v, "location"),
            age: number_i64(v, "age").filter(|a| *a > 0).map(clamp_u32),
            created_at: v.get("created_at").and_then(Value::as_str).and_then(parse_timestamp),
            updated_at: v.get("updated_at").and_then(Value::as_str).and_then(parse_timestamp),
            is_premium: flag(v, "is_premium"),
            premium_until: v.get("premium_until").and_then(Value::as_str).and_then(parse_timestamp),
            money: number_i64(v, "money").unwrap_or(0),
            level: number_i64(v, "level").map(clamp_u32).unwrap_or(0),
            title: text(v, "title"),
            role: Role::parse(&text(v, "role")),
        })
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.name, self.surname);
        let full = full.trim();
        if full.is_empty() { self.username.clone() } else { full.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentAuthor {
    pub username: String,
    pub photo: Option<String>,
    pub is_premium: bool,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    /// 1..=10 when present.
    pub rating: Option<u8>,
    pub movie_id: i64,
    pub parent_id: Option<i64>,
    pub user_id: i64,
    pub author: CommentAuthor,
    pub created_at: Option<DateTime<Utc>>,
    /// Always one level deep; deeper replies are flattened into this list.
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn from_json(v: &Value) -> Option<Self> {
        let mut comment = Self::single(v)?;
        collect_replies(v, &mut comment.replies);
        Some(comment)
    }

    fn single(v: &Value) -> Option<Self> {
        let author = v
            .get("user")
            .map(|u| CommentAuthor {
                username: text(u, "username"),
                photo: opt_text(u, "photo"),
                is_premium: flag(u, "is_premium"),
                title: text(u, "title"),
            })
            .unwrap_or_default();
        Some(Comment {
            id: number_i64(v, "comment_id").or_else(|| number_i64(v, "id"))?,
            content: text(v, "content"),
            rating: number_i64(v, "rating").map(|r| r.clamp(1, 10) as u8),
            movie_id: number_i64(v, "movie_id").unwrap_or(0),
            parent_id: number_i64(v, "parent_comment_id"),
            user_id: number_i64(v, "user_id").unwrap_or(0),
            author,
            created_at: v.get("created_at").and_then(Value::as_str).and_then(parse_timestamp),
            replies: Vec::new(),
        })
    }
}

fn collect_replies(v: &Value, out: &mut Vec<Comment>) {
    let Some(replies) = v.get("replies").and_then(Value::as_array) else { return };
    for r in replies {
        if let Some(reply) = Comment::single(r) {
            out.push(reply);
        }
        collect_replies(r, out);
    }
}

/// Builds the one-level thread view: top-level comments, each carrying its
/// replies. Replies that arrive as separate list entries are attached to
/// their parent once; replies whose parent is not in the list are dropped.
pub fn thread_comments(flat: Vec<Comment>) -> Vec<Comment> {
    let (mut roots, loose): (Vec<Comment>, Vec<Comment>) =
        flat.into_iter().partition(|c| c.parent_id.is_none());
    for reply in loose {
        let Some(parent) = roots.iter_mut().find(|r| Some(r.id) == reply.parent_id) else {
            continue;
        };
        if !parent.replies.iter().any(|x| x.id == reply.id) {
            parent.replies.push(reply);
        }
    }
    roots
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsersPage {
    pub users: Vec<User>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PremiumReceipt {
    #[serde(default)]
    pub message: String,
}

/// Decodes a JSON array, keeping well-formed entries and logging the rest.
pub fn decode_list<T>(v: Value, what: &str, parse: impl Fn(&Value) -> Option<T>) -> Result<Vec<T>, ApiError> {
    let Value::Array(items) = v else {
        return Err(ApiError::Decode(format!("expected a list of {}", what)));
    };
    let total = items.len();
    let out: Vec<T> = items.iter().filter_map(parse).collect();
    if out.len() < total {
        warn!(kind = what, dropped = total - out.len(), "dropped malformed records");
    }
    Ok(out)
}

pub fn decode_one<T>(v: &Value, what: &str, parse: impl Fn(&Value) -> Option<T>) -> Result<T, ApiError> {
    parse(v).ok_or_else(|| ApiError::Decode(format!("malformed {}", what)))
}

/// Release dates come as `YYYY-MM-DD` or as a full ISO timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    parse_timestamp(s).map(|t| t.date_naive()).or_else(|| {
        s.get(..10).and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
    })
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|n| Utc.from_utc_datetime(&n))
}

pub fn format_rating(rating: f32) -> String {
    format!("{:.1}/10", rating.clamp(0.0, 10.0))
}

fn text(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().trim().to_string()
}

fn opt_text(v: &Value, key: &str) -> Option<String> {
    Some(text(v, key)).filter(|s| !s.is_empty())
}

fn number_i64(v: &Value, key: &str) -> Option<i64> {
    let x = v.get(key)?;
    x.as_i64()
        .or_else(|| x.as_f64().map(|f| f as i64))
        .or_else(|| x.as_str().and_then(|s| s.trim().parse().ok()))
}

fn number_f32(v: &Value, key: &str) -> Option<f32> {
    let x = v.get(key)?;
    x.as_f64()
        .map(|f| f as f32)
        .or_else(|| x.as_str().and_then(|s| s.trim().parse().ok()))
}

fn flag(v: &Value, key: &str) -> bool {
    match v.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

fn clamp_u32(n: i64) -> u32 {
    n.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movie_normalizes_genres_and_rating() {
        let v = json!({
            "movie_id": 7, "title": " Heat ", "release_date": "1995-12-15",
            "rating": "11.5", "genres": ["Action", " Action", "", "Crime"], "duration": 170
        });
        let m = Movie::from_json(&v).expect("valid movie");
        assert_eq!(m.title, "Heat");
        assert_eq!(m.genres, vec!["Action".to_string(), "Crime".to_string()]);
        assert_eq!(m.rating, 10.0);
        assert_eq!(m.year(), Some(1995));
        assert_eq!(m.duration_minutes, 170);
        assert_eq!(m.poster, None);
    }

    #[test]
    fn movie_without_id_is_rejected() {
        assert!(Movie::from_json(&json!({"title": "No id"})).is_none());
        assert!(Movie::from_json(&Value::Null).is_none());
    }

    #[test]
    fn list_decoding_drops_null_entries() {
        let v = json!([{"movie_id": 1}, null, {"movie_id": 2}, "junk"]);
        let movies = decode_list(v, "movies", Movie::from_json).expect("array");
        assert_eq!(movies.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(decode_list(json!({"movie_id": 1}), "movies", Movie::from_json).is_err());
    }

    #[test]
    fn release_date_accepts_timestamps() {
        assert_eq!(parse_date("2005-06-01T00:00:00"), NaiveDate::from_ymd_opt(2005, 6, 1));
        assert_eq!(parse_date("2005-06-01T10:00:00Z"), NaiveDate::from_ymd_opt(2005, 6, 1));
        assert_eq!(parse_date("2005-06-01 and more"), NaiveDate::from_ymd_opt(2005, 6, 1));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn premium_overrides_episode_access() {
        let ep = Episode::from_json(&json!({"episode_id": 3, "movie_id": 1, "cost": 50, "has_access": false}))
            .expect("episode");
        let mut user = User::from_json(&json!({"user_id": 9, "money": 10})).expect("user");
        assert!(!ep.is_accessible_by(Some(&user)));
        assert!(!ep.is_accessible_by(None));
        assert!(!ep.affordable_by(&user));
        user.is_premium = true;
        assert!(ep.is_accessible_by(Some(&user)));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("MODERATOR"), Role::Moderator);
        assert_eq!(Role::parse("SuperAdmin"), Role::SuperAdmin);
        assert_eq!(Role::parse("whatever"), Role::User);
        assert!(Role::Admin.can_manage_content());
        assert!(!Role::User.can_manage_content());
    }

    #[test]
    fn nested_replies_flatten_to_one_level() {
        let v = json!({
            "comment_id": 1, "content": "root", "rating": 8, "movie_id": 5,
            "user": {"username": "ann", "is_premium": true},
            "replies": [
                {"comment_id": 2, "parent_comment_id": 1, "content": "a", "rating": 0,
                 "replies": [{"comment_id": 3, "parent_comment_id": 2, "content": "b"}]}
            ]
        });
        let c = Comment::from_json(&v).expect("comment");
        assert_eq!(c.author.username, "ann");
        assert!(c.author.is_premium);
        assert_eq!(c.replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(c.replies.iter().all(|r| r.replies.is_empty()));
        assert_eq!(c.replies[0].rating, Some(1));
    }

    #[test]
    fn loose_replies_attach_to_their_parent() {
        let flat = decode_list(
            json!([
                {"comment_id": 1, "content": "root"},
                {"comment_id": 2, "parent_comment_id": 1, "content": "reply"},
                {"comment_id": 4, "parent_comment_id": 99, "content": "orphan"}
            ]),
            "comments",
            Comment::from_json,
        )
        .expect("array");
        let threads = thread_comments(flat);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].id, 2);
    }

    #[test]
    fn rating_renders_on_ten_point_scale() {
        assert_eq!(format_rating(7.26), "7.3/10");
        assert_eq!(format_rating(12.0), "10.0/10");
    }
}
