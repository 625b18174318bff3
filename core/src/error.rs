use thiserror::Error;

use crate::models::Language;

/// Every failure the API layer can report, normalized once from the HTTP
/// status (or the transport error) at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing or expired token, or a 401 from the server.
    #[error("authentication required")]
    AuthenticationRequired,

    /// 401 on the login endpoint itself.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("too many requests")]
    RateLimited,

    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// No response was received at all.
    #[error("network error: {0}")]
    Network(String),

    /// A local constraint rejected the input before anything was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The user abandoned an interactive step such as browser login.
    #[error("cancelled")]
    Cancelled,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request failed with status {status}: {detail}")]
    Unexpected { status: u16, detail: String },
}

impl ApiError {
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_default();
        match status {
            401 => Self::AuthenticationRequired,
            403 => Self::Forbidden(detail),
            404 => Self::NotFound(detail),
            429 => Self::RateLimited,
            500..=599 => Self::Server { status, detail },
            _ => Self::Unexpected { status, detail },
        }
    }

    /// True when the caller should route to the login view instead of
    /// showing an inline error.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    pub fn user_message(&self, lang: Language) -> String {
        let ru = lang == Language::Russian;
        match self {
            Self::AuthenticationRequired => pick(ru, "Требуется авторизация", "Login required"),
            Self::InvalidCredentials => pick(ru, "Неверный email или пароль", "Invalid email or password"),
            Self::Forbidden(_) => pick(ru, "Доступ запрещен", "Access denied"),
            Self::NotFound(_) => pick(ru, "Не найдено", "Not found"),
            Self::RateLimited => pick(
                ru,
                "Слишком много запросов. Пожалуйста, подождите",
                "Too many requests. Please wait",
            ),
            Self::Server { .. } => pick(ru, "Внутренняя ошибка сервера", "Internal server error"),
            Self::Network(_) => pick(ru, "Нет ответа от сервера", "No response from server"),
            Self::Validation(msg) => msg.clone(),
            Self::Cancelled => pick(ru, "Операция отменена", "Cancelled"),
            Self::Decode(_) => pick(ru, "Некорректный ответ сервера", "Malformed server response"),
            Self::Unexpected { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::Unexpected { .. } => pick(ru, "Произошла ошибка", "Something went wrong"),
        }
    }
}

fn pick(ru: bool, russian: &str, english: &str) -> String {
    let text = if ru { russian } else { english };
    text.to_string()
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }
        match e.status() {
            Some(status) => Self::from_status(status.as_u16(), None),
            None => Self::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Pulls the human-readable `detail` out of an error body. The server sends
/// either `{"detail": "text"}` or a list of `{"msg": ...}` validation items.
pub fn extract_detail(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert_eq!(ApiError::from_status(401, None), ApiError::AuthenticationRequired);
        assert_eq!(ApiError::from_status(403, Some("no".into())), ApiError::Forbidden("no".into()));
        assert_eq!(ApiError::from_status(404, None), ApiError::NotFound(String::new()));
        assert_eq!(ApiError::from_status(429, None), ApiError::RateLimited);
        assert!(matches!(ApiError::from_status(502, None), ApiError::Server { status: 502, .. }));
        assert!(matches!(ApiError::from_status(409, None), ApiError::Unexpected { status: 409, .. }));
    }

    #[test]
    fn only_auth_failures_require_login() {
        assert!(ApiError::AuthenticationRequired.requires_login());
        assert!(!ApiError::Forbidden(String::new()).requires_login());
        assert!(!ApiError::InvalidCredentials.requires_login());
        assert!(!ApiError::Network("timeout".into()).requires_login());
    }

    #[test]
    fn detail_is_read_from_string_or_list() {
        assert_eq!(extract_detail(r#"{"detail":"Not enough coins"}"#).as_deref(), Some("Not enough coins"));
        assert_eq!(
            extract_detail(r#"{"detail":[{"msg":"field required"},{"msg":"too short"}]}"#).as_deref(),
            Some("field required; too short")
        );
        assert_eq!(extract_detail("<html>oops</html>"), None);
    }

    #[test]
    fn unexpected_error_prefers_server_detail() {
        let e = ApiError::from_status(400, Some("Episode already purchased".into()));
        assert_eq!(e.user_message(Language::English), "Episode already purchased");
        assert_eq!(ApiError::RateLimited.user_message(Language::Russian), "Слишком много запросов. Пожалуйста, подождите");
    }
}
