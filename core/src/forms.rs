//! Request bodies and the local checks that run before they are sent.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::{parse_date, Language, Movie, User};

/// Genres offered by the movie editor.
pub const DEFAULT_GENRES: [&str; 8] =
    ["Боевик", "Комедия", "Драма", "Фантастика", "Ужасы", "Мелодрама", "Приключения", "Триллер"];

pub const PREMIUM_MONTHS: [u32; 4] = [1, 3, 6, 12];
pub const PREMIUM_PRICE_RUB: u32 = 299;

static LETTERS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ]+$").expect("letters pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("name and surname must contain letters only")]
    NameNotLetters,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("comment is empty")]
    EmptyComment,
    #[error("rating must be between 1 and 10")]
    RatingOutOfRange,
    #[error("release date must be YYYY-MM-DD")]
    InvalidDate,
    #[error("age must be a positive number")]
    InvalidAge,
    #[error("subscription length must be 1, 3, 6 or 12 months")]
    InvalidMonths,
    #[error("nothing changed")]
    NoChanges,
}

impl FormError {
    pub fn user_message(&self, lang: Language) -> String {
        let (ru, en) = match self {
            FormError::PasswordMismatch => ("Пароли не совпадают", "Passwords do not match"),
            FormError::NameNotLetters => (
                "Имя и фамилия должны содержать только буквы",
                "Name and surname must contain letters only",
            ),
            FormError::Required(field) => {
                return match lang {
                    Language::Russian => format!("Поле «{}» обязательно", field),
                    Language::English => format!("Field \"{}\" is required", field),
                }
            }
            FormError::EmptyComment => ("Комментарий не может быть пустым", "Comment cannot be empty"),
            FormError::RatingOutOfRange => ("Оценка должна быть от 1 до 10", "Rating must be between 1 and 10"),
            FormError::InvalidDate => ("Дата должна быть в формате ГГГГ-ММ-ДД", "Date must be YYYY-MM-DD"),
            FormError::InvalidAge => ("Возраст должен быть положительным числом", "Age must be a positive number"),
            FormError::InvalidMonths => ("Неверный срок подписки", "Invalid subscription length"),
            FormError::NoChanges => ("Нет изменений для сохранения", "No changes to save"),
        };
        match lang {
            Language::Russian => ru.to_string(),
            Language::English => en.to_string(),
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() { Err(FormError::Required(field)) } else { Ok(value.to_string()) }
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationBody {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<RegistrationBody, FormError> {
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        let name = self.name.trim();
        let surname = self.surname.trim();
        if !LETTERS_ONLY.is_match(name) || !LETTERS_ONLY.is_match(surname) {
            return Err(FormError::NameNotLetters);
        }
        if self.password.is_empty() {
            return Err(FormError::Required("password"));
        }
        Ok(RegistrationBody {
            name: name.to_string(),
            surname: surname.to_string(),
            username: required(&self.username, "username")?,
            email: required(&self.email, "email")?,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub content: String,
    pub rating: u8,
    pub movie_id: i64,
    /// Sent as `null` for top-level comments.
    pub parent_comment_id: Option<i64>,
}

impl NewComment {
    pub fn new(movie_id: i64, content: &str, rating: u8, parent_comment_id: Option<i64>) -> Result<Self, FormError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(FormError::EmptyComment);
        }
        if !(1..=10).contains(&rating) {
            return Err(FormError::RatingOutOfRange);
        }
        Ok(Self { content: content.to_string(), rating, movie_id, parent_comment_id })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl CommentPatch {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.content.is_none() && self.rating.is_none() {
            return Err(FormError::NoChanges);
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(FormError::EmptyComment);
        }
        if self.rating.is_some_and(|r| !(1..=10).contains(&r)) {
            return Err(FormError::RatingOutOfRange);
        }
        Ok(())
    }
}

/// Full body for `POST /movies/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDraft {
    pub title: String,
    pub original_title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: u32,
    pub director: String,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_url: Option<String>,
}

/// Editable text state of the movie editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieForm {
    pub title: String,
    pub original_title: String,
    pub description: String,
    pub release_date: String,
    pub duration: u32,
    pub director: String,
    pub genres: Vec<String>,
    pub movie_url: String,
}

impl MovieForm {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            original_title: movie.original_title.clone(),
            description: movie.description.clone(),
            release_date: movie.release_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            duration: movie.duration_minutes,
            director: movie.director.clone(),
            genres: movie.genres.clone(),
            movie_url: movie.movie_url.clone().unwrap_or_default(),
        }
    }

    pub fn toggle_genre(&mut self, genre: &str) {
        if let Some(pos) = self.genres.iter().position(|g| g == genre) {
            self.genres.remove(pos);
        } else {
            self.genres.push(genre.to_string());
        }
    }

    pub fn to_draft(&self) -> Result<MovieDraft, FormError> {
        let release_date = parse_date(&self.release_date).ok_or(FormError::InvalidDate)?;
        let movie_url = Some(self.movie_url.trim().to_string()).filter(|u| !u.is_empty());
        Ok(MovieDraft {
            title: required(&self.title, "title")?,
            original_title: self.original_title.trim().to_string(),
            description: self.description.trim().to_string(),
            release_date,
            duration: self.duration,
            director: self.director.trim().to_string(),
            genres: self.genres.clone(),
            movie_url,
        })
    }
}

/// Body for `PATCH /movies/{id}`: only what differs from the stored movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoviePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_url: Option<String>,
}

fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
    (old != new).then(|| new.clone())
}

impl MoviePatch {
    pub fn diff(movie: &Movie, draft: &MovieDraft) -> Self {
        let new_url = draft.movie_url.clone().unwrap_or_default();
        Self {
            title: changed(&movie.title, &draft.title),
            original_title: changed(&movie.original_title, &draft.original_title),
            description: changed(&movie.description, &draft.description),
            release_date: (movie.release_date != Some(draft.release_date)).then_some(draft.release_date),
            duration: changed(&movie.duration_minutes, &draft.duration),
            director: changed(&movie.director, &draft.director),
            genres: changed(&movie.genres, &draft.genres),
            movie_url: changed(&movie.movie_url.clone().unwrap_or_default(), &new_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Editable text state of the profile editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub location: String,
    pub age: String,
    pub about: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            surname: user.surname.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            location: user.location.clone(),
            age: user.age.map(|a| a.to_string()).unwrap_or_default(),
            about: user.about.clone(),
        }
    }
}

/// Body for `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl UserPatch {
    /// Changed fields only; an empty age field means "leave as is".
    pub fn diff(user: &User, form: &ProfileForm) -> Result<Self, FormError> {
        let text = |old: &str, new: &str| {
            let new = new.trim();
            (old != new).then(|| new.to_string())
        };
        let age = match form.age.trim() {
            "" => None,
            raw => {
                let age: u32 = raw.parse().map_err(|_| FormError::InvalidAge)?;
                if age == 0 {
                    return Err(FormError::InvalidAge);
                }
                (user.age != Some(age)).then_some(age)
            }
        };
        let patch = Self {
            name: text(&user.name, &form.name),
            surname: text(&user.surname, &form.surname),
            username: text(&user.username, &form.username),
            email: text(&user.email, &form.email),
            location: text(&user.location, &form.location),
            age,
            about: text(&user.about, &form.about),
        };
        if patch.is_empty() {
            return Err(FormError::NoChanges);
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PremiumOrder {
    pub months: u32,
    pub payment_method: String,
}

impl PremiumOrder {
    pub fn new(months: u32) -> Result<Self, FormError> {
        if !PREMIUM_MONTHS.contains(&months) {
            return Err(FormError::InvalidMonths);
        }
        Ok(Self { months, payment_method: "card".to_string() })
    }

    pub fn total_price_rub(&self) -> u32 {
        self.months * PREMIUM_PRICE_RUB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            name: "Анна".into(),
            surname: "Smith".into(),
            username: "anna".into(),
            email: "anna@example.com".into(),
            password: "secret".into(),
            confirm_password: "secret".into(),
        }
    }

    #[test]
    fn registration_checks() {
        assert!(registration().validate().is_ok());
        let mismatch = Registration { confirm_password: "other".into(), ..registration() };
        assert_eq!(mismatch.validate(), Err(FormError::PasswordMismatch));
        let digits = Registration { name: "Anna1".into(), ..registration() };
        assert_eq!(digits.validate(), Err(FormError::NameNotLetters));
        let yo = Registration { surname: "Ёлкина".into(), ..registration() };
        assert!(yo.validate().is_ok());
    }

    #[test]
    fn comment_checks() {
        assert_eq!(NewComment::new(1, "   ", 5, None), Err(FormError::EmptyComment));
        assert_eq!(NewComment::new(1, "ok", 0, None), Err(FormError::RatingOutOfRange));
        assert_eq!(NewComment::new(1, "ok", 11, None), Err(FormError::RatingOutOfRange));
        let c = NewComment::new(3, " great ", 10, None).unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["content"], "great");
        assert!(json["parent_comment_id"].is_null());
        assert_eq!(CommentPatch::default().validate(), Err(FormError::NoChanges));
    }

    fn stored_movie() -> Movie {
        Movie {
            id: 9,
            title: "Сталкер".into(),
            director: "Тарковский".into(),
            release_date: NaiveDate::from_ymd_opt(1979, 5, 25),
            duration_minutes: 163,
            genres: vec!["Драма".into()],
            ..Movie::default()
        }
    }

    #[test]
    fn movie_patch_carries_only_changes() {
        let movie = stored_movie();
        let mut form = MovieForm::from_movie(&movie);
        assert_eq!(form.release_date, "1979-05-25");
        assert!(MoviePatch::diff(&movie, &form.to_draft().unwrap()).is_empty());
        form.duration = 161;
        form.toggle_genre("Фантастика");
        let patch = MoviePatch::diff(&movie, &form.to_draft().unwrap());
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"duration": 161, "genres": ["Драма", "Фантастика"]}));
    }

    #[test]
    fn movie_form_requires_title_and_date() {
        let form = MovieForm { title: "X".into(), release_date: "soon".into(), ..MovieForm::default() };
        assert_eq!(form.to_draft(), Err(FormError::InvalidDate));
        let form = MovieForm { release_date: "2001-01-01".into(), ..MovieForm::default() };
        assert_eq!(form.to_draft(), Err(FormError::Required("title")));
    }

    #[test]
    fn user_patch_diff() {
        let user = User { id: 1, name: "Anna".into(), location: "Moscow".into(), age: Some(30), ..User::default() };
        let mut form = ProfileForm::from_user(&user);
        assert_eq!(UserPatch::diff(&user, &form), Err(FormError::NoChanges));
        form.location = " Kazan ".into();
        form.age = "31".into();
        let patch = UserPatch::diff(&user, &form).unwrap();
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({"location": "Kazan", "age": 31}));
        form.age = "abc".into();
        assert_eq!(UserPatch::diff(&user, &form), Err(FormError::InvalidAge));
    }

    #[test]
    fn premium_order() {
        assert_eq!(PremiumOrder::new(2), Err(FormError::InvalidMonths));
        let order = PremiumOrder::new(6).unwrap();
        assert_eq!(order.total_price_rub(), 1794);
        assert_eq!(order.payment_method, "card");
    }
}
