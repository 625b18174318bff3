use std::sync::Arc;

use kinoclub_core::forms::{MovieForm, ProfileForm, Registration, PREMIUM_MONTHS};
use kinoclub_core::oauth::CancelLogin;
use kinoclub_core::upload::{MovieMedia, UploadFile, UserMedia};
use kinoclub_core::{ApiError, CatalogError, Comment, Episode, EpisodeDetail, Movie, User, UsersPage};

/// Outcome of a movie save once the movie itself was stored. A failed poster
/// or backdrop upload does not undo the create or patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedMovie {
    pub id: i64,
    pub media_error: Option<ApiError>,
}

/// Results of background tasks, drained once per frame.
#[derive(Debug)]
pub enum Msg {
    MoviesLoaded(Result<Arc<Vec<Movie>>, CatalogError>),
    CurrentUserLoaded(Result<Arc<User>, ApiError>),
    TopUsersLoaded(Result<Vec<User>, ApiError>),

    // Movie details, tagged with the movie they belong to
    MovieLoaded { id: i64, result: Result<Movie, ApiError> },
    EpisodesLoaded { movie_id: i64, result: Result<Vec<Episode>, ApiError> },
    CommentsLoaded { movie_id: i64, result: Result<Vec<Comment>, ApiError> },
    RepliesLoaded { movie_id: i64, parent: i64, result: Result<Vec<Comment>, ApiError> },
    CommentLoaded { movie_id: i64, result: Result<Comment, ApiError> },
    EpisodeOpened { id: i64, result: Result<EpisodeDetail, ApiError> },

    UsersLoaded { page: u32, result: Result<UsersPage, ApiError> },
    UserLoaded { id: i64, result: Result<User, ApiError> },

    // Auth
    LoggedIn(Result<(), ApiError>),
    Registered(Result<(), ApiError>),
    OAuthFinished(Result<String, ApiError>),

    Mutated { action: Action, result: Result<(), ApiError> },
    MovieSaved { created: bool, result: Result<SavedMovie, ApiError> },

    // Posters and avatars
    ImageDecoded { url: String, rgba: Vec<u8>, w: u32, h: u32 },
    ImageFailed { url: String },
}

/// A completed write; decides which queries go stale and what the toast says.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PurchaseEpisode { movie_id: i64 },
    PurchasePremium { months: u32 },
    DeleteMovie { id: i64 },
    /// `parent` is set for replies.
    PostComment { movie_id: i64, parent: Option<i64> },
    EditComment { movie_id: i64, id: i64 },
    DeleteComment { movie_id: i64 },
    UpdateProfile,
    UploadUserMedia(UserMedia),
}

impl Action {
    pub fn success_key(&self) -> &'static str {
        match self {
            Action::PurchaseEpisode { .. } => "episode_purchased",
            Action::PurchasePremium { .. } => "premium_activated",
            Action::DeleteMovie { .. } => "movie_deleted",
            Action::PostComment { .. } => "comment_posted",
            Action::EditComment { .. } => "comment_updated",
            Action::DeleteComment { .. } => "comment_deleted",
            Action::UpdateProfile => "profile_updated",
            Action::UploadUserMedia(_) => "photo_uploaded",
        }
    }

    /// Movie whose details view must reload after this write. Replies and
    /// edits refresh only their own thread, see `comment_refresh`.
    pub fn movie_id(&self) -> Option<i64> {
        match self {
            Action::PurchaseEpisode { movie_id }
            | Action::PostComment { movie_id, parent: None }
            | Action::DeleteComment { movie_id } => Some(*movie_id),
            _ => None,
        }
    }

    pub fn comment_refresh(&self) -> Option<(i64, CommentRefresh)> {
        match self {
            Action::PostComment { movie_id, parent: Some(parent) } => Some((*movie_id, CommentRefresh::Replies(*parent))),
            Action::EditComment { movie_id, id } => Some((*movie_id, CommentRefresh::Single(*id))),
            _ => None,
        }
    }

    /// Writes that change the movie list.
    pub fn touches_catalog(&self) -> bool {
        matches!(self, Action::DeleteMovie { .. })
    }

    /// Writes that change the balance, premium flag or profile fields.
    pub fn touches_current_user(&self) -> bool {
        matches!(
            self,
            Action::PurchaseEpisode { .. }
                | Action::PurchasePremium { .. }
                | Action::UpdateProfile
                | Action::UploadUserMedia(_)
        )
    }
}

/// Partial reload of the comment list after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRefresh {
    Replies(i64),
    Single(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Movies,
    MovieDetails(i64),
    Login,
    Register,
    Profile,
    Users,
    UserProfile(i64),
    CreateMovie,
    EditMovie(i64),
}

impl Route {
    /// Pages that make no sense without a session.
    pub fn requires_login(self) -> bool {
        matches!(self, Route::Profile | Route::CreateMovie | Route::EditMovie(_))
    }

    pub fn requires_content_role(self) -> bool {
        matches!(self, Route::CreateMovie | Route::EditMovie(_))
    }
}

#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Idle
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(v) => Loadable::Ready(v),
            Err(e) => Loadable::Failed(e),
        }
    }
}

/// Irreversible actions waiting for the user to confirm.
#[derive(Debug, Clone)]
pub enum Confirm {
    PurchaseEpisode(Episode),
    PurchasePremium(u32),
    DeleteMovie { id: i64, title: String },
    DeleteComment { movie_id: i64, id: i64 },
}

#[derive(Debug, Clone)]
pub struct CommentEdit {
    pub id: i64,
    pub content: String,
    pub rating: u8,
}

#[derive(Debug)]
pub struct DetailsView {
    pub movie_id: i64,
    pub movie: Loadable<Movie>,
    pub episodes: Loadable<Vec<Episode>>,
    pub comments: Loadable<Vec<Comment>>,
    pub comment_text: String,
    pub comment_rating: u8,
    pub reply_to: Option<i64>,
    pub reply_text: String,
    pub editing: Option<CommentEdit>,
    /// Episode whose stream address is being fetched.
    pub opening: Option<i64>,
    pub posting: bool,
}

impl DetailsView {
    pub fn new(movie_id: i64) -> Self {
        Self {
            movie_id,
            movie: Loadable::Loading,
            episodes: Loadable::Loading,
            comments: Loadable::Loading,
            comment_text: String::new(),
            comment_rating: 5,
            reply_to: None,
            reply_text: String::new(),
            editing: None,
            opening: None,
            posting: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfileView {
    pub editing: bool,
    pub form: ProfileForm,
    pub saving: bool,
    pub premium_months: u32,
    pub uploading: Option<UserMedia>,
    /// Last failed attempt to load the signed-in user.
    pub load_error: Option<ApiError>,
}

impl ProfileView {
    pub fn new() -> Self {
        Self { premium_months: PREMIUM_MONTHS[0], ..Default::default() }
    }
}

#[derive(Debug)]
pub struct UsersView {
    pub page: u32,
    pub list: Loadable<UsersPage>,
}

impl Default for UsersView {
    fn default() -> Self {
        Self { page: 1, list: Loadable::Idle }
    }
}

#[derive(Debug, Default)]
pub struct UserProfileView {
    pub id: i64,
    pub user: Loadable<User>,
}

#[derive(Debug, Default)]
pub struct HomeView {
    pub top_users: Loadable<Vec<User>>,
}

/// Create and edit share one form; `editing_id` tells them apart.
#[derive(Debug, Default)]
pub struct MovieFormView {
    pub editing_id: Option<i64>,
    pub original: Loadable<Movie>,
    pub form: MovieForm,
    pub new_genre: String,
    pub poster: Option<UploadFile>,
    pub backdrop: Option<UploadFile>,
    pub saving: bool,
    pub error: Option<String>,
}

impl MovieFormView {
    pub fn set_media(&mut self, kind: MovieMedia, file: UploadFile) {
        match kind {
            MovieMedia::Poster => self.poster = Some(file),
            MovieMedia::Backdrop => self.backdrop = Some(file),
        }
    }
}

#[derive(Default)]
pub struct LoginView {
    pub email: String,
    pub password: String,
    pub busy: bool,
    pub error: Option<String>,
    pub oauth_cancel: Option<CancelLogin>,
}

#[derive(Debug, Default)]
pub struct RegisterView {
    pub form: Registration,
    pub busy: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_touches_user_and_movie() {
        let a = Action::PurchaseEpisode { movie_id: 7 };
        assert_eq!(a.movie_id(), Some(7));
        assert!(a.touches_current_user());
        assert!(!a.touches_catalog());
    }

    #[test]
    fn delete_movie_invalidates_catalog_only() {
        let a = Action::DeleteMovie { id: 3 };
        assert!(a.touches_catalog());
        assert!(!a.touches_current_user());
        assert_eq!(a.movie_id(), None);
    }

    #[test]
    fn comment_writes_pick_their_reload() {
        let top = Action::PostComment { movie_id: 7, parent: None };
        assert_eq!(top.movie_id(), Some(7));
        assert_eq!(top.comment_refresh(), None);

        let reply = Action::PostComment { movie_id: 7, parent: Some(5) };
        assert_eq!(reply.movie_id(), None);
        assert_eq!(reply.comment_refresh(), Some((7, CommentRefresh::Replies(5))));

        let edit = Action::EditComment { movie_id: 7, id: 9 };
        assert_eq!(edit.movie_id(), None);
        assert_eq!(edit.comment_refresh(), Some((7, CommentRefresh::Single(9))));
    }

    #[test]
    fn guarded_routes() {
        assert!(Route::Profile.requires_login());
        assert!(Route::EditMovie(1).requires_content_role());
        assert!(!Route::Movies.requires_login());
        assert!(!Route::MovieDetails(1).requires_login());
    }

    #[test]
    fn loadable_from_result() {
        let ok: Loadable<u32> = Loadable::from_result(Ok(3));
        assert_eq!(ok.ready(), Some(&3));
        let err: Loadable<u32> = Loadable::from_result(Err(ApiError::RateLimited));
        assert!(err.ready().is_none());
        assert!(Loadable::<u32>::Loading.is_loading());
    }
}
