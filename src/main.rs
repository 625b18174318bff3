mod app_state;
mod auth_panel;
mod config;
mod details_panel;
mod helpers;
mod home_panel;
mod i18n;
mod icon;
mod images;
mod logger;
mod movie_form_panel;
mod movies_panel;
mod player;
mod profile_panel;
mod storage;
mod ui_helpers;
mod users_panel;

use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};
use kinoclub_core::forms::PremiumOrder;
use kinoclub_core::oauth::CancelLogin;
use kinoclub_core::{ApiClient, ApiError, Catalog, CatalogError, CatalogFilter, Language, QueryCache, QueryKey, Session, User, DEFAULT_API_URL};
use tracing::{error, info, warn};

use app_state::*;
use config::{read_config, save_config, Config};
use helpers::format_coins;
use i18n::t;
use images::ImageManager;
use storage::FileTokenStore;

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    let log_path = logger::init();
    info!("KinoClub {} starting, log file {}", env!("CARGO_PKG_VERSION"), log_path.display());

    let config = read_config().unwrap_or_else(|e| {
        info!("no config file ({}), using defaults", e);
        Config::default()
    });
    let session = Session::new(Box::new(FileTokenStore::in_data_dir()));
    let api = match build_client(&config, session.clone()) {
        Ok(api) => api,
        Err(e) => {
            error!("cannot create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let icon = icon::generate_icon(256);
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 840.0])
        .with_min_inner_size([800.0, 560.0])
        .with_icon(icon);
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "KinoClub",
        options,
        Box::new(move |cc| Box::new(KinoClub::new(cc, config, session, api))),
    )
}

/// Client for the configured URL, falling back to the default one when the
/// configured value does not parse.
fn build_client(cfg: &Config, session: Session) -> Result<ApiClient, ApiError> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs.max(1));
    let url = cfg.effective_api_url();
    ApiClient::new(&url, timeout, session.clone()).or_else(|e| {
        warn!("invalid API URL {}: {}, using {}", url, e, DEFAULT_API_URL);
        ApiClient::new(DEFAULT_API_URL, timeout, session)
    })
}

#[derive(Clone)]
struct Toast {
    message: String,
    toast_type: ToastType,
    created_at: std::time::Instant,
}

#[derive(Clone, Copy, PartialEq)]
enum ToastType {
    Info,
    Success,
    Warning,
    Error,
}

struct KinoClub {
    config: Config,
    config_draft: Config,
    show_config: bool,
    theme_applied: bool,
    font_scale_applied: bool,

    session: Session,
    api: ApiClient,
    catalog: Arc<Catalog<ApiClient>>,
    user_cache: Arc<QueryCache<User>>,
    current_user: Option<Arc<User>>,
    user_loading: bool,

    tx: Sender<Msg>,
    rx: Receiver<Msg>,
    ctx: egui::Context,
    images: ImageManager,
    toasts: Vec<Toast>,

    route: Route,
    history: Vec<Route>,
    pending_nav: Option<Route>,
    after_login: Option<Route>,
    confirm: Option<Confirm>,
    pending_oauth: Option<tokio::sync::oneshot::Receiver<CancelLogin>>,

    // Movies page
    filter: CatalogFilter,
    movies_loading: bool,
    movies_error: Option<CatalogError>,

    home: HomeView,
    details: Option<DetailsView>,
    profile: ProfileView,
    users: UsersView,
    user_profile: UserProfileView,
    movie_form: MovieFormView,
    login: LoginView,
    register: RegisterView,
}

impl KinoClub {
    fn new(cc: &eframe::CreationContext<'_>, config: Config, session: Session, api: ApiClient) -> Self {
        let (tx, rx) = channel();
        let mut app = Self {
            config_draft: config.clone(),
            config,
            show_config: false,
            theme_applied: false,
            font_scale_applied: false,
            catalog: Arc::new(Catalog::new(api.clone())),
            session,
            api,
            user_cache: Arc::new(QueryCache::new()),
            current_user: None,
            user_loading: false,
            tx,
            rx,
            ctx: cc.egui_ctx.clone(),
            images: ImageManager::default(),
            toasts: Vec::new(),
            route: Route::Home,
            history: Vec::new(),
            pending_nav: None,
            after_login: None,
            confirm: None,
            pending_oauth: None,
            filter: CatalogFilter::default(),
            movies_loading: false,
            movies_error: None,
            home: HomeView::default(),
            details: None,
            profile: ProfileView::new(),
            users: UsersView::default(),
            user_profile: UserProfileView::default(),
            movie_form: MovieFormView::default(),
            login: LoginView::default(),
            register: RegisterView::default(),
        };
        app.load_current_user();
        app.enter_route(Route::Home);
        app
    }

    fn lang(&self) -> Language {
        self.config.language
    }

    fn tr(&self, key: &str) -> String {
        t(key, self.config.language)
    }

    /// Runs `task` on the runtime and posts its message back to the UI thread.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let msg = task.await;
            if tx.send(msg).is_err() {
                warn!("UI closed, dropping background result");
            }
            ctx.request_repaint();
        });
    }

    fn add_toast(&mut self, message: String, toast_type: ToastType) {
        self.toasts.push(Toast {
            message,
            toast_type,
            created_at: std::time::Instant::now(),
        });
    }

    fn toast_error(&mut self, err: &ApiError) {
        let message = err.user_message(self.lang());
        self.add_toast(message, ToastType::Error);
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        const TOAST_DURATION: f32 = 5.0; // seconds
        const TOAST_FADE_OUT: f32 = 1.0;

        let now = std::time::Instant::now();
        self.toasts.retain(|toast| now.duration_since(toast.created_at).as_secs_f32() < TOAST_DURATION + TOAST_FADE_OUT);
        if self.toasts.is_empty() {
            return;
        }

        let screen_rect = ctx.screen_rect();
        let toast_width = 380.0;
        let toast_spacing = 10.0;
        let margin = 20.0;

        for (i, toast) in self.toasts.iter().enumerate() {
            let elapsed = now.duration_since(toast.created_at).as_secs_f32();
            let alpha = if elapsed > TOAST_DURATION {
                1.0 - ((elapsed - TOAST_DURATION) / TOAST_FADE_OUT)
            } else {
                1.0
            };
            if alpha <= 0.0 {
                continue;
            }

            // stacked upwards from the bottom-right corner
            let y_offset = margin + (i as f32 + 1.0) * (56.0 + toast_spacing);
            let pos = egui::pos2(screen_rect.right() - toast_width - margin, screen_rect.bottom() - y_offset);

            let text_color = Color32::from_rgba_unmultiplied(255, 255, 255, (255.0 * alpha) as u8);
            let (bg_color, text_color) = match toast.toast_type {
                ToastType::Info => (Color32::from_rgba_unmultiplied(60, 120, 180, (210.0 * alpha) as u8), text_color),
                ToastType::Success => (Color32::from_rgba_unmultiplied(60, 160, 80, (210.0 * alpha) as u8), text_color),
                ToastType::Warning => (
                    Color32::from_rgba_unmultiplied(220, 180, 60, (210.0 * alpha) as u8),
                    Color32::from_rgba_unmultiplied(40, 40, 40, (255.0 * alpha) as u8),
                ),
                ToastType::Error => (Color32::from_rgba_unmultiplied(190, 50, 60, (210.0 * alpha) as u8), text_color),
            };

            egui::Area::new(egui::Id::new(("toast", i)))
                .fixed_pos(pos)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(bg_color)
                        .rounding(8.0)
                        .inner_margin(egui::Margin::symmetric(16.0, 12.0))
                        .shadow(egui::epaint::Shadow {
                            extrusion: 8.0,
                            color: Color32::from_black_alpha((50.0 * alpha) as u8),
                        })
                        .show(ui, |ui| {
                            ui.set_max_width(toast_width - 32.0);
                            ui.style_mut().wrap = Some(true);
                            ui.label(RichText::new(&toast.message).color(text_color));
                        });
                });
        }
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn copy_to_clipboard(&mut self, text: String) {
        use arboard::Clipboard;
        let ok = Clipboard::new().and_then(|mut c| c.set_text(text)).is_ok();
        if ok {
            self.add_toast(self.tr("copied"), ToastType::Success);
        } else {
            self.add_toast(self.tr("clipboard_unavailable"), ToastType::Warning);
        }
    }

    fn can_manage_content(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.role.can_manage_content())
    }

    /// Texture for a poster or avatar reference, requesting it on first sight.
    fn texture_for(&mut self, reference: Option<&str>) -> Option<egui::TextureHandle> {
        let url = self.api.resolve_media_url(reference?)?;
        if let Some(tex) = self.images.texture(&url) {
            return Some(tex.clone());
        }
        self.images.request(&url, &self.api, &self.tx, &self.ctx);
        None
    }

    // ---- navigation ----

    fn navigate(&mut self, route: Route) {
        let route = if route.requires_login() && !self.session.is_logged_in() {
            self.after_login = Some(route);
            self.add_toast(self.tr("login_required"), ToastType::Warning);
            Route::Login
        } else {
            route
        };
        if route != self.route {
            self.history.push(self.route);
            if self.history.len() > 50 {
                self.history.remove(0);
            }
        }
        self.route = route;
        self.enter_route(route);
    }

    fn go_back(&mut self) {
        if let Some(prev) = self.history.pop() {
            self.route = prev;
            self.enter_route(prev);
        }
    }

    fn enter_route(&mut self, route: Route) {
        match route {
            Route::Home => {
                self.load_movies();
                self.load_top_users();
            }
            Route::Movies => self.load_movies(),
            Route::MovieDetails(id) => self.open_details(id),
            Route::Profile => {
                self.profile.editing = false;
                self.load_current_user();
            }
            Route::Users => self.load_users(self.users.page),
            Route::UserProfile(id) => self.load_user(id),
            Route::CreateMovie => self.movie_form = MovieFormView::default(),
            Route::EditMovie(id) => self.start_edit_movie(id),
            Route::Login => {
                self.login.error = None;
                self.login.busy = false;
            }
            Route::Register => self.register.error = None,
        }
    }

    // ---- shared queries ----

    fn load_movies(&mut self) {
        if self.movies_loading {
            return;
        }
        self.movies_loading = true;
        let catalog = self.catalog.clone();
        self.spawn(async move { Msg::MoviesLoaded(catalog.get_movies().await) });
    }

    /// Profile of the logged-in user from the query cache, fetching when stale.
    fn load_current_user(&mut self) {
        if !self.session.is_logged_in() {
            self.current_user = None;
            return;
        }
        if let Some(user) = self.user_cache.fresh(QueryKey::CurrentUser) {
            self.current_user = Some(user);
            return;
        }
        if self.user_loading {
            return;
        }
        self.user_loading = true;
        self.profile.load_error = None;
        let api = self.api.clone();
        let cache = self.user_cache.clone();
        self.spawn(async move {
            let result = api.current_user().await.map(|u| cache.store(QueryKey::CurrentUser, u));
            Msg::CurrentUserLoaded(result)
        });
    }

    fn refresh_current_user(&mut self) {
        self.user_cache.invalidate(QueryKey::CurrentUser);
        self.load_current_user();
    }

    fn after_logged_in(&mut self) {
        self.login.busy = false;
        self.login.password.clear();
        self.login.error = None;
        self.user_cache.clear();
        self.load_current_user();
        self.add_toast(self.tr("welcome_back"), ToastType::Success);
        let next = self.after_login.take().unwrap_or(Route::Home);
        self.navigate(next);
    }

    fn logout(&mut self) {
        self.api.logout();
        self.user_cache.clear();
        self.current_user = None;
        self.add_toast(self.tr("logged_out"), ToastType::Info);
        if self.route.requires_login() {
            self.navigate(Route::Home);
        } else if let Route::MovieDetails(id) = self.route {
            // access flags depend on who is asking
            self.open_details(id);
        }
    }

    // ---- messages ----

    fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::MoviesLoaded(result) => {
                self.movies_loading = false;
                self.movies_error = result.err();
            }
            Msg::CurrentUserLoaded(result) => {
                self.user_loading = false;
                match result {
                    Ok(user) => {
                        if !self.profile.editing {
                            self.profile.form = kinoclub_core::forms::ProfileForm::from_user(&user);
                        }
                        self.current_user = Some(user);
                    }
                    Err(e) if e.requires_login() => self.current_user = None,
                    Err(e) => {
                        self.toast_error(&e);
                        self.profile.load_error = Some(e);
                    }
                }
            }
            Msg::TopUsersLoaded(result) => self.home.top_users = Loadable::from_result(result),
            Msg::MovieLoaded { id, result } => {
                if self.movie_form.editing_id == Some(id) && self.movie_form.original.is_loading() {
                    if let Ok(movie) = &result {
                        self.movie_form.form = kinoclub_core::forms::MovieForm::from_movie(movie);
                    }
                    self.movie_form.original = Loadable::from_result(result.clone());
                }
                if let Some(d) = self.details.as_mut().filter(|d| d.movie_id == id) {
                    d.movie = Loadable::from_result(result);
                }
            }
            Msg::EpisodesLoaded { movie_id, result } => {
                if let Some(d) = self.details.as_mut().filter(|d| d.movie_id == movie_id) {
                    d.episodes = Loadable::from_result(result);
                }
            }
            Msg::CommentsLoaded { movie_id, result } => {
                if let Some(d) = self.details.as_mut().filter(|d| d.movie_id == movie_id) {
                    d.comments = Loadable::from_result(result);
                }
            }
            Msg::RepliesLoaded { movie_id, parent, result } => match result {
                Ok(replies) => self.on_comments_refreshed(movie_id, |list| details_panel::replace_replies(list, parent, replies)),
                Err(e) => self.toast_error(&e),
            },
            Msg::CommentLoaded { movie_id, result } => match result {
                Ok(comment) => self.on_comments_refreshed(movie_id, |list| details_panel::replace_comment(list, comment)),
                Err(e) => self.toast_error(&e),
            },
            Msg::EpisodeOpened { id, result } => self.on_episode_opened(id, result),
            Msg::UsersLoaded { page, result } => {
                if self.users.page == page {
                    self.users.list = Loadable::from_result(result);
                }
            }
            Msg::UserLoaded { id, result } => {
                if self.user_profile.id == id {
                    self.user_profile.user = Loadable::from_result(result);
                }
            }
            Msg::LoggedIn(result) => match result {
                Ok(()) => self.after_logged_in(),
                Err(e) => {
                    self.login.busy = false;
                    self.login.error = Some(e.user_message(self.lang()));
                }
            },
            Msg::OAuthFinished(result) => {
                self.login.oauth_cancel = None;
                self.pending_oauth = None;
                self.login.busy = false;
                match result {
                    Ok(token) => {
                        self.session.set_token(&token);
                        self.after_logged_in();
                    }
                    Err(ApiError::Cancelled) => self.add_toast(self.tr("oauth_cancelled"), ToastType::Info),
                    Err(e) => self.login.error = Some(e.user_message(self.lang())),
                }
            }
            Msg::Registered(result) => {
                self.register.busy = false;
                match result {
                    Ok(()) => {
                        self.login.email = self.register.form.email.trim().to_string();
                        self.register = RegisterView::default();
                        self.add_toast(self.tr("registered"), ToastType::Success);
                        self.navigate(Route::Login);
                    }
                    Err(e) => self.register.error = Some(e.user_message(self.lang())),
                }
            }
            Msg::Mutated { action, result } => self.on_mutated(action, result),
            Msg::MovieSaved { created, result } => {
                self.movie_form.saving = false;
                match result {
                    Ok(saved) => {
                        // the movie exists on the server from here on
                        self.catalog.invalidate();
                        self.load_movies();
                        let key = if created { "movie_created" } else { "movie_saved" };
                        self.add_toast(self.tr(key), ToastType::Success);
                        self.details = None;
                        match saved.media_error {
                            None => {
                                self.movie_form = MovieFormView::default();
                                self.navigate(Route::MovieDetails(saved.id));
                            }
                            Some(e) => {
                                // further saves patch this movie instead of creating another
                                if created {
                                    self.navigate(Route::EditMovie(saved.id));
                                } else {
                                    self.start_edit_movie(saved.id);
                                }
                                self.movie_form.error = Some(e.user_message(self.lang()));
                            }
                        }
                    }
                    Err(e) => self.movie_form.error = Some(e.user_message(self.lang())),
                }
            }
            Msg::ImageDecoded { url, rgba, w, h } => self.images.on_decoded(&self.ctx, url, rgba, w, h),
            Msg::ImageFailed { url } => self.images.on_failed(url),
        }
    }

    fn on_mutated(&mut self, action: Action, result: Result<(), ApiError>) {
        if let Some(d) = self.details.as_mut() {
            d.posting = false;
        }
        self.profile.saving = false;
        self.profile.uploading = None;

        if let Err(e) = result {
            self.toast_error(&e);
            return;
        }
        self.add_toast(self.tr(action.success_key()), ToastType::Success);

        match &action {
            Action::PostComment { .. } => {
                if let Some(d) = self.details.as_mut() {
                    d.comment_text.clear();
                    d.comment_rating = 5;
                    d.reply_to = None;
                    d.reply_text.clear();
                }
            }
            Action::EditComment { .. } => {
                if let Some(d) = self.details.as_mut() {
                    d.editing = None;
                }
            }
            Action::UpdateProfile => self.profile.editing = false,
            Action::DeleteMovie { id } if self.route == Route::MovieDetails(*id) => {
                self.details = None;
                self.history.retain(|r| *r != Route::MovieDetails(*id) && *r != Route::EditMovie(*id));
                self.route = Route::Movies;
            }
            _ => {}
        }

        if action.touches_catalog() {
            self.catalog.invalidate();
            self.load_movies();
        }
        if action.touches_current_user() {
            self.refresh_current_user();
        }
        if let Some(movie_id) = action.movie_id() {
            if self.details.as_ref().is_some_and(|d| d.movie_id == movie_id) {
                self.reload_episodes(movie_id);
                self.reload_comments(movie_id);
            }
        }
        if let Some((movie_id, refresh)) = action.comment_refresh() {
            if self.details.as_ref().is_some_and(|d| d.movie_id == movie_id) {
                self.refresh_comments(movie_id, refresh);
            }
        }
    }

    // ---- confirmations ----

    fn run_confirmed(&mut self, confirm: Confirm) {
        let api = self.api.clone();
        match confirm {
            Confirm::PurchaseEpisode(ep) => {
                let movie_id = ep.movie_id;
                self.spawn(async move {
                    Msg::Mutated { action: Action::PurchaseEpisode { movie_id }, result: api.purchase_episode(ep.id).await }
                });
            }
            Confirm::PurchasePremium(months) => {
                let order = match PremiumOrder::new(months) {
                    Ok(o) => o,
                    Err(e) => {
                        self.add_toast(e.user_message(self.lang()), ToastType::Warning);
                        return;
                    }
                };
                self.spawn(async move {
                    let result = api.purchase_premium(&order).await.map(|receipt| {
                        info!("premium receipt: {}", receipt.message);
                    });
                    Msg::Mutated { action: Action::PurchasePremium { months }, result }
                });
            }
            Confirm::DeleteMovie { id, .. } => {
                self.spawn(async move { Msg::Mutated { action: Action::DeleteMovie { id }, result: api.delete_movie(id).await } });
            }
            Confirm::DeleteComment { movie_id, id } => {
                self.spawn(async move {
                    Msg::Mutated { action: Action::DeleteComment { movie_id }, result: api.delete_comment(id).await }
                });
            }
        }
    }

    fn render_confirm(&mut self, ctx: &egui::Context) {
        let Some(confirm) = self.confirm.clone() else { return };
        let lang = self.lang();
        let (title, body) = match &confirm {
            Confirm::PurchaseEpisode(ep) => (
                t("confirm_purchase", lang),
                format!("{} «{}»: {}", t("buy_episode_question", lang), ep.title, format_coins(ep.cost, lang)),
            ),
            Confirm::PurchasePremium(months) => {
                let price = PremiumOrder::new(*months).map(|o| o.total_price_rub()).unwrap_or(0);
                (
                    t("confirm_purchase", lang),
                    format!("{} {} {}: {} ₽", t("buy_premium_question", lang), months, t("months", lang), price),
                )
            }
            Confirm::DeleteMovie { title, .. } => (t("confirm_delete", lang), format!("{} «{}»?", t("delete_movie_question", lang), title)),
            Confirm::DeleteComment { .. } => (t("confirm_delete", lang), t("delete_comment_question", lang)),
        };

        let mut decision = None;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .default_width(360.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(body);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(RichText::new(t("confirm", lang)).strong()).clicked() {
                        decision = Some(true);
                    }
                    if ui.button(t("cancel", lang)).clicked() {
                        decision = Some(false);
                    }
                });
            });
        match decision {
            Some(true) => {
                self.confirm = None;
                self.run_confirmed(confirm);
            }
            Some(false) => self.confirm = None,
            None => {}
        }
    }

    // ---- settings ----

    fn render_config(&mut self, ctx: &egui::Context) {
        if !self.show_config {
            return;
        }
        let lang = self.lang();
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        egui::Window::new(t("settings", lang))
            .collapsible(false)
            .resizable(true)
            .default_width(520.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                let d = &mut self.config_draft;
                egui::Grid::new("config_grid").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
                    ui.label(t("api_url", lang));
                    ui.add(egui::TextEdit::singleline(&mut d.api_base_url).desired_width(340.0));
                    ui.end_row();
                    ui.label(t("request_timeout", lang));
                    ui.add(egui::DragValue::new(&mut d.request_timeout_secs).clamp_range(1..=300).suffix(" s"));
                    ui.end_row();
                    ui.label(t("oauth_timeout", lang));
                    ui.add(egui::DragValue::new(&mut d.oauth_timeout_secs).clamp_range(10..=900).suffix(" s"));
                    ui.end_row();
                    ui.label(t("oauth_port", lang));
                    ui.add(egui::DragValue::new(&mut d.oauth_callback_port).clamp_range(0..=65535));
                    ui.end_row();
                    ui.label(t("player_command", lang));
                    ui.add(egui::TextEdit::singleline(&mut d.player_command).desired_width(340.0));
                    ui.end_row();
                    ui.label(t("theme", lang));
                    egui::ComboBox::from_id_source("theme_combo")
                        .selected_text(t(&format!("theme_{}", d.theme), lang))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut d.theme, "dark".to_string(), t("theme_dark", lang));
                            ui.selectable_value(&mut d.theme, "light".to_string(), t("theme_light", lang));
                        });
                    ui.end_row();
                    ui.label(t("font_scale", lang));
                    ui.add(egui::Slider::new(&mut d.font_scale, 0.6..=2.0).step_by(0.05));
                    ui.end_row();
                    ui.label(t("language", lang));
                    egui::ComboBox::from_id_source("lang_combo")
                        .selected_text(language_name(d.language))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut d.language, Language::English, language_name(Language::English));
                            ui.selectable_value(&mut d.language, Language::Russian, language_name(Language::Russian));
                        });
                    ui.end_row();
                });
                if std::env::var(config::API_URL_ENV).is_ok() {
                    ui.small(format!("{} {}", config::API_URL_ENV, t("env_override_active", lang)));
                }
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button(t("save", lang)).clicked() {
                        save = true;
                    }
                    if ui.button(t("cancel", lang)).clicked() {
                        cancel = true;
                    }
                });
            });
        if save {
            self.apply_config();
        } else if cancel || !open {
            self.config_draft = self.config.clone();
            self.show_config = false;
        }
    }

    fn apply_config(&mut self) {
        let draft = self.config_draft.clone();
        let endpoint_changed =
            draft.api_base_url != self.config.api_base_url || draft.request_timeout_secs != self.config.request_timeout_secs;
        if draft.theme != self.config.theme {
            self.theme_applied = false;
        }
        if draft.font_scale != self.config.font_scale {
            self.font_scale_applied = false;
        }
        if endpoint_changed {
            match build_client(&draft, self.session.clone()) {
                Ok(api) => {
                    info!("API endpoint now {}", api.base_url());
                    self.catalog = Arc::new(Catalog::new(api.clone()));
                    self.api = api;
                    self.user_cache.clear();
                    self.images.clear_failed();
                    self.movies_loading = false;
                    self.load_current_user();
                    self.enter_route(self.route);
                }
                Err(e) => {
                    self.toast_error(&e);
                    return;
                }
            }
        }
        self.config = draft;
        match save_config(&self.config) {
            Ok(()) => self.add_toast(self.tr("settings_saved"), ToastType::Success),
            Err(e) => {
                error!("cannot save config: {}", e);
                self.add_toast(format!("{}: {}", self.tr("settings_not_saved"), e), ToastType::Error);
            }
        }
        self.show_config = false;
    }

    fn apply_style(&mut self, ctx: &egui::Context) {
        if !self.theme_applied {
            match self.config.theme.as_str() {
                "light" => ctx.set_visuals(egui::Visuals::light()),
                _ => ctx.set_visuals(egui::Visuals::dark()),
            }
            self.theme_applied = true;
            // set_visuals keeps text sizes, but be safe after a theme swap
            self.font_scale_applied = false;
        }
        if !self.font_scale_applied {
            let mut style = egui::Style::default();
            style.visuals = ctx.style().visuals.clone();
            let scale = self.config.font_scale.clamp(0.6, 2.0);
            style.text_styles.iter_mut().for_each(|(_, ts)| {
                ts.size *= scale;
            });
            ctx.set_style(style);
            self.font_scale_applied = true;
        }
    }

    // ---- chrome ----

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let lang = self.lang();
        let mut nav = None;
        let mut back = false;
        let mut logout = false;
        let can_manage = self.can_manage_content();
        let user = self.current_user.clone();
        let logged_in = self.session.is_logged_in();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.add_enabled(!self.history.is_empty(), egui::Button::new("⬅")).on_hover_text(t("back", lang)).clicked() {
                    back = true;
                }
                ui.label(RichText::new("🎬 KinoClub").heading().strong().color(Color32::from_rgb(220, 60, 80)));
                ui.separator();
                for (route, key) in [(Route::Home, "home"), (Route::Movies, "movies"), (Route::Users, "users")] {
                    if ui.selectable_label(self.route == route, t(key, lang)).clicked() {
                        nav = Some(route);
                    }
                }
                if can_manage && ui.selectable_label(self.route == Route::CreateMovie, t("add_movie", lang)).clicked() {
                    nav = Some(Route::CreateMovie);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙").on_hover_text(t("settings", lang)).clicked() {
                        self.config_draft = self.config.clone();
                        self.show_config = true;
                    }
                    if logged_in {
                        if ui.button(t("logout", lang)).clicked() {
                            logout = true;
                        }
                        match &user {
                            Some(u) => {
                                let label = format!("👤 {}", u.display_name());
                                if ui.selectable_label(self.route == Route::Profile, label).clicked() {
                                    nav = Some(Route::Profile);
                                }
                                ui.label(RichText::new(format!("🪙 {}", format_coins(u.money, lang))).weak());
                                if u.is_premium {
                                    ui_helpers::premium_badge(ui, lang);
                                }
                            }
                            None => {
                                ui.spinner();
                            }
                        }
                    } else {
                        if ui.button(t("register", lang)).clicked() {
                            nav = Some(Route::Register);
                        }
                        if ui.button(t("login", lang)).clicked() {
                            nav = Some(Route::Login);
                        }
                    }
                });
            });
            ui.add_space(4.0);
        });

        if back {
            self.go_back();
        }
        if logout {
            self.logout();
        }
        if let Some(route) = nav {
            self.navigate(route);
        }
    }

    fn render_route(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        if self.route.requires_content_role() && self.current_user.is_some() && !self.can_manage_content() {
            ui.add_space(40.0);
            ui.vertical_centered(|ui| {
                ui.heading(t("forbidden_page", lang));
            });
            return;
        }
        match self.route {
            Route::Home => self.home_panel(ui),
            Route::Movies => self.movies_panel(ui),
            Route::MovieDetails(_) => self.details_panel(ui),
            Route::Login => self.login_panel(ui),
            Route::Register => self.register_panel(ui),
            Route::Profile => self.profile_panel(ui),
            Route::Users => self.users_panel(ui),
            Route::UserProfile(_) => self.user_profile_panel(ui),
            Route::CreateMovie | Route::EditMovie(_) => self.movie_form_panel(ui),
        }
    }
}

fn language_name(lang: Language) -> &'static str {
    match lang {
        Language::English => "English",
        Language::Russian => "Русский",
    }
}

impl eframe::App for KinoClub {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_style(ctx);

        // bounded so a burst of image results cannot stall a frame
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_msg(msg);
            handled += 1;
            if handled >= 32 {
                ctx.request_repaint();
                break;
            }
        }

        self.poll_oauth_handle();
        if self.session.take_expired_signal() {
            self.user_cache.clear();
            self.current_user = None;
            self.add_toast(self.tr("session_expired"), ToastType::Warning);
            if self.route != Route::Login {
                self.after_login = Some(self.route);
                self.navigate(Route::Login);
            }
        }

        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_source(("page", self.route_id()))
                .auto_shrink([false; 2])
                .show(ui, |ui| self.render_route(ui));
        });
        if let Some(route) = self.pending_nav.take() {
            self.navigate(route);
        }

        self.render_confirm(ctx);
        self.render_config(ctx);
        self.render_toasts(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(cancel) = self.login.oauth_cancel.take() {
            cancel.cancel();
        }
        info!("KinoClub closed");
    }
}

impl KinoClub {
    /// Keeps one scroll position per page.
    fn route_id(&self) -> String {
        format!("{:?}", self.route)
    }
}
