use eframe::egui::{self, Color32, RichText};
use kinoclub_core::forms::{CommentPatch, NewComment};
use kinoclub_core::{ApiError, Backdrop, Comment, Episode, EpisodeDetail, Movie};
use tracing::info;

use crate::app_state::{Action, CommentEdit, CommentRefresh, Confirm, DetailsView, Loadable, Msg, Route};
use crate::helpers::{format_coins, format_date, format_runtime, format_timestamp};
use crate::i18n::t;
use crate::player;
use crate::ui_helpers::{
    error_banner, image_or_placeholder, initials, loading_row, premium_badge, rating_label, rating_picker,
};
use crate::{KinoClub, ToastType};

/// What the user clicked while a comment was on screen.
enum CommentAction {
    Reply(i64),
    Edit(CommentEdit),
    Delete(i64),
    SaveEdit(Comment),
    CancelEdit,
    SendReply(i64),
}

/// Only changed fields go out; nothing changed is an error.
pub fn comment_patch(original: &Comment, edit: &CommentEdit) -> Result<CommentPatch, kinoclub_core::forms::FormError> {
    let content = edit.content.trim();
    let patch = CommentPatch {
        content: (content != original.content).then(|| content.to_string()),
        rating: (original.rating != Some(edit.rating)).then_some(edit.rating),
    };
    patch.validate()?;
    Ok(patch)
}

/// Swaps in a fresh reply list for one thread. False when the parent is gone.
pub fn replace_replies(comments: &mut [Comment], parent: i64, replies: Vec<Comment>) -> bool {
    match comments.iter_mut().find(|c| c.id == parent) {
        Some(root) => {
            root.replies = replies;
            true
        }
        None => false,
    }
}

/// Swaps in a re-fetched comment wherever it sits. A top-level comment keeps
/// the replies already on screen.
pub fn replace_comment(comments: &mut [Comment], mut updated: Comment) -> bool {
    for root in comments.iter_mut() {
        if root.id == updated.id {
            updated.replies = std::mem::take(&mut root.replies);
            *root = updated;
            return true;
        }
        if let Some(reply) = root.replies.iter_mut().find(|r| r.id == updated.id) {
            updated.replies.clear();
            *reply = updated;
            return true;
        }
    }
    false
}

impl KinoClub {
    pub(crate) fn open_details(&mut self, id: i64) {
        self.details = Some(DetailsView::new(id));
        let api = self.api.clone();
        self.spawn(async move { Msg::MovieLoaded { id, result: api.get_movie(id).await } });
        self.reload_episodes(id);
        self.reload_comments(id);
    }

    pub(crate) fn reload_episodes(&mut self, movie_id: i64) {
        let api = self.api.clone();
        self.spawn(async move { Msg::EpisodesLoaded { movie_id, result: api.list_episodes(movie_id).await } });
    }

    pub(crate) fn reload_comments(&mut self, movie_id: i64) {
        let api = self.api.clone();
        self.spawn(async move { Msg::CommentsLoaded { movie_id, result: api.list_comments(movie_id).await } });
    }

    pub(crate) fn refresh_comments(&mut self, movie_id: i64, refresh: CommentRefresh) {
        let api = self.api.clone();
        match refresh {
            CommentRefresh::Replies(parent) => self.spawn(async move {
                Msg::RepliesLoaded { movie_id, parent, result: api.comment_replies(parent).await }
            }),
            CommentRefresh::Single(id) => {
                self.spawn(async move { Msg::CommentLoaded { movie_id, result: api.get_comment(id).await } })
            }
        }
    }

    /// Merges a partial comment reload; falls back to a full reload when the
    /// thread it belongs to is no longer on screen.
    pub(crate) fn on_comments_refreshed(&mut self, movie_id: i64, merge: impl FnOnce(&mut Vec<Comment>) -> bool) {
        let Some(d) = self.details.as_mut().filter(|d| d.movie_id == movie_id) else { return };
        let merged = match &mut d.comments {
            Loadable::Ready(list) => merge(list),
            _ => false,
        };
        if !merged {
            self.reload_comments(movie_id);
        }
    }

    fn open_episode(&mut self, episode: &Episode) {
        if let Some(d) = self.details.as_mut() {
            d.opening = Some(episode.id);
        }
        let api = self.api.clone();
        let id = episode.id;
        self.spawn(async move { Msg::EpisodeOpened { id, result: api.get_episode(id).await } });
    }

    pub(crate) fn on_episode_opened(&mut self, id: i64, result: Result<EpisodeDetail, ApiError>) {
        if let Some(d) = self.details.as_mut().filter(|d| d.opening == Some(id)) {
            d.opening = None;
        }
        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                self.toast_error(&e);
                return;
            }
        };
        let Some(url) = detail.video_file.as_deref().and_then(|f| self.api.resolve_media_url(f)) else {
            self.add_toast(self.tr("no_video_file"), ToastType::Warning);
            return;
        };
        info!(episode = id, "playing {}", url);
        match player::start_player(&self.config, &url) {
            Ok(()) => self.add_toast(format!("▶ {}", detail.episode.title), ToastType::Info),
            Err(e) => self.add_toast(format!("{}: {}", self.tr("player_failed"), e), ToastType::Error),
        }
    }

    pub(crate) fn details_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let Some(movie_id) = self.details.as_ref().map(|d| d.movie_id) else { return };
        let movie = self.details.as_ref().map(|d| d.movie.clone()).unwrap_or_default();
        match movie {
            Loadable::Ready(movie) => self.movie_header(ui, &movie),
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.open_details(movie_id);
                }
                return;
            }
            Loadable::Loading | Loadable::Idle => {
                loading_row(ui, lang);
                return;
            }
        }
        ui.add_space(10.0);
        ui.separator();
        self.episodes_section(ui, movie_id);
        ui.add_space(10.0);
        ui.separator();
        self.comments_section(ui, movie_id);
    }

    fn movie_header(&mut self, ui: &mut egui::Ui, movie: &Movie) {
        let lang = self.lang();
        let backdrop = movie.backdrop_kind();
        if let Backdrop::Image(reference) = &backdrop {
            if let Some(tex) = self.texture_for(Some(reference)) {
                let width = ui.available_width();
                let aspect = tex.size_vec2().y / tex.size_vec2().x.max(1.0);
                ui.add(egui::Image::new(&tex).fit_to_exact_size(egui::vec2(width, (width * aspect).min(320.0))).rounding(8.0));
                ui.add_space(8.0);
            }
        }

        let poster = self.texture_for(movie.poster.as_deref());
        let can_manage = self.can_manage_content();
        ui.horizontal_top(|ui| {
            image_or_placeholder(ui, poster.as_ref(), egui::vec2(220.0, 330.0), "🎬");
            ui.add_space(12.0);
            ui.vertical(|ui| {
                ui.heading(RichText::new(&movie.title).size(28.0).strong());
                if !movie.original_title.is_empty() && movie.original_title != movie.title {
                    ui.label(RichText::new(&movie.original_title).italics().weak());
                }
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    rating_label(ui, movie.rating);
                    ui.separator();
                    ui.label(format_date(movie.release_date));
                    if movie.duration_minutes > 0 {
                        ui.separator();
                        ui.label(format_runtime(movie.duration_minutes, lang));
                    }
                });
                if !movie.director.is_empty() {
                    ui.label(format!("{}: {}", t("director", lang), movie.director));
                }
                ui.horizontal_wrapped(|ui| {
                    for genre in &movie.genres {
                        ui.label(RichText::new(genre.as_str()).small().background_color(ui.visuals().faint_bg_color));
                    }
                });
                ui.add_space(6.0);
                ui.label(&movie.description);
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    let trailer = match &backdrop {
                        Backdrop::Video(embed) => Some(embed.clone()),
                        _ => movie.trailer(),
                    };
                    if let Some(embed) = trailer {
                        let label = format!("▶ {} ({})", t("trailer", lang), embed.provider());
                        if ui.button(label).clicked() {
                            if let Err(e) = player::open_in_browser(&embed.watch_url()) {
                                self.add_toast(format!("{}: {}", t("browser_failed", lang), e), ToastType::Error);
                            }
                        }
                        if ui.button(t("copy_link", lang)).clicked() {
                            self.copy_to_clipboard(embed.watch_url());
                        }
                    } else if let Some(url) = &movie.movie_url {
                        if ui.button(t("copy_link", lang)).clicked() {
                            self.copy_to_clipboard(url.clone());
                        }
                    }
                    if can_manage {
                        ui.separator();
                        if ui.button(t("edit", lang)).clicked() {
                            self.pending_nav = Some(Route::EditMovie(movie.id));
                        }
                        if ui.button(RichText::new(t("delete", lang)).color(Color32::from_rgb(220, 80, 80))).clicked() {
                            self.confirm = Some(Confirm::DeleteMovie { id: movie.id, title: movie.title.clone() });
                        }
                    }
                });
            });
        });
    }

    fn episodes_section(&mut self, ui: &mut egui::Ui, movie_id: i64) {
        let lang = self.lang();
        ui.label(RichText::new(t("episodes", lang)).heading());
        let (episodes, opening) = match self.details.as_ref() {
            Some(d) => (d.episodes.clone(), d.opening),
            None => return,
        };
        let episodes = match episodes {
            Loadable::Ready(list) => list,
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.reload_episodes(movie_id);
                }
                return;
            }
            Loadable::Loading | Loadable::Idle => {
                loading_row(ui, lang);
                return;
            }
        };
        if episodes.is_empty() {
            ui.label(RichText::new(t("no_episodes", lang)).weak());
            return;
        }

        let user = self.current_user.clone();
        let logged_in = self.session.is_logged_in();
        let mut watch = None;
        let mut buy = None;
        let mut login = false;
        egui::Grid::new(("episodes", movie_id)).num_columns(4).striped(true).spacing([16.0, 6.0]).show(ui, |ui| {
            for ep in &episodes {
                ui.label(RichText::new(format!("{} {}", t("episode", lang), ep.number)).strong());
                ui.label(&ep.title);
                if ep.cost > 0 {
                    ui.label(format!("🪙 {}", format_coins(ep.cost, lang)));
                } else {
                    ui.label(RichText::new(t("free", lang)).color(Color32::from_rgb(80, 190, 100)));
                }
                if ep.is_accessible_by(user.as_deref()) {
                    if opening == Some(ep.id) {
                        ui.spinner();
                    } else if ui.button(t("watch", lang)).clicked() {
                        watch = Some(ep.clone());
                    }
                } else if !logged_in {
                    if ui.button(t("login_to_watch", lang)).clicked() {
                        login = true;
                    }
                } else {
                    let affordable = user.as_deref().is_some_and(|u| ep.affordable_by(u));
                    let button = ui
                        .add_enabled(affordable, egui::Button::new(format!("🔒 {}", t("buy", lang))))
                        .on_disabled_hover_text(t("not_enough_coins", lang));
                    if button.clicked() {
                        buy = Some(ep.clone());
                    }
                }
                ui.end_row();
            }
        });

        if let Some(ep) = watch {
            self.open_episode(&ep);
        }
        if let Some(ep) = buy {
            self.confirm = Some(Confirm::PurchaseEpisode(ep));
        }
        if login {
            self.after_login = Some(Route::MovieDetails(movie_id));
            self.pending_nav = Some(Route::Login);
        }
    }

    fn comments_section(&mut self, ui: &mut egui::Ui, movie_id: i64) {
        let lang = self.lang();
        let comments = match self.details.as_ref().map(|d| d.comments.clone()) {
            Some(Loadable::Ready(list)) => list,
            Some(Loadable::Failed(e)) => {
                ui.label(RichText::new(t("comments", lang)).heading());
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.reload_comments(movie_id);
                }
                return;
            }
            Some(_) => {
                ui.label(RichText::new(t("comments", lang)).heading());
                loading_row(ui, lang);
                return;
            }
            None => return,
        };
        let total: usize = comments.iter().map(|c| 1 + c.replies.len()).sum();
        ui.label(RichText::new(format!("{} ({})", t("comments", lang), total)).heading());

        if self.session.is_logged_in() {
            self.new_comment_form(ui, movie_id);
        } else if ui.link(t("login_to_comment", lang)).clicked() {
            self.after_login = Some(Route::MovieDetails(movie_id));
            self.pending_nav = Some(Route::Login);
        }
        ui.add_space(8.0);
        if comments.is_empty() {
            ui.label(RichText::new(t("no_comments", lang)).weak());
        }

        let mut actions = Vec::new();
        for comment in &comments {
            self.comment_row(ui, comment, false, &mut actions);
            ui.indent(("replies", comment.id), |ui| {
                for reply in &comment.replies {
                    self.comment_row(ui, reply, true, &mut actions);
                }
            });
            ui.separator();
        }
        for action in actions {
            self.apply_comment_action(action, movie_id);
        }
    }

    fn new_comment_form(&mut self, ui: &mut egui::Ui, movie_id: i64) {
        let lang = self.lang();
        let Some(d) = self.details.as_mut() else { return };
        let mut send = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut d.comment_text)
                    .hint_text(t("comment_hint", lang))
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            ui.horizontal(|ui| {
                ui.label(t("your_rating", lang));
                rating_picker(ui, &mut d.comment_rating);
                if d.posting {
                    ui.spinner();
                } else if ui.button(t("post_comment", lang)).clicked() {
                    send = true;
                }
            });
        });
        if send {
            let (text, rating) = (d.comment_text.clone(), d.comment_rating);
            self.post_comment(movie_id, &text, rating, None);
        }
    }

    fn post_comment(&mut self, movie_id: i64, text: &str, rating: u8, parent: Option<i64>) {
        let comment = match NewComment::new(movie_id, text, rating, parent) {
            Ok(c) => c,
            Err(e) => {
                self.add_toast(e.user_message(self.lang()), ToastType::Warning);
                return;
            }
        };
        if let Some(d) = self.details.as_mut() {
            d.posting = true;
        }
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.create_comment(&comment).await.map(|_| ());
            Msg::Mutated { action: Action::PostComment { movie_id, parent }, result }
        });
    }

    fn comment_row(&mut self, ui: &mut egui::Ui, comment: &Comment, is_reply: bool, actions: &mut Vec<CommentAction>) {
        let lang = self.lang();
        let avatar = self.texture_for(comment.author.photo.as_deref());
        let me = self.current_user.as_ref().map(|u| u.id);
        let can_moderate = self.can_manage_content();
        let logged_in = self.session.is_logged_in();
        let Some(d) = self.details.as_mut() else { return };

        ui.horizontal_top(|ui| {
            let name = if comment.author.username.is_empty() { "?".to_string() } else { comment.author.username.clone() };
            image_or_placeholder(ui, avatar.as_ref(), egui::vec2(36.0, 36.0), &initials(&name));
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&name).strong());
                    if comment.author.is_premium {
                        premium_badge(ui, lang);
                    }
                    if !comment.author.title.is_empty() {
                        ui.label(RichText::new(&comment.author.title).italics().weak());
                    }
                    if let Some(r) = comment.rating {
                        rating_label(ui, r as f32);
                    }
                    ui.label(RichText::new(format_timestamp(comment.created_at)).small().weak());
                });

                match d.editing.as_mut().filter(|e| e.id == comment.id) {
                    Some(edit) => {
                        ui.add(egui::TextEdit::multiline(&mut edit.content).desired_rows(2).desired_width(f32::INFINITY));
                        rating_picker(ui, &mut edit.rating);
                        ui.horizontal(|ui| {
                            if ui.button(t("save", lang)).clicked() {
                                actions.push(CommentAction::SaveEdit(comment.clone()));
                            }
                            if ui.button(t("cancel", lang)).clicked() {
                                actions.push(CommentAction::CancelEdit);
                            }
                        });
                    }
                    None => {
                        ui.label(&comment.content);
                    }
                }

                ui.horizontal(|ui| {
                    if !is_reply && logged_in && ui.small_button(t("reply", lang)).clicked() {
                        actions.push(CommentAction::Reply(comment.id));
                    }
                    let own = me == Some(comment.user_id);
                    if own && ui.small_button(t("edit", lang)).clicked() {
                        actions.push(CommentAction::Edit(CommentEdit {
                            id: comment.id,
                            content: comment.content.clone(),
                            rating: comment.rating.unwrap_or(5),
                        }));
                    }
                    if (own || can_moderate) && ui.small_button(t("delete", lang)).clicked() {
                        actions.push(CommentAction::Delete(comment.id));
                    }
                });

                if d.reply_to == Some(comment.id) {
                    ui.add(
                        egui::TextEdit::multiline(&mut d.reply_text)
                            .hint_text(t("reply_hint", lang))
                            .desired_rows(2)
                            .desired_width(f32::INFINITY),
                    );
                    ui.horizontal(|ui| {
                        rating_picker(ui, &mut d.comment_rating);
                        if ui.button(t("send", lang)).clicked() {
                            actions.push(CommentAction::SendReply(comment.id));
                        }
                        if ui.button(t("cancel", lang)).clicked() {
                            actions.push(CommentAction::Reply(comment.id));
                        }
                    });
                }
            });
        });
        ui.add_space(4.0);
    }

    fn apply_comment_action(&mut self, action: CommentAction, movie_id: i64) {
        let lang = self.lang();
        match action {
            CommentAction::Reply(id) => {
                if let Some(d) = self.details.as_mut() {
                    // clicking again closes the reply box
                    d.reply_to = if d.reply_to == Some(id) { None } else { Some(id) };
                    d.reply_text.clear();
                }
            }
            CommentAction::Edit(edit) => {
                if let Some(d) = self.details.as_mut() {
                    d.editing = Some(edit);
                }
            }
            CommentAction::CancelEdit => {
                if let Some(d) = self.details.as_mut() {
                    d.editing = None;
                }
            }
            CommentAction::Delete(id) => self.confirm = Some(Confirm::DeleteComment { movie_id, id }),
            CommentAction::SaveEdit(original) => {
                let Some(edit) = self.details.as_ref().and_then(|d| d.editing.clone()) else { return };
                let patch = match comment_patch(&original, &edit) {
                    Ok(p) => p,
                    Err(e) => {
                        self.add_toast(e.user_message(lang), ToastType::Warning);
                        return;
                    }
                };
                let api = self.api.clone();
                let id = edit.id;
                self.spawn(async move {
                    let result = api.update_comment(id, &patch).await.map(|_| ());
                    Msg::Mutated { action: Action::EditComment { movie_id, id }, result }
                });
            }
            CommentAction::SendReply(parent) => {
                let Some((text, rating)) = self.details.as_ref().map(|d| (d.reply_text.clone(), d.comment_rating)) else {
                    return;
                };
                self.post_comment(movie_id, &text, rating, Some(parent));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinoclub_core::forms::FormError;
    use kinoclub_core::CommentAuthor;

    fn comment() -> Comment {
        Comment {
            id: 4,
            content: "Отличный фильм".into(),
            rating: Some(8),
            movie_id: 1,
            parent_id: None,
            user_id: 2,
            author: CommentAuthor::default(),
            created_at: None,
            replies: Vec::new(),
        }
    }

    #[test]
    fn patch_carries_only_changed_fields() {
        let edit = CommentEdit { id: 4, content: "Отличный фильм".into(), rating: 9 };
        let patch = comment_patch(&comment(), &edit).unwrap();
        assert_eq!(patch.content, None);
        assert_eq!(patch.rating, Some(9));

        let edit = CommentEdit { id: 4, content: "  Так себе  ".into(), rating: 8 };
        let patch = comment_patch(&comment(), &edit).unwrap();
        assert_eq!(patch.content.as_deref(), Some("Так себе"));
        assert_eq!(patch.rating, None);
    }

    #[test]
    fn unchanged_or_blank_edit_is_rejected() {
        let same = CommentEdit { id: 4, content: "Отличный фильм ".into(), rating: 8 };
        assert_eq!(comment_patch(&comment(), &same), Err(FormError::NoChanges));
        let blank = CommentEdit { id: 4, content: "   ".into(), rating: 8 };
        assert_eq!(comment_patch(&comment(), &blank), Err(FormError::EmptyComment));
    }

    fn reply(id: i64, parent: i64, content: &str) -> Comment {
        Comment { id, parent_id: Some(parent), content: content.into(), ..comment() }
    }

    #[test]
    fn fresh_replies_replace_one_thread() {
        let mut other = comment();
        other.id = 10;
        other.replies = vec![reply(11, 10, "keep")];
        let mut list = vec![comment(), other];
        assert!(replace_replies(&mut list, 4, vec![reply(5, 4, "new")]));
        assert_eq!(list[0].replies.len(), 1);
        assert_eq!(list[0].replies[0].id, 5);
        assert_eq!(list[1].replies[0].content, "keep");
        assert!(!replace_replies(&mut list, 99, Vec::new()));
    }

    #[test]
    fn refetched_comment_is_swapped_in_place() {
        let mut root = comment();
        root.replies = vec![reply(5, 4, "old reply")];
        let mut list = vec![root];

        let mut edited_root = comment();
        edited_root.content = "Пересмотрел".into();
        assert!(replace_comment(&mut list, edited_root));
        assert_eq!(list[0].content, "Пересмотрел");
        assert_eq!(list[0].replies.len(), 1);

        assert!(replace_comment(&mut list, reply(5, 4, "edited reply")));
        assert_eq!(list[0].replies[0].content, "edited reply");

        assert!(!replace_comment(&mut list, reply(42, 4, "missing")));
    }
}
