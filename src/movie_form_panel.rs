use eframe::egui::{self, Color32, RichText};
use kinoclub_core::forms::{MovieForm, MoviePatch, DEFAULT_GENRES};
use kinoclub_core::upload::{MovieMedia, UploadFile};
use kinoclub_core::{ApiClient, ApiError, Movie, VideoEmbed};
use tracing::warn;

use crate::app_state::{Loadable, Msg, Route, SavedMovie};
use crate::helpers::format_file_size;
use crate::i18n::t;
use crate::profile_panel::pick_image;
use crate::ui_helpers::{error_banner, loading_row};
use crate::{KinoClub, ToastType};

/// Genre buttons: the stock list first, then whatever the form already holds.
pub fn genre_choices(selected: &[String]) -> Vec<String> {
    let mut out: Vec<String> = DEFAULT_GENRES.iter().map(|g| g.to_string()).collect();
    for g in selected {
        if !out.contains(g) {
            out.push(g.clone());
        }
    }
    out
}

/// Creates or patches the movie, then sends the chosen images. Errors before
/// the movie is stored fail the whole save; upload errors after that are
/// reported alongside the id.
async fn save_movie(
    api: ApiClient,
    original: Option<Movie>,
    form: MovieForm,
    poster: Option<UploadFile>,
    backdrop: Option<UploadFile>,
) -> Result<SavedMovie, ApiError> {
    let draft = form.to_draft().map_err(|e| ApiError::Validation(e.to_string()))?;
    let id = match &original {
        Some(movie) => {
            let patch = MoviePatch::diff(movie, &draft);
            if !patch.is_empty() {
                api.update_movie(movie.id, &patch).await?;
            }
            movie.id
        }
        None => api.create_movie(&draft).await?.id,
    };
    for (kind, file) in [(MovieMedia::Poster, poster), (MovieMedia::Backdrop, backdrop)] {
        if let Some(file) = file {
            if let Err(e) = api.upload_movie_media(id, kind, file).await {
                warn!(movie = id, "{} upload failed: {}", kind.path_segment(), e);
                return Ok(SavedMovie { id, media_error: Some(e) });
            }
        }
    }
    Ok(SavedMovie { id, media_error: None })
}

impl KinoClub {
    pub(crate) fn start_edit_movie(&mut self, id: i64) {
        self.movie_form = Default::default();
        self.movie_form.editing_id = Some(id);
        self.movie_form.original = Loadable::Loading;
        let api = self.api.clone();
        self.spawn(async move { Msg::MovieLoaded { id, result: api.get_movie(id).await } });
    }

    fn submit_movie_form(&mut self) {
        let lang = self.lang();
        let v = &mut self.movie_form;
        if let Err(e) = v.form.to_draft() {
            v.error = Some(e.user_message(lang));
            return;
        }
        let original = match (&v.editing_id, &v.original) {
            (Some(_), Loadable::Ready(movie)) => Some(movie.clone()),
            (Some(_), _) => return,
            (None, _) => None,
        };
        if let Some(movie) = &original {
            let unchanged = v.form.to_draft().map(|d| MoviePatch::diff(movie, &d).is_empty()).unwrap_or(false);
            if unchanged && v.poster.is_none() && v.backdrop.is_none() {
                v.error = Some(kinoclub_core::forms::FormError::NoChanges.user_message(lang));
                return;
            }
        }
        v.saving = true;
        v.error = None;
        let created = original.is_none();
        let (form, poster, backdrop) = (v.form.clone(), v.poster.clone(), v.backdrop.clone());
        let api = self.api.clone();
        self.spawn(async move { Msg::MovieSaved { created, result: save_movie(api, original, form, poster, backdrop).await } });
    }

    fn choose_movie_media(&mut self, kind: MovieMedia) {
        match pick_image(self.lang()) {
            None => {}
            Some(Ok(file)) => self.movie_form.set_media(kind, file),
            Some(Err(msg)) => self.add_toast(msg, ToastType::Warning),
        }
    }

    pub(crate) fn movie_form_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let editing = self.movie_form.editing_id;
        match (&self.movie_form.original, editing) {
            (Loadable::Failed(e), Some(id)) => {
                let msg = e.user_message(lang);
                if error_banner(ui, &msg, lang) {
                    self.start_edit_movie(id);
                }
                return;
            }
            (Loadable::Loading, Some(_)) => {
                loading_row(ui, lang);
                return;
            }
            _ => {}
        }

        let title = if editing.is_some() { t("edit_movie", lang) } else { t("add_movie", lang) };
        ui.heading(title);
        ui.add_space(8.0);

        let mut pick = None;
        let mut submit = false;
        let mut cancel = false;
        let v = &mut self.movie_form;
        egui::Grid::new("movie_form").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
            let f = &mut v.form;
            for (value, key) in [
                (&mut f.title, "title"),
                (&mut f.original_title, "original_title"),
                (&mut f.director, "director"),
            ] {
                ui.label(t(key, lang));
                ui.add(egui::TextEdit::singleline(value).desired_width(420.0));
                ui.end_row();
            }
            ui.label(t("release_date", lang));
            ui.add(egui::TextEdit::singleline(&mut f.release_date).hint_text("YYYY-MM-DD").desired_width(140.0));
            ui.end_row();
            ui.label(t("duration", lang));
            ui.add(egui::DragValue::new(&mut f.duration).clamp_range(0..=1000).suffix(" min"));
            ui.end_row();
            ui.label(t("trailer_url", lang));
            ui.vertical(|ui| {
                ui.add(egui::TextEdit::singleline(&mut f.movie_url).hint_text("https://youtu.be/…").desired_width(420.0));
                let url = f.movie_url.trim();
                if !url.is_empty() {
                    match VideoEmbed::parse(url) {
                        Some(embed) => ui.small(format!("✔ {} · {}", embed.provider(), embed.id())),
                        None => ui.small(RichText::new(t("not_a_video_link", lang)).color(Color32::from_rgb(230, 180, 60))),
                    };
                }
            });
            ui.end_row();
            ui.label(t("description", lang));
            ui.add(egui::TextEdit::multiline(&mut f.description).desired_rows(5).desired_width(420.0));
            ui.end_row();

            ui.label(t("genres", lang));
            ui.vertical(|ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.set_max_width(420.0);
                    for genre in genre_choices(&f.genres) {
                        let selected = f.genres.contains(&genre);
                        if ui.selectable_label(selected, genre.as_str()).clicked() {
                            f.toggle_genre(&genre);
                        }
                    }
                });
                ui.horizontal(|ui| {
                    let input = ui.add(egui::TextEdit::singleline(&mut v.new_genre).hint_text(t("new_genre", lang)).desired_width(200.0));
                    let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (ui.small_button("➕").clicked() || enter) && !v.new_genre.trim().is_empty() {
                        let genre = v.new_genre.trim().to_string();
                        if !f.genres.contains(&genre) {
                            f.genres.push(genre);
                        }
                        v.new_genre.clear();
                    }
                });
            });
            ui.end_row();

            for (kind, key) in [(MovieMedia::Poster, "poster"), (MovieMedia::Backdrop, "backdrop")] {
                ui.label(t(key, lang));
                ui.horizontal(|ui| {
                    if ui.button(t("choose_file", lang)).clicked() {
                        pick = Some(kind);
                    }
                    let chosen = match kind {
                        MovieMedia::Poster => &v.poster,
                        MovieMedia::Backdrop => &v.backdrop,
                    };
                    match chosen {
                        Some(file) => ui.label(format!("{} ({})", file.file_name, format_file_size(file.bytes.len() as u64))),
                        None => ui.label(RichText::new(t("no_file", lang)).weak()),
                    };
                });
                ui.end_row();
            }
        });

        ui.add_space(8.0);
        if let Some(err) = &v.error {
            ui.colored_label(Color32::from_rgb(230, 90, 90), err);
        }
        ui.horizontal(|ui| {
            if v.saving {
                ui.spinner();
                ui.label(t("saving", lang));
            } else {
                if ui.button(RichText::new(t("save", lang)).strong()).clicked() {
                    submit = true;
                }
                if ui.button(t("cancel", lang)).clicked() {
                    cancel = true;
                }
            }
        });

        if let Some(kind) = pick {
            self.choose_movie_media(kind);
        }
        if submit {
            self.submit_movie_form();
        }
        if cancel {
            self.movie_form = Default::default();
            self.pending_nav = Some(match editing {
                Some(id) => Route::MovieDetails(id),
                None => Route::Movies,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinoclub_core::Session;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one connection per canned response, in order, and returns the
    /// request lines it saw.
    async fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                seen.push(line.trim().to_string());
                let mut length = 0usize;
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).await.unwrap() == 0 || header.trim().is_empty() {
                        break;
                    }
                    if let Some(v) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                        length = v.trim().parse().unwrap_or(0);
                    }
                }
                let mut body_in = vec![0u8; length];
                reader.read_exact(&mut body_in).await.ok();
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).await.ok();
                stream.shutdown().await.ok();
            }
            seen
        });
        (format!("http://{}/api", addr), handle)
    }

    fn form() -> MovieForm {
        MovieForm {
            title: "Heat".into(),
            release_date: "1995-12-15".into(),
            duration: 170,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn failed_poster_upload_keeps_created_movie() {
        let (base, server) = serve(vec![
            ("201 Created", r#"{"movie_id":9,"title":"Heat"}"#),
            ("500 Internal Server Error", r#"{"detail":"storage unavailable"}"#),
        ])
        .await;
        let session = Session::in_memory();
        session.set_token("abc");
        let api = ApiClient::new(&base, Duration::from_secs(5), session).unwrap();
        let poster = UploadFile::from_bytes("p.png", vec![1, 2, 3]).unwrap();

        let saved = save_movie(api, None, form(), Some(poster), None).await.unwrap();
        assert_eq!(saved.id, 9);
        assert!(saved.media_error.is_some());
        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("POST /api/movies/"));
        assert!(seen[1].starts_with("POST /api/movies/9/upload/poster"));
    }

    #[tokio::test]
    async fn failed_create_is_an_error() {
        let (base, server) = serve(vec![("403 Forbidden", r#"{"detail":"moderators only"}"#)]).await;
        let session = Session::in_memory();
        session.set_token("abc");
        let api = ApiClient::new(&base, Duration::from_secs(5), session).unwrap();

        let err = save_movie(api, None, form(), None, None).await.unwrap_err();
        assert_eq!(err, ApiError::Forbidden("moderators only".into()));
        server.await.unwrap();
    }

    #[test]
    fn custom_genres_follow_stock_list() {
        let choices = genre_choices(&["Аниме".to_string(), DEFAULT_GENRES[0].to_string()]);
        assert_eq!(choices.len(), DEFAULT_GENRES.len() + 1);
        assert_eq!(choices.last().map(String::as_str), Some("Аниме"));
        assert_eq!(choices[0], DEFAULT_GENRES[0]);
    }
}
