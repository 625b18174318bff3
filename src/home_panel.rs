use eframe::egui::{self, RichText};
use kinoclub_core::{top_rated, User};

use crate::app_state::{Loadable, Msg, Route};
use crate::i18n::t;
use crate::ui_helpers::{error_banner, image_or_placeholder, initials, loading_row, premium_badge};
use crate::KinoClub;

const HOT_MOVIES: usize = 8;
const TOP_USERS: usize = 5;

/// Highest level first; ties keep server order.
pub fn top_by_level(mut users: Vec<User>, n: usize) -> Vec<User> {
    users.sort_by(|a, b| b.level.cmp(&a.level));
    users.truncate(n);
    users
}

impl KinoClub {
    pub(crate) fn load_top_users(&mut self) {
        if self.home.top_users.is_loading() {
            return;
        }
        self.home.top_users = Loadable::Loading;
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.list_users(1, 50).await.map(|page| top_by_level(page.users, TOP_USERS));
            Msg::TopUsersLoaded(result)
        });
    }

    pub(crate) fn home_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        ui.add_space(8.0);
        ui.heading(RichText::new(t("home_title", lang)).size(26.0).strong());
        ui.label(RichText::new(t("home_subtitle", lang)).weak());
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new(t("hot_now", lang)).heading());
            if ui.link(t("all_movies", lang)).clicked() {
                self.pending_nav = Some(Route::Movies);
            }
        });
        match self.catalog.snapshot() {
            Some(movies) => {
                let hot = top_rated(&movies, HOT_MOVIES);
                if hot.is_empty() {
                    ui.label(t("no_movies", lang));
                }
                egui::ScrollArea::horizontal().id_source("hot_row").show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for movie in &hot {
                            if self.movie_card(ui, movie) {
                                self.pending_nav = Some(Route::MovieDetails(movie.id));
                            }
                        }
                    });
                });
            }
            None if self.movies_error.is_some() => {
                let msg = self.catalog_error_text();
                if error_banner(ui, &msg, lang) {
                    self.load_movies();
                }
            }
            None => loading_row(ui, lang),
        }

        ui.add_space(16.0);
        ui.label(RichText::new(t("top_users", lang)).heading());
        let top_users = self.home.top_users.clone();
        match top_users {
            Loadable::Ready(users) => {
                for (place, user) in users.iter().enumerate() {
                    let avatar = self.texture_for(user.photo.as_deref());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("#{}", place + 1)).strong());
                        let clicked = image_or_placeholder(ui, avatar.as_ref(), egui::vec2(36.0, 36.0), &initials(&user.display_name())).clicked();
                        if clicked || ui.link(user.display_name()).clicked() {
                            self.pending_nav = Some(Route::UserProfile(user.id));
                        }
                        ui.label(RichText::new(format!("{} {}", t("level", lang), user.level)).weak());
                        if !user.title.is_empty() {
                            ui.label(RichText::new(&user.title).italics());
                        }
                        if user.is_premium {
                            premium_badge(ui, lang);
                        }
                    });
                }
                if users.is_empty() {
                    ui.label(t("no_users", lang));
                }
            }
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.load_top_users();
                }
            }
            Loadable::Loading | Loadable::Idle => loading_row(ui, lang),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, level: u32) -> User {
        User { id, level, ..Default::default() }
    }

    #[test]
    fn top_users_by_level() {
        let users = vec![user(1, 3), user(2, 9), user(3, 5), user(4, 9), user(5, 1), user(6, 7)];
        let top: Vec<i64> = top_by_level(users, 5).iter().map(|u| u.id).collect();
        assert_eq!(top, vec![2, 4, 6, 3, 1]);
    }

    #[test]
    fn fewer_users_than_slots() {
        assert_eq!(top_by_level(vec![user(1, 2)], 5).len(), 1);
        assert!(top_by_level(Vec::new(), 5).is_empty());
    }
}
