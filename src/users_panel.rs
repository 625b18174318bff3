use eframe::egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

use crate::app_state::{Loadable, Msg, Route};
use crate::helpers::format_timestamp;
use crate::i18n::t;
use crate::profile_panel::profile_summary;
use crate::ui_helpers::{error_banner, image_or_placeholder, initials, loading_row, premium_badge, role_badge};
use crate::KinoClub;

pub const USERS_PER_PAGE: u32 = 20;

/// A short page means the server has nothing after it.
pub fn has_next_page(page_len: usize, limit: u32) -> bool {
    page_len >= limit as usize
}

impl KinoClub {
    pub(crate) fn load_users(&mut self, page: u32) {
        let page = page.max(1);
        self.users.page = page;
        self.users.list = Loadable::Loading;
        let api = self.api.clone();
        self.spawn(async move { Msg::UsersLoaded { page, result: api.list_users(page, USERS_PER_PAGE).await } });
    }

    pub(crate) fn load_user(&mut self, id: i64) {
        self.user_profile.id = id;
        self.user_profile.user = Loadable::Loading;
        let api = self.api.clone();
        self.spawn(async move { Msg::UserLoaded { id, result: api.get_user(id).await } });
    }

    pub(crate) fn users_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let page = self.users.page;
        ui.heading(t("users", lang));
        ui.add_space(6.0);

        let list = self.users.list.clone();
        let users = match list {
            Loadable::Ready(p) => p.users,
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.load_users(page);
                }
                return;
            }
            Loadable::Loading | Loadable::Idle => {
                loading_row(ui, lang);
                return;
            }
        };

        let avatars: Vec<_> = users.iter().map(|u| self.texture_for(u.photo.as_deref())).collect();
        let mut open = None;
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::exact(48.0))
            .column(Column::remainder().at_least(180.0))
            .column(Column::auto().at_least(70.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(120.0))
            .header(22.0, |mut header| {
                header.col(|_| {});
                header.col(|ui| {
                    ui.strong(t("user", lang));
                });
                header.col(|ui| {
                    ui.strong(t("level", lang));
                });
                header.col(|ui| {
                    ui.strong(t("status", lang));
                });
                header.col(|ui| {
                    ui.strong(t("member_since", lang));
                });
            })
            .body(|mut body| {
                for (user, avatar) in users.iter().zip(&avatars) {
                    body.row(44.0, |mut row| {
                        row.col(|ui| {
                            let name = initials(&user.display_name());
                            if image_or_placeholder(ui, avatar.as_ref(), egui::vec2(36.0, 36.0), &name).clicked() {
                                open = Some(user.id);
                            }
                        });
                        row.col(|ui| {
                            ui.vertical(|ui| {
                                if ui.link(RichText::new(user.display_name()).strong()).clicked() {
                                    open = Some(user.id);
                                }
                                ui.label(RichText::new(format!("@{}", user.username)).small().weak());
                            });
                        });
                        row.col(|ui| {
                            ui.label(user.level.to_string());
                        });
                        row.col(|ui| {
                            ui.horizontal(|ui| {
                                if user.is_premium {
                                    premium_badge(ui, lang);
                                }
                                role_badge(ui, user.role, lang);
                            });
                        });
                        row.col(|ui| {
                            ui.label(format_timestamp(user.created_at));
                        });
                    });
                }
            });
        if users.is_empty() {
            ui.label(t("no_users", lang));
        }

        ui.add_space(8.0);
        let mut goto = None;
        ui.horizontal(|ui| {
            if ui.add_enabled(page > 1, egui::Button::new("◀")).clicked() {
                goto = Some(page - 1);
            }
            ui.label(format!("{} {}", t("page", lang), page));
            if ui.add_enabled(has_next_page(users.len(), USERS_PER_PAGE), egui::Button::new("▶")).clicked() {
                goto = Some(page + 1);
            }
        });

        if let Some(p) = goto {
            self.load_users(p);
        }
        if let Some(id) = open {
            self.pending_nav = Some(Route::UserProfile(id));
        }
    }

    pub(crate) fn user_profile_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let id = self.user_profile.id;
        match self.user_profile.user.clone() {
            Loadable::Ready(user) => {
                let own = self.current_user.as_ref().is_some_and(|me| me.id == user.id);
                profile_summary(self, ui, &user, own);
                if own {
                    ui.add_space(8.0);
                    if ui.button(t("edit_profile", lang)).clicked() {
                        self.pending_nav = Some(Route::Profile);
                    }
                }
            }
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.load_user(id);
                }
            }
            Loadable::Loading | Loadable::Idle => loading_row(ui, lang),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_only_after_full_page() {
        assert!(has_next_page(20, USERS_PER_PAGE));
        assert!(!has_next_page(7, USERS_PER_PAGE));
        assert!(!has_next_page(0, USERS_PER_PAGE));
    }
}
