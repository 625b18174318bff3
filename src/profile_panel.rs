use std::sync::Arc;

use eframe::egui::{self, Color32, RichText};
use kinoclub_core::forms::{ProfileForm, UserPatch, PREMIUM_MONTHS, PREMIUM_PRICE_RUB};
use kinoclub_core::upload::{UploadFile, UserMedia, ALLOWED_MIME_TYPES};
use kinoclub_core::{ApiError, Language, User};

use crate::app_state::{Action, Confirm, Loadable, Msg};
use crate::helpers::{format_coins, format_timestamp};
use crate::i18n::t;
use crate::ui_helpers::{error_banner, image_or_placeholder, initials, loading_row, premium_badge, role_badge};
use crate::{KinoClub, ToastType};

/// Extensions offered in the file picker, derived from the accepted MIME types.
pub fn image_extensions() -> Vec<&'static str> {
    ALLOWED_MIME_TYPES
        .iter()
        .flat_map(|mime| match *mime {
            "image/jpeg" => &["jpg", "jpeg"][..],
            "image/png" => &["png"][..],
            "image/gif" => &["gif"][..],
            "image/webp" => &["webp"][..],
            _ => &[][..],
        })
        .copied()
        .collect()
}

/// Picks an image with the native dialog; `None` when the user backs out.
pub(crate) fn pick_image(lang: Language) -> Option<Result<UploadFile, String>> {
    let exts = image_extensions();
    let path = rfd::FileDialog::new().add_filter(t("images", lang), &exts[..]).pick_file()?;
    Some(UploadFile::read(&path).map_err(|e| e.user_message(lang)))
}

/// A profile already on screen wins over a failed refresh.
pub(crate) fn profile_state(user: Option<Arc<User>>, error: Option<&ApiError>) -> Loadable<Arc<User>> {
    match (user, error) {
        (Some(user), _) => Loadable::Ready(user),
        (None, Some(e)) => Loadable::Failed(e.clone()),
        (None, None) => Loadable::Loading,
    }
}

/// Read-only profile card shared by "my profile" and public profiles.
pub(crate) fn profile_summary(app: &mut KinoClub, ui: &mut egui::Ui, user: &User, own: bool) {
    let lang = app.lang();
    if let Some(tex) = app.texture_for(user.header_photo.as_deref()) {
        let width = ui.available_width();
        ui.add(egui::Image::new(&tex).fit_to_exact_size(egui::vec2(width, 180.0)).rounding(8.0));
        ui.add_space(8.0);
    }
    let avatar = app.texture_for(user.photo.as_deref());
    ui.horizontal_top(|ui| {
        image_or_placeholder(ui, avatar.as_ref(), egui::vec2(96.0, 96.0), &initials(&user.display_name()));
        ui.add_space(12.0);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new(user.display_name()).strong());
                if user.is_premium {
                    premium_badge(ui, lang);
                }
                role_badge(ui, user.role, lang);
            });
            ui.label(RichText::new(format!("@{}", user.username)).weak());
            if !user.title.is_empty() {
                ui.label(RichText::new(&user.title).italics());
            }
            ui.label(format!("{} {}", t("level", lang), user.level));
            if own {
                ui.label(format!("{}: {}", t("email", lang), user.email));
                ui.label(format!("{}: 🪙 {}", t("balance", lang), format_coins(user.money, lang)));
                if user.is_premium {
                    if let Some(until) = user.premium_until {
                        ui.label(format!("{} {}", t("premium_until", lang), format_timestamp(Some(until))));
                    }
                }
            }
            if !user.location.is_empty() {
                ui.label(format!("📍 {}", user.location));
            }
            if let Some(age) = user.age {
                ui.label(format!("{}: {}", t("age", lang), age));
            }
            if user.created_at.is_some() {
                ui.label(RichText::new(format!("{} {}", t("member_since", lang), format_timestamp(user.created_at))).small().weak());
            }
        });
    });
    if !user.about.is_empty() {
        ui.add_space(8.0);
        ui.label(&user.about);
    }
}

impl KinoClub {
    fn save_profile(&mut self, user: &User) {
        let patch = match UserPatch::diff(user, &self.profile.form) {
            Ok(p) => p,
            Err(e) => {
                self.add_toast(e.user_message(self.lang()), ToastType::Warning);
                return;
            }
        };
        self.profile.saving = true;
        let api = self.api.clone();
        let id = user.id;
        self.spawn(async move {
            let result = api.update_user(id, &patch).await.map(|_| ());
            Msg::Mutated { action: Action::UpdateProfile, result }
        });
    }

    fn upload_user_media(&mut self, kind: UserMedia) {
        let lang = self.lang();
        let file = match pick_image(lang) {
            None => return,
            Some(Ok(file)) => file,
            Some(Err(msg)) => {
                self.add_toast(msg, ToastType::Warning);
                return;
            }
        };
        self.profile.uploading = Some(kind);
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.upload_user_media(kind, file).await.map(|_| ());
            Msg::Mutated { action: Action::UploadUserMedia(kind), result }
        });
    }

    pub(crate) fn profile_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let user = match profile_state(self.current_user.clone(), self.profile.load_error.as_ref()) {
            Loadable::Ready(user) => user,
            Loadable::Failed(e) => {
                if error_banner(ui, &e.user_message(lang), lang) {
                    self.refresh_current_user();
                }
                return;
            }
            Loadable::Loading | Loadable::Idle => {
                loading_row(ui, lang);
                return;
            }
        };
        profile_summary(self, ui, &user, true);
        ui.add_space(12.0);

        // photo uploads
        ui.horizontal(|ui| {
            let busy = self.profile.uploading.is_some();
            if busy {
                ui.spinner();
            }
            if ui.add_enabled(!busy, egui::Button::new(t("change_photo", lang))).clicked() {
                self.upload_user_media(UserMedia::Photo);
            }
            if ui.add_enabled(!busy, egui::Button::new(t("change_header", lang))).clicked() {
                self.upload_user_media(UserMedia::HeaderPhoto);
            }
            if !self.profile.editing && ui.button(t("edit_profile", lang)).clicked() {
                self.profile.form = ProfileForm::from_user(&user);
                self.profile.editing = true;
            }
        });

        if self.profile.editing {
            ui.add_space(8.0);
            self.profile_form(ui, &user);
        }

        ui.add_space(16.0);
        ui.separator();
        self.premium_section(ui, &user);
    }

    fn profile_form(&mut self, ui: &mut egui::Ui, user: &User) {
        let lang = self.lang();
        let mut save = false;
        let mut cancel = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            let f = &mut self.profile.form;
            egui::Grid::new("profile_form").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                for (value, key) in [
                    (&mut f.name, "first_name"),
                    (&mut f.surname, "last_name"),
                    (&mut f.username, "username"),
                    (&mut f.email, "email"),
                    (&mut f.location, "location"),
                    (&mut f.age, "age"),
                ] {
                    ui.label(t(key, lang));
                    ui.add(egui::TextEdit::singleline(value).desired_width(300.0));
                    ui.end_row();
                }
                ui.label(t("about", lang));
                ui.add(egui::TextEdit::multiline(&mut f.about).desired_rows(3).desired_width(300.0));
                ui.end_row();
            });
            ui.horizontal(|ui| {
                if self.profile.saving {
                    ui.spinner();
                } else {
                    if ui.button(t("save", lang)).clicked() {
                        save = true;
                    }
                    if ui.button(t("cancel", lang)).clicked() {
                        cancel = true;
                    }
                }
            });
        });
        if save {
            self.save_profile(user);
        }
        if cancel {
            self.profile.editing = false;
            self.profile.form = ProfileForm::from_user(user);
        }
    }

    fn premium_section(&mut self, ui: &mut egui::Ui, user: &User) {
        let lang = self.lang();
        ui.label(RichText::new(t("premium", lang)).heading().color(Color32::from_rgb(255, 196, 46)));
        ui.label(t("premium_pitch", lang));
        if user.is_premium {
            ui.label(RichText::new(t("premium_active", lang)).strong());
        }
        ui.horizontal(|ui| {
            for months in PREMIUM_MONTHS {
                let label = format!("{} {} · {} ₽", months, t("months", lang), months * PREMIUM_PRICE_RUB);
                ui.selectable_value(&mut self.profile.premium_months, months, label);
            }
        });
        let button = if user.is_premium { t("extend_premium", lang) } else { t("buy_premium", lang) };
        if ui.button(RichText::new(button).strong()).clicked() {
            self.confirm = Some(Confirm::PurchasePremium(self.profile.premium_months));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_extensions_follow_allowed_types() {
        let exts = image_extensions();
        assert_eq!(exts, vec!["jpg", "jpeg", "png", "gif", "webp"]);
    }

    #[test]
    fn failed_profile_load_is_shown_not_spun() {
        let err = ApiError::Server { status: 502, detail: String::new() };
        assert!(matches!(profile_state(None, Some(&err)), Loadable::Failed(ApiError::Server { status: 502, .. })));
        assert!(profile_state(None, None).is_loading());
        let user = Arc::new(User::default());
        assert!(profile_state(Some(user), Some(&err)).ready().is_some());
    }
}
