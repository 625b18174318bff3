use std::time::Duration;

use eframe::egui::{self, Color32, RichText};
use kinoclub_core::oauth::OAuthLogin;
use kinoclub_core::ApiError;
use tracing::{info, warn};

use crate::app_state::{Msg, Route};
use crate::i18n::t;
use crate::player;
use crate::KinoClub;

const FORM_WIDTH: f32 = 360.0;

impl KinoClub {
    fn submit_login(&mut self) {
        let email = self.login.email.trim().to_string();
        let password = self.login.password.clone();
        if email.is_empty() || password.is_empty() {
            self.login.error = Some(self.tr("fill_email_password"));
            return;
        }
        self.login.busy = true;
        self.login.error = None;
        let api = self.api.clone();
        self.spawn(async move { Msg::LoggedIn(api.login(&email, &password).await.map(|_| ())) });
    }

    /// Opens the provider page in the browser and waits for the redirect on a
    /// loopback port. The wait can be cancelled from the login form.
    fn start_oauth(&mut self) {
        if let Some(cancel) = self.login.oauth_cancel.take() {
            cancel.cancel();
        }
        let api_base = self.api.base_url().clone();
        let port = self.config.oauth_callback_port;
        let timeout = Duration::from_secs(self.config.oauth_timeout_secs.max(10));
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.login.busy = true;
        self.login.error = None;
        self.spawn(async move {
            let (login, cancel) = match OAuthLogin::bind(&api_base, port).await {
                Ok(pair) => pair,
                Err(e) => return Msg::OAuthFinished(Err(e)),
            };
            let url = login.login_url().to_string();
            if tx.send(cancel).is_err() {
                return Msg::OAuthFinished(Err(ApiError::Cancelled));
            }
            info!("opening browser for Google sign-in");
            if let Err(e) = player::open_in_browser(&url) {
                warn!("cannot open browser: {}", e);
                return Msg::OAuthFinished(Err(ApiError::Network(format!("cannot open browser: {}", e))));
            }
            Msg::OAuthFinished(login.wait(timeout).await)
        });
        self.pending_oauth = Some(rx);
    }

    /// Picks up the cancel handle once the listener is bound.
    pub(crate) fn poll_oauth_handle(&mut self) {
        let Some(rx) = self.pending_oauth.as_mut() else { return };
        match rx.try_recv() {
            Ok(cancel) => {
                self.login.oauth_cancel = Some(cancel);
                self.pending_oauth = None;
            }
            Err(tokio::sync::oneshot::error::TryRecvError::Empty) => {}
            Err(tokio::sync::oneshot::error::TryRecvError::Closed) => self.pending_oauth = None,
        }
    }

    fn cancel_oauth(&mut self) {
        if let Some(cancel) = self.login.oauth_cancel.take() {
            cancel.cancel();
        }
    }

    pub(crate) fn login_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let mut submit = false;
        let mut oauth = false;
        let mut cancel_oauth = false;
        let mut register = false;
        let waiting_for_browser = self.login.oauth_cancel.is_some();

        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.set_max_width(FORM_WIDTH);
            ui.heading(RichText::new(t("login_title", lang)).size(24.0).strong());
            ui.add_space(12.0);
            let email = ui.add(
                egui::TextEdit::singleline(&mut self.login.email)
                    .hint_text(t("email", lang))
                    .desired_width(FORM_WIDTH),
            );
            let password = ui.add(
                egui::TextEdit::singleline(&mut self.login.password)
                    .password(true)
                    .hint_text(t("password", lang))
                    .desired_width(FORM_WIDTH),
            );
            let enter = (email.lost_focus() || password.lost_focus()) && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.add_space(8.0);

            if let Some(err) = &self.login.error {
                ui.colored_label(Color32::from_rgb(230, 90, 90), err);
                ui.add_space(4.0);
            }

            if self.login.busy {
                ui.spinner();
                if waiting_for_browser {
                    ui.label(t("oauth_waiting", lang));
                    if ui.button(t("cancel", lang)).clicked() {
                        cancel_oauth = true;
                    }
                }
            } else {
                if ui.add_sized([FORM_WIDTH, 32.0], egui::Button::new(RichText::new(t("login", lang)).strong())).clicked() || enter {
                    submit = true;
                }
                ui.add_space(6.0);
                if ui.add_sized([FORM_WIDTH, 32.0], egui::Button::new(t("login_google", lang))).clicked() {
                    oauth = true;
                }
            }
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.label(t("no_account", lang));
                if ui.link(t("register", lang)).clicked() {
                    register = true;
                }
            });
        });

        if submit {
            self.submit_login();
        }
        if oauth {
            self.start_oauth();
        }
        if cancel_oauth {
            self.cancel_oauth();
        }
        if register {
            self.pending_nav = Some(Route::Register);
        }
    }

    fn submit_registration(&mut self) {
        let body = match self.register.form.validate() {
            Ok(body) => body,
            Err(e) => {
                self.register.error = Some(e.user_message(self.lang()));
                return;
            }
        };
        self.register.busy = true;
        self.register.error = None;
        let api = self.api.clone();
        self.spawn(async move { Msg::Registered(api.register(&body).await) });
    }

    pub(crate) fn register_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        let mut submit = false;
        let mut login = false;

        ui.add_space(30.0);
        ui.vertical_centered(|ui| {
            ui.set_max_width(FORM_WIDTH);
            ui.heading(RichText::new(t("register_title", lang)).size(24.0).strong());
            ui.add_space(12.0);
            let f = &mut self.register.form;
            for (value, key, secret) in [
                (&mut f.name, "first_name", false),
                (&mut f.surname, "last_name", false),
                (&mut f.username, "username", false),
                (&mut f.email, "email", false),
                (&mut f.password, "password", true),
                (&mut f.confirm_password, "confirm_password", true),
            ] {
                ui.add(
                    egui::TextEdit::singleline(value)
                        .password(secret)
                        .hint_text(t(key, lang))
                        .desired_width(FORM_WIDTH),
                );
            }
            ui.add_space(8.0);
            if let Some(err) = &self.register.error {
                ui.colored_label(Color32::from_rgb(230, 90, 90), err);
                ui.add_space(4.0);
            }
            if self.register.busy {
                ui.spinner();
            } else if ui.add_sized([FORM_WIDTH, 32.0], egui::Button::new(RichText::new(t("register", lang)).strong())).clicked() {
                submit = true;
            }
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.label(t("have_account", lang));
                if ui.link(t("login", lang)).clicked() {
                    login = true;
                }
            });
        });

        if submit {
            self.submit_registration();
        }
        if login {
            self.pending_nav = Some(Route::Login);
        }
    }
}
