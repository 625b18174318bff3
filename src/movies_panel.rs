use chrono::Datelike;
use eframe::egui::{self, RichText};
use kinoclub_core::filter::MIN_YEAR;
use kinoclub_core::{available_genres, CatalogError, CatalogFilter, Movie, SortKey};

use crate::app_state::Route;
use crate::i18n::t;
use crate::ui_helpers::{error_banner, image_or_placeholder, loading_row, rating_label, render_collapsible_section};
use crate::KinoClub;

const CARD_SIZE: egui::Vec2 = egui::vec2(150.0, 225.0);

impl KinoClub {
    /// Poster card; true when clicked.
    pub(crate) fn movie_card(&mut self, ui: &mut egui::Ui, movie: &Movie) -> bool {
        let texture = self.texture_for(movie.poster.as_deref());
        let mut clicked = false;
        ui.allocate_ui(egui::vec2(CARD_SIZE.x, CARD_SIZE.y + 56.0), |ui| {
            ui.vertical(|ui| {
                ui.set_width(CARD_SIZE.x);
                let mut poster = image_or_placeholder(ui, texture.as_ref(), CARD_SIZE, "🎬");
                if !movie.description.is_empty() {
                    poster = poster.on_hover_text(movie.description.as_str());
                }
                if poster.clicked() {
                    clicked = true;
                }
                let title = egui::Label::new(RichText::new(&movie.title).strong()).truncate(true).sense(egui::Sense::click());
                if ui.add(title).clicked() {
                    clicked = true;
                }
                ui.horizontal(|ui| {
                    rating_label(ui, movie.rating);
                    if let Some(year) = movie.year() {
                        ui.label(RichText::new(year.to_string()).weak());
                    }
                });
            });
        });
        clicked
    }

    pub(crate) fn catalog_error_text(&self) -> String {
        match &self.movies_error {
            Some(CatalogError::RequiresLogin) => self.tr("catalog_requires_login"),
            Some(CatalogError::Failed(e)) => e.user_message(self.lang()),
            None => String::new(),
        }
    }

    pub(crate) fn movies_panel(&mut self, ui: &mut egui::Ui) {
        let lang = self.lang();
        ui.horizontal(|ui| {
            ui.heading(t("movies", lang));
            if self.movies_loading {
                ui.spinner();
            } else if ui.small_button("⟳").on_hover_text(t("refresh", lang)).clicked() {
                self.catalog.invalidate();
                self.load_movies();
            }
            if self.can_manage_content() && ui.button(t("add_movie", lang)).clicked() {
                self.pending_nav = Some(Route::CreateMovie);
            }
        });
        ui.add_space(6.0);

        if matches!(self.movies_error, Some(CatalogError::RequiresLogin)) {
            // no list at all without a session
            ui.label(self.catalog_error_text());
            if ui.button(t("login", lang)).clicked() {
                self.after_login = Some(Route::Movies);
                self.pending_nav = Some(Route::Login);
            }
            return;
        }
        if self.movies_error.is_some() {
            let msg = self.catalog_error_text();
            if error_banner(ui, &msg, lang) {
                self.load_movies();
            }
        }

        let Some(movies) = self.catalog.snapshot() else {
            if self.movies_loading {
                loading_row(ui, lang);
            }
            return;
        };
        self.filter_controls(ui, &movies);
        ui.add_space(6.0);

        let shown = self.filter.apply(&movies);
        ui.label(RichText::new(format!("{}: {}", t("movies_found", lang), shown.len())).weak());
        if shown.is_empty() {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| ui.label(t("no_movies_match", lang)));
            return;
        }
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(14.0, 14.0);
            for movie in &shown {
                if self.movie_card(ui, movie) {
                    self.pending_nav = Some(Route::MovieDetails(movie.id));
                }
            }
        });
    }

    fn filter_controls(&mut self, ui: &mut egui::Ui, movies: &[Movie]) {
        let lang = self.lang();
        let genres = available_genres(movies);
        let max_year = chrono::Local::now().year() + 5;
        render_collapsible_section(ui, &t("filters", lang), "catalog_filters", true, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(t("genres", lang)).strong());
                for genre in &genres {
                    let selected = self.filter.genres.contains(genre);
                    if ui.selectable_label(selected, genre.as_str()).clicked() {
                        self.filter.toggle_genre(genre);
                    }
                }
                if !self.filter.genres.is_empty() && ui.small_button(t("clear", lang)).clicked() {
                    self.filter.genres.clear();
                }
            });
            ui.horizontal_wrapped(|ui| {
                ui.label(t("min_rating", lang));
                ui.add(egui::Slider::new(&mut self.filter.min_rating, 0.0..=10.0).step_by(0.1));
                ui.separator();
                ui.label(t("years", lang));
                ui.add(egui::DragValue::new(&mut self.filter.year_from).clamp_range(MIN_YEAR..=max_year));
                ui.label("–");
                ui.add(egui::DragValue::new(&mut self.filter.year_to).clamp_range(MIN_YEAR..=max_year));
                ui.separator();
                ui.label(t("sort_by", lang));
                egui::ComboBox::from_id_source("sort_combo")
                    .selected_text(t(self.filter.sort.label_key(), lang))
                    .show_ui(ui, |ui| {
                        for key in SortKey::ALL {
                            ui.selectable_value(&mut self.filter.sort, key, t(key.label_key(), lang));
                        }
                    });
                if ui.button(t("reset_filters", lang)).clicked() {
                    self.filter = CatalogFilter::default();
                }
            });
        });
    }
}
