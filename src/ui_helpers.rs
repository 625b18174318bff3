use eframe::egui::{self, Color32, RichText, Ui};
use kinoclub_core::{format_rating, Language, Role};

use crate::i18n::t;

/// Green for good ratings, amber for average, red below that.
pub fn rating_color(rating: f32) -> Color32 {
    if rating >= 7.0 {
        Color32::from_rgb(80, 190, 100)
    } else if rating >= 5.0 {
        Color32::from_rgb(230, 180, 60)
    } else {
        Color32::from_rgb(210, 80, 70)
    }
}

pub fn rating_label(ui: &mut Ui, rating: f32) {
    ui.label(RichText::new(format!("★ {}", format_rating(rating))).color(rating_color(rating)).strong());
}

pub fn premium_badge(ui: &mut Ui, lang: Language) {
    ui.label(
        RichText::new(format!("👑 {}", t("premium", lang)))
            .color(Color32::from_rgb(255, 196, 46))
            .small()
            .strong(),
    );
}

pub fn role_badge(ui: &mut Ui, role: Role, lang: Language) {
    let color = match role {
        Role::User => return,
        Role::Moderator => Color32::from_rgb(90, 160, 220),
        Role::Admin => Color32::from_rgb(200, 110, 220),
        Role::SuperAdmin => Color32::from_rgb(230, 90, 90),
    };
    ui.label(RichText::new(t(role_key(role), lang)).color(color).small().strong());
}

fn role_key(role: Role) -> &'static str {
    match role {
        Role::User => "role_user",
        Role::Moderator => "role_moderator",
        Role::Admin => "role_admin",
        Role::SuperAdmin => "role_superadmin",
    }
}

/// Inline failure banner; returns true when "retry" was clicked.
pub fn error_banner(ui: &mut Ui, message: &str, lang: Language) -> bool {
    let mut retry = false;
    egui::Frame::none()
        .fill(Color32::from_rgba_unmultiplied(200, 60, 60, 40))
        .stroke(egui::Stroke::new(1.0, Color32::from_rgb(200, 60, 60)))
        .rounding(6.0)
        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(Color32::from_rgb(230, 90, 90), format!("⚠ {}", message));
                if ui.button(t("retry", lang)).clicked() {
                    retry = true;
                }
            });
        });
    retry
}

/// Texture scaled to `size`, or a framed placeholder with `fallback` text.
pub fn image_or_placeholder(ui: &mut Ui, texture: Option<&egui::TextureHandle>, size: egui::Vec2, fallback: &str) -> egui::Response {
    match texture {
        Some(tex) => ui.add(egui::Image::new(tex).fit_to_exact_size(size).rounding(6.0).sense(egui::Sense::click())),
        None => {
            let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
            let painter = ui.painter();
            painter.rect_filled(rect, 6.0, ui.visuals().faint_bg_color);
            painter.rect_stroke(rect, 6.0, ui.visuals().widgets.noninteractive.bg_stroke);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                fallback,
                egui::FontId::proportional((size.y / 4.0).clamp(12.0, 32.0)),
                ui.visuals().weak_text_color(),
            );
            response
        }
    }
}

/// Up to two letters for avatar placeholders.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// Ten clickable stars for a 1..=10 comment rating.
pub fn rating_picker(ui: &mut Ui, rating: &mut u8) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 2.0;
        for i in 1..=10u8 {
            let filled = i <= *rating;
            let star = RichText::new(if filled { "★" } else { "☆" })
                .color(if filled { Color32::from_rgb(255, 196, 46) } else { Color32::GRAY })
                .size(18.0);
            if ui.add(egui::Label::new(star).sense(egui::Sense::click())).on_hover_text(i.to_string()).clicked() {
                *rating = i;
                changed = true;
            }
        }
        ui.label(format!("{}/10", rating));
    });
    changed
}

/// Render a collapsible section with a header
pub fn render_collapsible_section<R>(
    ui: &mut Ui,
    title: &str,
    id_source: &str,
    default_open: bool,
    content: impl FnOnce(&mut Ui) -> R,
) -> Option<R> {
    egui::CollapsingHeader::new(title)
        .id_source(id_source)
        .default_open(default_open)
        .show(ui, content)
        .body_returned
}

pub fn loading_row(ui: &mut Ui, lang: Language) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(t("loading", lang));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("анна смирнова"), "АС");
        assert_eq!(initials("neo"), "N");
        assert_eq!(initials("  "), "");
        assert_eq!(initials("a b c"), "AB");
    }

    #[test]
    fn rating_color_bands() {
        assert_eq!(rating_color(8.0), rating_color(7.0));
        assert_ne!(rating_color(6.9), rating_color(7.0));
        assert_ne!(rating_color(4.9), rating_color(5.0));
    }
}
