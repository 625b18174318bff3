use eframe::egui::viewport::IconData;

// Film-frame app icon: crimson rounded square, perforation strips, amber star
pub fn generate_icon(size: u32) -> IconData {
    let w = size;
    let h = size;
    let s = size as f32;
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    let corner = s * 0.18;
    let strip = s * 0.14;
    let hole = s * 0.06;

    for y in 0..h {
        for x in 0..w {
            let idx = ((y * w + x) * 4) as usize;
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            if !in_rounded_rect(px, py, s, corner) {
                continue;
            }
            // vertical gradient
            let t = py / s;
            let mut c = [lerp(196.0, 120.0, t), lerp(30.0, 12.0, t), lerp(58.0, 30.0, t)];

            // perforated strips left and right
            if px < strip || px > s - strip {
                c = [24.0, 20.0, 24.0];
                let cx = if px < strip { strip * 0.5 } else { s - strip * 0.5 };
                let pitch = s / 7.0;
                let cy = ((py / pitch).floor() + 0.5) * pitch;
                if (px - cx).abs() < hole * 0.5 && (py - cy).abs() < hole * 0.6 {
                    c = [235.0, 235.0, 235.0];
                }
            }

            if in_star(px, py, s * 0.5, s * 0.5, s * 0.26, s * 0.11) {
                c = [255.0, 196.0, 46.0];
            }

            rgba[idx] = c[0] as u8;
            rgba[idx + 1] = c[1] as u8;
            rgba[idx + 2] = c[2] as u8;
            rgba[idx + 3] = 255;
        }
    }

    IconData { rgba, width: w, height: h }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn in_rounded_rect(px: f32, py: f32, s: f32, r: f32) -> bool {
    let dx = (r - px).max(px - (s - r)).max(0.0);
    let dy = (r - py).max(py - (s - r)).max(0.0);
    dx * dx + dy * dy <= r * r
}

/// Five-pointed star by polar test against the interpolated radius.
fn in_star(px: f32, py: f32, cx: f32, cy: f32, outer: f32, inner: f32) -> bool {
    use std::f32::consts::PI;
    let dx = px - cx;
    let dy = py - cy;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > outer {
        return false;
    }
    // angle measured from the top point, clockwise
    let mut a = dx.atan2(-dy);
    if a < 0.0 {
        a += 2.0 * PI;
    }
    let seg = PI / 5.0;
    let k = (a / seg).floor();
    let f = a / seg - k;
    let (r0, r1) = if k as i32 % 2 == 0 { (outer, inner) } else { (inner, outer) };
    // radius along the straight edge between the two vertices
    let (a0, a1) = (0.0f32, seg);
    let p0 = (r0 * a0.cos(), r0 * a0.sin());
    let p1 = (r1 * a1.cos(), r1 * a1.sin());
    let theta = f * seg;
    let (ux, uy) = (theta.cos(), theta.sin());
    let ex = p1.0 - p0.0;
    let ey = p1.1 - p0.1;
    let denom = ux * ey - uy * ex;
    if denom.abs() < f32::EPSILON {
        return dist <= r0;
    }
    let edge = (p0.0 * ey - p0.1 * ex) / denom;
    dist <= edge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_has_opaque_center_and_clear_corner() {
        let icon = generate_icon(64);
        assert_eq!(icon.rgba.len(), 64 * 64 * 4);
        let center = ((32 * 64 + 32) * 4) as usize;
        assert_eq!(icon.rgba[center + 3], 255);
        assert_eq!(icon.rgba[3], 0);
    }
}
