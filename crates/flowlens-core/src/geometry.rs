//! Zoom-aware sizing for rendered marks.
//!
//! Renderers draw in data space and apply a `k`-scale transform on top, so
//! every size here is computed in screen pixels and divided back by `k`.
//! None of these functions hold state or depend on the filter pipeline.

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Power applied to the base size to compress its dynamic range.
    pub radius_power: f64,
    /// Screen pixels per compressed unit.
    pub radius_scale: f64,
    /// How strongly on-screen radius follows zoom. 0 keeps it screen-constant.
    pub zoom_exponent: f64,
    pub min_screen_px: f64,
    pub max_screen_px: f64,
    pub min_stroke_px: f64,
    pub max_stroke_px: f64,
    pub min_font_px: f64,
    pub max_font_px: f64,
    pub dash_px: f64,
    pub gap_px: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            radius_power: 0.5,
            radius_scale: 1.0,
            zoom_exponent: 0.0,
            min_screen_px: 2.0,
            max_screen_px: 40.0,
            min_stroke_px: 0.5,
            max_stroke_px: 6.0,
            min_font_px: 8.0,
            max_font_px: 24.0,
            dash_px: 6.0,
            gap_px: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    pub pattern: String,
    pub cycle_px: f64,
}

/// A circle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapNode {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

fn sanitize_zoom(k: f64) -> f64 {
    if k.is_finite() && k > 0.0 {
        k
    } else {
        1.0
    }
}

fn clamp_range(value: f64, min: f64, max: f64) -> f64 {
    if min <= max {
        value.clamp(min, max)
    } else {
        value.clamp(max, min)
    }
}

impl GeometryConfig {
    /// Data-space radius whose rendered size lands in the screen clamp range.
    pub fn radius(&self, base_size: f64, k: f64) -> f64 {
        let k = sanitize_zoom(k);
        let base = if base_size.is_finite() { base_size.max(0.0) } else { 0.0 };
        let compressed = base.powf(self.radius_power);
        let screen = compressed * self.radius_scale * k.powf(self.zoom_exponent);
        clamp_range(screen, self.min_screen_px, self.max_screen_px) / k
    }

    pub fn stroke_width(&self, base: f64, k: f64) -> f64 {
        let k = sanitize_zoom(k);
        clamp_range(base / k, self.min_stroke_px, self.max_stroke_px)
    }

    pub fn font_size(&self, base: f64, k: f64, use_sqrt: bool) -> f64 {
        let k = sanitize_zoom(k);
        let exponent = if use_sqrt { -0.5 } else { -1.0 };
        clamp_range(base * k.powf(exponent), self.min_font_px, self.max_font_px)
    }

    pub fn dash_pattern(&self, k: f64) -> DashPattern {
        let k = sanitize_zoom(k);
        DashPattern {
            pattern: format!("{} {}", self.dash_px / k, self.gap_px / k),
            cycle_px: self.dash_px + self.gap_px,
        }
    }
}

/// One relaxation pass over all pairs. Overlapping circles are pushed apart
/// along the line between their centers, each by half the overlap, capped
/// at `max_shift`. Dense clusters may still overlap afterwards.
pub fn resolve_overlaps(nodes: &[OverlapNode], padding: f64, max_shift: f64) -> Vec<OverlapNode> {
    let mut resolved = nodes.to_vec();
    let max_shift = max_shift.max(0.0);
    for i in 0..resolved.len() {
        for j in (i + 1)..resolved.len() {
            let (a, b) = (resolved[i], resolved[j]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let distance = (dx * dx + dy * dy).sqrt();
            let min_distance = a.radius + b.radius + padding;
            if distance >= min_distance {
                continue;
            }
            // Coincident centers have no direction; separate along x.
            let (ux, uy) = if distance <= f64::EPSILON {
                (1.0, 0.0)
            } else {
                (dx / distance, dy / distance)
            };
            let shift = ((min_distance - distance) / 2.0).min(max_shift);
            resolved[i].x -= ux * shift;
            resolved[i].y -= uy * shift;
            resolved[j].x += ux * shift;
            resolved[j].y += uy * shift;
        }
    }
    resolved
}
