//! Sérialisation SVG d'une frame de la frise

use super::timeline::{DrawOp, Frame, LabelKind, Point, PointClass, Stroke};
use std::fmt::Write;

const BACKGROUND: &str = "#1f2937";
const GRID: &str = "#374151";
const THRESHOLD: &str = "#f97316";
const SCORE_LINE: &str = "#00d4ff";
const SCORE_FILL: &str = "rgba(0,212,255,0.1)";
const ANOMALY: &str = "#ef4444";
const LABEL: &str = "#9ca3af";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Document SVG autonome, en pixels physiques
pub fn to_svg(frame: &Frame) -> String {
    let device = frame.to_device();
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.2} {h:.2}">"#,
        w = device.width,
        h = device.height
    );

    for op in &device.ops {
        let _ = match op {
            DrawOp::Background { width, height } => writeln!(
                out,
                r#"  <rect x="0" y="0" width="{:.2}" height="{:.2}" fill="{}"/>"#,
                width, height, BACKGROUND
            ),
            DrawOp::Line { from, to, stroke } => {
                let (color, width, dash) = match stroke {
                    Stroke::Grid => (GRID, 1, "2 2"),
                    Stroke::Threshold => (THRESHOLD, 2, "5 5"),
                };
                writeln!(
                    out,
                    r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-dasharray="{}"/>"#,
                    from.x, from.y, to.x, to.y, color, width, dash
                )
            }
            DrawOp::Polyline { points } => writeln!(
                out,
                r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                points_attr(points),
                SCORE_LINE
            ),
            DrawOp::Fill { points } => writeln!(
                out,
                r#"  <polygon points="{}" fill="{}"/>"#,
                points_attr(points),
                SCORE_FILL
            ),
            DrawOp::Marker {
                center,
                radius,
                class,
            } => {
                let color = match class {
                    PointClass::Anomaly => ANOMALY,
                    PointClass::Normal => SCORE_LINE,
                };
                writeln!(
                    out,
                    r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
                    center.x, center.y, radius, color
                )
            }
            DrawOp::Label { at, text, kind } => {
                let (color, size) = match kind {
                    LabelKind::Threshold => (THRESHOLD, 12),
                    LabelKind::Axis => (LABEL, 11),
                };
                writeln!(
                    out,
                    r#"  <text x="{:.2}" y="{:.2}" fill="{}" font-family="monospace" font-size="{}">{}</text>"#,
                    at.x,
                    at.y,
                    color,
                    size as f64 * frame.scale,
                    escape(text)
                )
            }
        };
    }

    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::timeline::TimelineRenderer;

    #[test]
    fn test_svg_contains_all_layers() {
        let frame = TimelineRenderer::default().render(&[0.2, 0.95, 0.4], 0.6);
        let svg = to_svg(&frame);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches(ANOMALY).count(), 1);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("Threshold: 0.60"));
    }

    #[test]
    fn test_svg_of_empty_frame_has_no_series() {
        let svg = to_svg(&TimelineRenderer::default().render(&[], 0.6));
        assert!(!svg.contains("<polyline"));
        assert!(!svg.contains("<circle"));
        assert_eq!(svg.matches("<line").count(), 16);
    }

    #[test]
    fn test_svg_uses_device_pixels() {
        let frame = TimelineRenderer::new(100.0, 100.0)
            .with_device_pixel_ratio(2.0)
            .render(&[], 0.6);
        let svg = to_svg(&frame);
        assert!(svg.contains(r#"width="200""#));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & c"), "a &lt; b &amp; c");
    }
}
