//! Calcul des primitives de dessin de la frise des scores d'anomalie
//!
//! Le rendu est une fonction pure de `(scores, seuil, dimensions)` : aucune
//! lecture du store, aucun état conservé entre deux appels.

/// Nombre maximal de scores tracés, pris à la fin de l'historique
pub const MAX_PLOTTED_POINTS: usize = 100;
pub const DEFAULT_PADDING: f64 = 40.0;
pub const ANOMALY_RADIUS: f64 = 4.0;
pub const NORMAL_RADIUS: f64 = 2.0;

const HORIZONTAL_GRID_LINES: usize = 4;
const VERTICAL_GRID_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Grid,
    Threshold,
}

/// Classement d'un point par rapport au seuil courant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    Normal,
    Anomaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Threshold,
    Axis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Background { width: f64, height: f64 },
    Line { from: Point, to: Point, stroke: Stroke },
    Polyline { points: Vec<Point> },
    Fill { points: Vec<Point> },
    Marker { center: Point, radius: f64, class: PointClass },
    Label { at: Point, text: String, kind: LabelKind },
}

impl DrawOp {
    fn scaled(&self, factor: f64) -> DrawOp {
        let scale_all = |points: &[Point]| points.iter().map(|p| p.scaled(factor)).collect();
        match self {
            DrawOp::Background { width, height } => DrawOp::Background {
                width: width * factor,
                height: height * factor,
            },
            DrawOp::Line { from, to, stroke } => DrawOp::Line {
                from: from.scaled(factor),
                to: to.scaled(factor),
                stroke: *stroke,
            },
            DrawOp::Polyline { points } => DrawOp::Polyline {
                points: scale_all(points),
            },
            DrawOp::Fill { points } => DrawOp::Fill {
                points: scale_all(points),
            },
            DrawOp::Marker {
                center,
                radius,
                class,
            } => DrawOp::Marker {
                center: center.scaled(factor),
                radius: radius * factor,
                class: *class,
            },
            DrawOp::Label { at, text, kind } => DrawOp::Label {
                at: at.scaled(factor),
                text: text.clone(),
                kind: *kind,
            },
        }
    }
}

/// Liste ordonnée de primitives en coordonnées logiques
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    /// Rapport pixels physiques / pixels logiques
    pub scale: f64,
    pub ops: Vec<DrawOp>,
}

impl Frame {
    /// Même frame exprimée en pixels physiques
    pub fn to_device(&self) -> Frame {
        Frame {
            width: self.width * self.scale,
            height: self.height * self.scale,
            scale: 1.0,
            ops: self.ops.iter().map(|op| op.scaled(self.scale)).collect(),
        }
    }

    pub fn polyline(&self) -> Option<&[Point]> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Polyline { points } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn markers(&self) -> Vec<(Point, PointClass)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Marker { center, class, .. } => Some((*center, *class)),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self, stroke: Stroke) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { stroke: s, .. } if *s == stroke))
            .count()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRenderer {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub device_pixel_ratio: f64,
}

impl TimelineRenderer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: DEFAULT_PADDING,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn chart_width(&self) -> f64 {
        (self.width - 2.0 * self.padding).max(0.0)
    }

    pub fn chart_height(&self) -> f64 {
        (self.height - 2.0 * self.padding).max(0.0)
    }

    /// Abscisse du i-ème de n points ; un point unique est placé sur la marge gauche
    pub fn x_at(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.padding;
        }
        self.padding + index as f64 * self.chart_width() / (count - 1) as f64
    }

    /// Ordonnée d'un score, sans écrêtage hors de [0, 1]
    pub fn y_at(&self, score: f64) -> f64 {
        self.height - self.padding - score * self.chart_height()
    }

    pub fn render(&self, scores: &[f64], threshold: f64) -> Frame {
        let mut ops = vec![DrawOp::Background {
            width: self.width,
            height: self.height,
        }];
        self.push_grid(&mut ops);

        if scores.is_empty() {
            return self.frame(ops);
        }

        let baseline = self.height - self.padding;
        let right = self.width - self.padding;

        let threshold_y = self.y_at(threshold);
        ops.push(DrawOp::Line {
            from: Point::new(self.padding, threshold_y),
            to: Point::new(right, threshold_y),
            stroke: Stroke::Threshold,
        });
        ops.push(DrawOp::Label {
            at: Point::new(self.padding + 5.0, threshold_y - 5.0),
            text: format!("Threshold: {:.2}", threshold),
            kind: LabelKind::Threshold,
        });

        let recent = &scores[scores.len().saturating_sub(MAX_PLOTTED_POINTS)..];
        let points: Vec<Point> = recent
            .iter()
            .enumerate()
            .map(|(i, &score)| Point::new(self.x_at(i, recent.len()), self.y_at(score)))
            .collect();

        if points.len() > 1 {
            ops.push(DrawOp::Polyline {
                points: points.clone(),
            });

            let mut area = Vec::with_capacity(points.len() + 2);
            area.push(Point::new(self.padding, baseline));
            area.extend(points.iter().copied());
            area.push(Point::new(right, baseline));
            ops.push(DrawOp::Fill { points: area });
        }

        for (point, &score) in points.iter().zip(recent) {
            // Même comparaison qu'à l'ingestion, mais avec le seuil courant
            let (radius, class) = if score >= threshold {
                (ANOMALY_RADIUS, PointClass::Anomaly)
            } else {
                (NORMAL_RADIUS, PointClass::Normal)
            };
            ops.push(DrawOp::Marker {
                center: *point,
                radius,
                class,
            });
        }

        self.push_axis_labels(&mut ops);
        self.frame(ops)
    }

    fn frame(&self, ops: Vec<DrawOp>) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            scale: self.device_pixel_ratio,
            ops,
        }
    }

    fn push_grid(&self, ops: &mut Vec<DrawOp>) {
        let right = self.width - self.padding;
        let bottom = self.height - self.padding;

        for i in 0..=HORIZONTAL_GRID_LINES {
            let y = self.padding + i as f64 * self.chart_height() / HORIZONTAL_GRID_LINES as f64;
            ops.push(DrawOp::Line {
                from: Point::new(self.padding, y),
                to: Point::new(right, y),
                stroke: Stroke::Grid,
            });
        }

        for i in 0..=VERTICAL_GRID_LINES {
            let x = self.padding + i as f64 * self.chart_width() / VERTICAL_GRID_LINES as f64;
            ops.push(DrawOp::Line {
                from: Point::new(x, self.padding),
                to: Point::new(x, bottom),
                stroke: Stroke::Grid,
            });
        }
    }

    fn push_axis_labels(&self, ops: &mut Vec<DrawOp>) {
        for i in 0..=HORIZONTAL_GRID_LINES {
            let value = 1.0 - i as f64 / HORIZONTAL_GRID_LINES as f64;
            let y = self.padding + i as f64 * self.chart_height() / HORIZONTAL_GRID_LINES as f64;
            ops.push(DrawOp::Label {
                at: Point::new(5.0, y + 4.0),
                text: format!("{:.2}", value),
                kind: LabelKind::Axis,
            });
        }

        ops.push(DrawOp::Label {
            at: Point::new(self.width / 2.0 - 20.0, self.height - 5.0),
            text: "Time →".to_string(),
            kind: LabelKind::Axis,
        });
        ops.push(DrawOp::Label {
            at: Point::new(5.0, 15.0),
            text: "Anomaly Score ↑".to_string(),
            kind: LabelKind::Axis,
        });
    }
}

impl Default for TimelineRenderer {
    fn default() -> Self {
        Self::new(840.0, 280.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "attendu {}, obtenu {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_empty_scores_draw_grid_only() {
        let frame = TimelineRenderer::default().render(&[], 0.6);

        assert!(matches!(frame.ops[0], DrawOp::Background { .. }));
        assert_eq!(frame.lines(Stroke::Grid), 16);
        assert_eq!(frame.lines(Stroke::Threshold), 0);
        assert!(frame.polyline().is_none());
        assert!(frame.markers().is_empty());
        assert_eq!(frame.ops.len(), 17);
    }

    #[test]
    fn test_single_score_draws_point_without_line() {
        let frame = TimelineRenderer::default().render(&[0.7], 0.6);

        assert!(frame.polyline().is_none());
        assert!(!frame.ops.iter().any(|op| matches!(op, DrawOp::Fill { .. })));
        let markers = frame.markers();
        assert_eq!(markers.len(), 1);
        assert_close(markers[0].0.x, 40.0);
        assert_close(markers[0].0.y, 240.0 - 0.7 * 200.0);
        assert_eq!(markers[0].1, PointClass::Anomaly);
    }

    #[test]
    fn test_uniform_spacing_for_small_counts() {
        let renderer = TimelineRenderer::default();
        let expected: [&[f64]; 4] = [
            &[40.0, 800.0],
            &[40.0, 420.0, 800.0],
            &[40.0, 40.0 + 760.0 / 3.0, 40.0 + 1520.0 / 3.0, 800.0],
            &[40.0, 230.0, 420.0, 610.0, 800.0],
        ];

        for xs in expected {
            let scores = vec![0.5; xs.len()];
            let frame = renderer.render(&scores, 0.6);
            let points = frame.polyline().unwrap();
            assert_eq!(points.len(), xs.len());
            for (point, x) in points.iter().zip(xs) {
                assert_close(point.x, *x);
                assert_close(point.y, 140.0);
            }
        }
    }

    #[test]
    fn test_only_last_hundred_scores_are_plotted() {
        let scores: Vec<f64> = (0..200).map(|i| if i < 100 { 1.0 } else { 0.0 }).collect();
        let frame = TimelineRenderer::default().render(&scores, 0.6);

        let points = frame.polyline().unwrap();
        assert_eq!(points.len(), MAX_PLOTTED_POINTS);
        assert!(points.iter().all(|p| (p.y - 240.0).abs() < 1e-9));
    }

    #[test]
    fn test_points_follow_current_threshold() {
        let renderer = TimelineRenderer::default();
        let scores = [0.5, 0.65];

        let strict = renderer.render(&scores, 0.6);
        let classes: Vec<PointClass> = strict.markers().iter().map(|m| m.1).collect();
        assert_eq!(classes, vec![PointClass::Normal, PointClass::Anomaly]);

        let relaxed = renderer.render(&scores, 0.5);
        let classes: Vec<PointClass> = relaxed.markers().iter().map(|m| m.1).collect();
        assert_eq!(classes, vec![PointClass::Anomaly, PointClass::Anomaly]);
    }

    #[test]
    fn test_threshold_line_and_labels() {
        let frame = TimelineRenderer::default().render(&[0.2, 0.3], 0.6);

        let threshold = frame.ops.iter().find_map(|op| match op {
            DrawOp::Line {
                from,
                to,
                stroke: Stroke::Threshold,
            } => Some((*from, *to)),
            _ => None,
        });
        let (from, to) = threshold.unwrap();
        assert_close(from.y, 120.0);
        assert_close(to.x, 800.0);

        let labels = frame.labels();
        assert!(labels.contains(&"Threshold: 0.60"));
        assert!(labels.contains(&"1.00"));
        assert!(labels.contains(&"0.25"));
        assert!(labels.contains(&"Time →"));
    }

    #[test]
    fn test_out_of_range_scores_are_not_clamped() {
        let renderer = TimelineRenderer::default();
        assert_close(renderer.y_at(1.5), -60.0);
        assert_close(renderer.y_at(-0.5), 340.0);
    }

    #[test]
    fn test_device_scaling() {
        let frame = TimelineRenderer::default()
            .with_device_pixel_ratio(2.0)
            .render(&[0.9], 0.6);
        let device = frame.to_device();

        assert_close(device.width, 1680.0);
        assert_eq!(device.scale, 1.0);
        let marker = device.ops.iter().find_map(|op| match op {
            DrawOp::Marker { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        });
        let (center, radius) = marker.unwrap();
        assert_close(center.x, 80.0);
        assert_close(radius, ANOMALY_RADIUS * 2.0);
    }

    #[test]
    fn test_tiny_viewport_clamps_chart() {
        let renderer = TimelineRenderer::new(50.0, 50.0);
        assert_eq!(renderer.chart_width(), 0.0);
        assert_eq!(renderer.chart_height(), 0.0);
        let frame = renderer.render(&[0.1, 0.2], 0.6);
        assert_eq!(frame.polyline().unwrap().len(), 2);
    }
}
