//! Rendu de la frise des scores d'anomalie

pub mod svg;
pub mod timeline;

pub use svg::to_svg;
pub use timeline::{DrawOp, Frame, LabelKind, Point, PointClass, Stroke, TimelineRenderer};
