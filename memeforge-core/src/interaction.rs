//! Pointer-driven direct manipulation.
//!
//! [`InteractionEngine`] is a four-state machine (idle, dragging, resizing,
//! rotating). Pointer-down picks a target: handles of the selected layer
//! first, then layer bodies topmost-first. Pointer-move updates the subject
//! layer. Pointer-up always returns to idle.
//!
//! Hit-testing happens in each layer's un-rotated local frame; see
//! [`LayerGeometry::to_local`].

use crate::document::Document;
use crate::event::{PointerEvent, PointerPhase};
use crate::geometry::{angle_from, rotate_vector, Point};
use crate::handles::{Corner, HandleConfig, LayerGeometry, LayerShape, Metrics};
use crate::layer::{LayerId, LayerKind};

/// How a resize maps pointer motion onto the layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeMode {
    /// Image corner drag; `anchor` is the world position of the opposite
    /// corner, held fixed for the whole drag.
    Corner {
        /// Corner being dragged.
        corner: Corner,
        /// Fixed opposite corner, in canvas space.
        anchor: Point,
    },
    /// Text resize handle; horizontal motion scales the font.
    FontScale {
        /// Font size at pointer-down.
        start_font_size: f32,
        /// Pointer x at pointer-down.
        start_pointer_x: f32,
    },
}

/// Current interaction mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    /// No interaction in progress.
    #[default]
    Idle,
    /// Moving a layer.
    Dragging {
        /// Subject layer.
        layer: LayerId,
        /// Pointer position minus layer `(x, y)` at grab time.
        grab_offset: Point,
    },
    /// Resizing a layer.
    Resizing {
        /// Subject layer.
        layer: LayerId,
        /// Resize mode and captured start values.
        mode: ResizeMode,
    },
    /// Rotating a layer around its pivot.
    Rotating {
        /// Subject layer.
        layer: LayerId,
        /// Pivot captured at grab time.
        center: Point,
        /// Layer rotation at grab time, in degrees.
        start_rotation: f32,
        /// Pointer angle from the pivot at grab time, in degrees.
        start_pointer_angle: f32,
    },
}

impl DragState {
    /// Layer currently being manipulated.
    #[must_use]
    pub fn layer(&self) -> Option<&LayerId> {
        match self {
            Self::Idle => None,
            Self::Dragging { layer, .. }
            | Self::Resizing { layer, .. }
            | Self::Rotating { layer, .. } => Some(layer),
        }
    }

    /// Whether no interaction is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// Rotate handle of the selected layer.
    RotateHandle(LayerId),
    /// Corner handle of the selected image layer.
    CornerHandle(LayerId, Corner),
    /// Font-size handle of the selected text layer.
    TextResizeHandle(LayerId),
    /// Body of a layer (topmost hit).
    Body(LayerId),
    /// Empty canvas.
    Miss,
}

/// The direct-manipulation state machine.
#[derive(Debug, Clone, Default)]
pub struct InteractionEngine {
    state: DragState,
    config: HandleConfig,
}

impl InteractionEngine {
    /// Create an idle engine with the given handle configuration.
    #[must_use]
    pub fn new(config: HandleConfig) -> Self {
        Self {
            state: DragState::Idle,
            config,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Handle configuration.
    #[must_use]
    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Find what lies under `p` without changing any state.
    #[must_use]
    pub fn hit_test(&self, doc: &Document, metrics: Metrics<'_>, p: Point) -> HitTarget {
        if let Some(target) = self.hit_selected_handles(doc, metrics, p) {
            return target;
        }
        doc.layers()
            .iter()
            .rev()
            .find(|layer| {
                let geometry = LayerGeometry::of(layer, metrics);
                geometry.body().contains(geometry.to_local(p))
            })
            .map_or(HitTarget::Miss, |layer| HitTarget::Body(layer.id.clone()))
    }

    fn hit_selected_handles(
        &self,
        doc: &Document,
        metrics: Metrics<'_>,
        p: Point,
    ) -> Option<HitTarget> {
        let layer = doc.selected_layer()?;
        let geometry = LayerGeometry::of(layer, metrics);
        let local = geometry.to_local(p);
        let cfg = &self.config;

        if local.is_within(geometry.rotate_handle(cfg), cfg.rotate_hit_radius) {
            return Some(HitTarget::RotateHandle(layer.id.clone()));
        }
        match geometry.shape {
            LayerShape::Image { .. } => Corner::ALL.into_iter().find_map(|corner| {
                geometry
                    .corner(corner)
                    .filter(|c| local.is_within(*c, cfg.corner_hit_radius))
                    .map(|_| HitTarget::CornerHandle(layer.id.clone(), corner))
            }),
            LayerShape::Text { .. } => geometry
                .text_resize_handle(cfg)
                .filter(|h| local.is_within(*h, cfg.text_resize_hit_radius))
                .map(|_| HitTarget::TextResizeHandle(layer.id.clone())),
        }
    }

    /// Pointer pressed at `p`.
    ///
    /// Returns `None` (and does nothing) if an interaction is already in
    /// progress. Otherwise updates the selection, enters the matching state
    /// and returns what was hit.
    pub fn pointer_down(
        &mut self,
        doc: &mut Document,
        metrics: Metrics<'_>,
        p: Point,
    ) -> Option<HitTarget> {
        if !self.state.is_idle() {
            tracing::debug!("Ignoring pointer-down while {:?}", self.state);
            return None;
        }

        let target = self.hit_test(doc, metrics, p);
        self.state = match &target {
            HitTarget::RotateHandle(id) => Self::start_rotation(doc, metrics, id, p),
            HitTarget::CornerHandle(id, corner) => Self::start_corner_resize(doc, metrics, id, *corner),
            HitTarget::TextResizeHandle(id) => Self::start_font_scale(doc, id, p),
            HitTarget::Body(id) => {
                doc.select(id);
                doc.get(id).map_or(DragState::Idle, |layer| DragState::Dragging {
                    layer: id.clone(),
                    grab_offset: p - Point::new(layer.x, layer.y),
                })
            }
            HitTarget::Miss => {
                doc.clear_selection();
                DragState::Idle
            }
        };
        tracing::debug!("Pointer down at ({}, {}): {:?}", p.x, p.y, self.state);
        Some(target)
    }

    fn start_rotation(doc: &Document, metrics: Metrics<'_>, id: &LayerId, p: Point) -> DragState {
        doc.get(id).map_or(DragState::Idle, |layer| {
            let center = LayerGeometry::of(layer, metrics).pivot;
            DragState::Rotating {
                layer: id.clone(),
                center,
                start_rotation: layer.rotation_deg(),
                start_pointer_angle: angle_from(center, p),
            }
        })
    }

    fn start_corner_resize(
        doc: &Document,
        metrics: Metrics<'_>,
        id: &LayerId,
        corner: Corner,
    ) -> DragState {
        doc.get(id)
            .map(|layer| LayerGeometry::of(layer, metrics))
            .and_then(|geometry| {
                let local_anchor = geometry.corner(corner.opposite())?;
                Some(DragState::Resizing {
                    layer: id.clone(),
                    mode: ResizeMode::Corner {
                        corner,
                        anchor: geometry.to_world(local_anchor),
                    },
                })
            })
            .unwrap_or_default()
    }

    fn start_font_scale(doc: &Document, id: &LayerId, p: Point) -> DragState {
        doc.get(id)
            .and_then(|layer| layer.as_text())
            .map_or(DragState::Idle, |text| DragState::Resizing {
                layer: id.clone(),
                mode: ResizeMode::FontScale {
                    start_font_size: text.font_size,
                    start_pointer_x: p.x,
                },
            })
    }

    /// Pointer moved to `p`. Returns `true` if a layer changed.
    ///
    /// If the subject layer no longer exists the interaction is abandoned
    /// and the engine returns to idle.
    pub fn pointer_move(&mut self, doc: &mut Document, p: Point) -> bool {
        let Some(id) = self.state.layer().cloned() else {
            return false;
        };
        let cfg = self.config;
        let state = &self.state;
        let changed = doc.update(&id, |layer| match state {
            DragState::Idle => {}
            DragState::Dragging { grab_offset, .. } => {
                layer.x = p.x - grab_offset.x;
                layer.y = p.y - grab_offset.y;
            }
            DragState::Rotating {
                center,
                start_rotation,
                start_pointer_angle,
                ..
            } => {
                layer.rotation = Some(start_rotation + (angle_from(*center, p) - start_pointer_angle));
            }
            DragState::Resizing { mode, .. } => {
                let rotation = layer.rotation_deg();
                match (mode, &mut layer.kind) {
                    (ResizeMode::Corner { corner, anchor }, LayerKind::Image(image)) => {
                        let (sx, sy) = corner.sign();
                        let local = rotate_vector(p - *anchor, -rotation);
                        let width = (sx * local.x).max(cfg.min_size);
                        let height = (sy * local.y).max(cfg.min_size);
                        let center = *anchor
                            + rotate_vector(Point::new(sx * width / 2.0, sy * height / 2.0), rotation);
                        layer.x = center.x - width / 2.0;
                        layer.y = center.y - height / 2.0;
                        image.width = Some(width);
                        image.height = Some(height);
                    }
                    (
                        ResizeMode::FontScale {
                            start_font_size,
                            start_pointer_x,
                        },
                        LayerKind::Text(text),
                    ) => {
                        text.font_size = (start_font_size
                            + (p.x - start_pointer_x) / cfg.font_scale_divisor)
                            .max(cfg.min_font_size);
                    }
                    _ => {}
                }
            }
        });
        if !changed {
            tracing::debug!("Layer {id} vanished mid-interaction, returning to idle");
            self.state = DragState::Idle;
        }
        changed
    }

    /// Pointer released. Always returns to idle.
    pub fn pointer_up(&mut self) {
        if !self.state.is_idle() {
            tracing::debug!("Pointer up, leaving {:?}", self.state);
        }
        self.state = DragState::Idle;
    }

    /// Dispatch a pointer event. Returns `true` if the document changed
    /// in a way that needs a repaint.
    pub fn handle(&mut self, doc: &mut Document, metrics: Metrics<'_>, event: &PointerEvent) -> bool {
        let p = event.position();
        match event.phase {
            PointerPhase::Down => {
                let before = doc.selected().cloned();
                self.pointer_down(doc, metrics, p).is_some() && doc.selected() != before.as_ref()
            }
            PointerPhase::Move => self.pointer_move(doc, p),
            PointerPhase::Up | PointerPhase::Cancel => {
                self.pointer_up();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FontSpec, Layer, NoImages, TextMeasure};

    struct HalfEm;

    impl TextMeasure for HalfEm {
        #[allow(clippy::cast_precision_loss)]
        fn measure_text(&self, text: &str, font: &FontSpec) -> Option<f32> {
            Some(text.chars().count() as f32 * font.size * 0.5)
        }
    }

    fn metrics() -> Metrics<'static> {
        Metrics::new(&HalfEm, &NoImages)
    }

    fn doc_with_image() -> (Document, LayerId) {
        let mut doc = Document::new();
        let id = doc.add_layer(Layer::image("a", 0.0, 0.0).with_size(100.0, 100.0));
        (doc, id)
    }

    #[test]
    fn test_click_empty_canvas_clears_selection() {
        let (mut doc, _) = doc_with_image();
        let mut engine = InteractionEngine::default();
        let hit = engine.pointer_down(&mut doc, metrics(), Point::new(500.0, 500.0));
        assert_eq!(hit, Some(HitTarget::Miss));
        assert!(doc.selected().is_none());
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_drag_moves_layer() {
        let (mut doc, id) = doc_with_image();
        doc.clear_selection();
        let mut engine = InteractionEngine::default();
        let hit = engine.pointer_down(&mut doc, metrics(), Point::new(50.0, 50.0));
        assert_eq!(hit, Some(HitTarget::Body(id.clone())));
        assert_eq!(doc.selected(), Some(&id));
        assert!(engine.pointer_move(&mut doc, Point::new(70.0, 45.0)));
        let layer = doc.get(&id).expect("layer");
        assert!((layer.x - 20.0).abs() < f32::EPSILON);
        assert!((layer.y + 5.0).abs() < f32::EPSILON);
        engine.pointer_up();
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_pointer_down_ignored_while_busy() {
        let (mut doc, _) = doc_with_image();
        let mut engine = InteractionEngine::default();
        engine.pointer_down(&mut doc, metrics(), Point::new(50.0, 50.0));
        assert!(engine
            .pointer_down(&mut doc, metrics(), Point::new(500.0, 500.0))
            .is_none());
        assert!(doc.selected().is_some());
    }

    #[test]
    fn test_rotate_handle_only_on_selected_layer() {
        let (mut doc, id) = doc_with_image();
        let engine = InteractionEngine::default();
        // Rotate handle sits 22px below the bottom edge.
        let handle = Point::new(50.0, 122.0);
        assert_eq!(
            engine.hit_test(&doc, metrics(), handle),
            HitTarget::RotateHandle(id.clone())
        );
        doc.clear_selection();
        assert_eq!(engine.hit_test(&doc, metrics(), handle), HitTarget::Miss);
    }

    #[test]
    fn test_rotation_follows_pointer_angle() {
        let (mut doc, id) = doc_with_image();
        let mut engine = InteractionEngine::default();
        // Pivot (50, 50); handle straight below at 90 degrees.
        engine.pointer_down(&mut doc, metrics(), Point::new(50.0, 122.0));
        assert!(matches!(engine.state(), DragState::Rotating { .. }));
        // Move to the left of the pivot: 180 degrees.
        engine.pointer_move(&mut doc, Point::new(0.0, 50.0));
        let rotation = doc.get(&id).expect("layer").rotation_deg();
        assert!((rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_is_unbounded() {
        let mut doc = Document::new();
        let id = doc.add_layer(
            Layer::image("a", 0.0, 0.0)
                .with_size(100.0, 100.0)
                .with_rotation(350.0),
        );
        let mut engine = InteractionEngine::default();
        let handle = LayerGeometry::of(doc.get(&id).expect("layer"), metrics());
        let world = handle.to_world(handle.rotate_handle(engine.config()));
        engine.pointer_down(&mut doc, metrics(), world);
        // Sweep a quarter turn clockwise around the pivot.
        let pivot = handle.pivot;
        let swept = pivot + rotate_vector(world - pivot, 90.0);
        engine.pointer_move(&mut doc, swept);
        let rotation = doc.get(&id).expect("layer").rotation_deg();
        assert!((rotation - 440.0).abs() < 1e-2);
    }

    #[test]
    fn test_font_scale_resize() {
        let mut doc = Document::new();
        let id = doc.add_layer(Layer::text("Hi", 20.0, 40.0).with_font_size(32.0));
        let mut engine = InteractionEngine::default();
        // Text width 32, handle at (20 + 32 + 8, 40 - 16).
        let hit = engine.pointer_down(&mut doc, metrics(), Point::new(60.0, 24.0));
        assert_eq!(hit, Some(HitTarget::TextResizeHandle(id.clone())));
        engine.pointer_move(&mut doc, Point::new(80.0, 0.0));
        let size = doc.get(&id).and_then(|l| l.as_text()).expect("text").font_size;
        assert!((size - 42.0).abs() < f32::EPSILON);
        engine.pointer_move(&mut doc, Point::new(-1000.0, 0.0));
        let size = doc.get(&id).and_then(|l| l.as_text()).expect("text").font_size;
        assert!((size - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_corner_resize_clamps_to_minimum() {
        let (mut doc, id) = doc_with_image();
        let mut engine = InteractionEngine::default();
        engine.pointer_down(&mut doc, metrics(), Point::new(100.0, 100.0));
        engine.pointer_move(&mut doc, Point::new(-300.0, -300.0));
        let layer = doc.get(&id).expect("layer");
        let image = layer.as_image().expect("image");
        assert_eq!(image.width, Some(10.0));
        assert_eq!(image.height, Some(10.0));
        assert!(layer.x.abs() < f32::EPSILON && layer.y.abs() < f32::EPSILON);
    }

    #[test]
    fn test_top_left_resize_keeps_bottom_right() {
        let (mut doc, id) = doc_with_image();
        let mut engine = InteractionEngine::default();
        let hit = engine.pointer_down(&mut doc, metrics(), Point::new(0.0, 0.0));
        assert_eq!(hit, Some(HitTarget::CornerHandle(id.clone(), Corner::TopLeft)));
        engine.pointer_move(&mut doc, Point::new(-20.0, 30.0));
        let layer = doc.get(&id).expect("layer");
        let image = layer.as_image().expect("image");
        assert_eq!(image.width, Some(120.0));
        assert_eq!(image.height, Some(70.0));
        assert!((layer.x + 20.0).abs() < 1e-4);
        assert!((layer.y - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_deleted_layer_aborts_interaction() {
        let (mut doc, id) = doc_with_image();
        let mut engine = InteractionEngine::default();
        engine.pointer_down(&mut doc, metrics(), Point::new(50.0, 50.0));
        doc.delete(&id);
        assert!(!engine.pointer_move(&mut doc, Point::new(60.0, 60.0)));
        assert!(engine.state().is_idle());
        engine.pointer_up();
    }

    #[test]
    fn test_handle_dispatch() {
        let (mut doc, id) = doc_with_image();
        doc.clear_selection();
        let mut engine = InteractionEngine::default();
        assert!(engine.handle(&mut doc, metrics(), &PointerEvent::down(10.0, 10.0)));
        assert!(engine.handle(&mut doc, metrics(), &PointerEvent::moved(20.0, 10.0)));
        assert!(!engine.handle(&mut doc, metrics(), &PointerEvent::up(20.0, 10.0)));
        assert!((doc.get(&id).expect("layer").x - 10.0).abs() < f32::EPSILON);
        assert!(!engine.handle(&mut doc, metrics(), &PointerEvent::moved(90.0, 90.0)));
    }
}
