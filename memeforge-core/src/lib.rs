//! # Memeforge Core
//!
//! Layer model and direct-manipulation engine for a meme / comic canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               memeforge-core                │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  Interaction Engine      │
//! │  - Layers        │  - Hit-testing           │
//! │  - Selection     │  - Drag / resize         │
//! │  - Persistence   │  - Rotation              │
//! ├─────────────────────────────────────────────┤
//! │  Geometry        │  Property edits          │
//! │  - Local frames  │  - Style fields          │
//! │  - Handles       │  - Rotation text field   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The crate does not draw. Renderers implement [`TextMeasure`] and
//! [`ImageSizes`] so that layer geometry derived here matches what they
//! paint.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod handles;
pub mod interaction;
pub mod layer;
pub mod layer_list;
pub mod properties;

pub use color::Color;
pub use document::{Document, DEFAULT_BACKGROUND, DEFAULT_IMAGE_SIZE, DEFAULT_TEXT_POSITION};
pub use error::{LayerError, LayerResult};
pub use event::{PointerEvent, PointerPhase};
pub use geometry::{angle_from, from_local_frame, rotate_vector, to_local_frame, Point, Rect};
pub use handles::{Corner, HandleConfig, LayerGeometry, LayerShape, Metrics};
pub use interaction::{DragState, HitTarget, InteractionEngine, ResizeMode};
pub use layer::{
    FontSpec, ImageLayer, ImageSizes, Layer, LayerId, LayerKind, NoImages, TextLayer, TextMeasure,
};
pub use layer_list::{display_to_store, store_to_display, LayerListEntry, MoveDirection};
pub use properties::{LayerEdit, RotationField};

/// Memeforge core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
