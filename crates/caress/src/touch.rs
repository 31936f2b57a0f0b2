//! Touch points and the surface they are projected onto.
//!
//! The rendering side owns the mapping from a normalized position to window,
//! page and screen coordinates and to a UI target; [TouchSurface] is that
//! boundary. [Viewport] is the plain implementation with no hit testing.

use serde::Serialize;
use tuio::EntityKind;

/// Opaque handle of the UI element a touch started on.
pub type TargetId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn scale(&self, x: f32, y: f32) -> (f32, f32) {
        (self.width * x, self.height * y)
    }
}

/// Coordinates of one normalized position on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub client: (f32, f32),
    pub page: (f32, f32),
    pub screen: (f32, f32),
    pub target: Option<TargetId>,
}

/// Resolves normalized TUIO positions to surface coordinates and targets.
pub trait TouchSurface {
    fn locate(&self, x: f32, y: f32) -> SurfacePoint;

    fn screen_size(&self) -> Size;

    /// Radius reported for contacts that carry no shape (cursors, objects).
    fn contact_radius(&self) -> f32 {
        1.0
    }
}

/// Window, document and screen sizes; every touch resolves to no target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub window: Size,
    pub document: Size,
    pub screen: Size,
}

impl Viewport {
    /// A viewport whose window, document and screen all have the same size.
    pub fn new(width: f32, height: f32) -> Self {
        let size = Size::new(width, height);
        Self {
            window: size,
            document: size,
            screen: size,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1920.0, 1080.0)
    }
}

impl TouchSurface for Viewport {
    fn locate(&self, x: f32, y: f32) -> SurfacePoint {
        SurfacePoint {
            client: self.window.scale(x, y),
            page: self.document.scale(x, y),
            screen: self.screen.scale(x, y),
            target: None,
        }
    }

    fn screen_size(&self) -> Size {
        self.screen
    }
}

/// Renderer-facing projection of a tracked entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    /// The entity's session id.
    pub identifier: i32,
    pub source: String,
    pub kind: EntityKind,
    /// Normalized position in [0, 1].
    pub x_position: f32,
    pub y_position: f32,
    pub client_x: f32,
    pub client_y: f32,
    pub page_x: f32,
    pub page_y: f32,
    pub screen_x: f32,
    pub screen_y: f32,
    pub target: Option<TargetId>,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Degrees.
    pub rotation_angle: f32,
    pub force: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i32>,
}
