//! Tracked TUIO entities and their projection to touch points.

use crate::touch::{TouchPoint, TouchSurface};
use tuio::{Blob2D, Cursor2D, EntityKind, Object2D, SetFields};

/// Latest `set` state of one alive entity.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedEntity {
    Cursor(Cursor2D),
    Object(Object2D),
    Blob(Blob2D),
}

impl From<SetFields> for TrackedEntity {
    fn from(fields: SetFields) -> Self {
        match fields {
            SetFields::Cursor2D(c) => TrackedEntity::Cursor(c),
            SetFields::Object2D(o) => TrackedEntity::Object(o),
            SetFields::Blob2D(b) => TrackedEntity::Blob(b),
        }
    }
}

/// Per-variant inputs to the shared projection.
struct Contact {
    x: f32,
    y: f32,
    radius_x: f32,
    radius_y: f32,
    rotation_angle: f32,
    force: f32,
    class_id: Option<i32>,
}

impl TrackedEntity {
    pub fn session_id(&self) -> i32 {
        match self {
            TrackedEntity::Cursor(c) => c.session_id,
            TrackedEntity::Object(o) => o.session_id,
            TrackedEntity::Blob(b) => b.session_id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            TrackedEntity::Cursor(_) => EntityKind::Cursor,
            TrackedEntity::Object(_) => EntityKind::Object,
            TrackedEntity::Blob(_) => EntityKind::Blob,
        }
    }

    /// Normalized (x, y).
    pub fn position(&self) -> (f32, f32) {
        match self {
            TrackedEntity::Cursor(c) => (c.x_position, c.y_position),
            TrackedEntity::Object(o) => (o.x_position, o.y_position),
            TrackedEntity::Blob(b) => (b.x_position, b.y_position),
        }
    }

    fn contact(&self, surface: &impl TouchSurface) -> Contact {
        let (x, y) = self.position();
        let r = surface.contact_radius();
        match self {
            TrackedEntity::Cursor(_) => Contact {
                x,
                y,
                radius_x: r,
                radius_y: r,
                rotation_angle: 0.0,
                force: 1.0,
                class_id: None,
            },
            TrackedEntity::Object(o) => Contact {
                x,
                y,
                radius_x: r,
                radius_y: r,
                rotation_angle: o.a_angle.to_degrees(),
                force: 1.0,
                class_id: Some(o.class_id),
            },
            TrackedEntity::Blob(b) => {
                let screen = surface.screen_size();
                Contact {
                    x,
                    y,
                    radius_x: b.width * screen.width / 2.0,
                    radius_y: b.height * screen.height / 2.0,
                    rotation_angle: b.a_angle.to_degrees(),
                    force: b.area.clamp(0.0, 1.0),
                    class_id: None,
                }
            }
        }
    }

    /// Projects this entity onto `surface` as a touch point owned by `source`.
    pub fn to_touch(&self, source: &str, surface: &impl TouchSurface) -> TouchPoint {
        let c = self.contact(surface);
        let at = surface.locate(c.x, c.y);
        TouchPoint {
            identifier: self.session_id(),
            source: source.to_string(),
            kind: self.kind(),
            x_position: c.x,
            y_position: c.y,
            client_x: at.client.0,
            client_y: at.client.1,
            page_x: at.page.0,
            page_y: at.page.1,
            screen_x: at.screen.0,
            screen_y: at.screen.1,
            target: at.target,
            radius_x: c.radius_x,
            radius_y: c.radius_y,
            rotation_angle: c.rotation_angle,
            force: c.force,
            class_id: c.class_id,
        }
    }
}
