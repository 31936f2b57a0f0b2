//! Touch lifecycle events, shaped after W3C TouchEvent.

use crate::touch::TouchPoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TouchEventKind {
    #[serde(rename = "touchstart")]
    Start,
    #[serde(rename = "touchmove")]
    Move,
    #[serde(rename = "touchend")]
    End,
    #[serde(rename = "touchcancel")]
    Cancel,
}

impl TouchEventKind {
    pub fn name(self) -> &'static str {
        match self {
            TouchEventKind::Start => "touchstart",
            TouchEventKind::Move => "touchmove",
            TouchEventKind::End => "touchend",
            TouchEventKind::Cancel => "touchcancel",
        }
    }
}

impl std::fmt::Display for TouchEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One lifecycle event plus the touch lists at the moment it fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    #[serde(rename = "type")]
    pub kind: TouchEventKind,
    /// The touch this event is about.
    pub touch: TouchPoint,
    /// Every active touch, across all sources.
    pub touches: Vec<TouchPoint>,
    /// Active touches sharing `touch`'s target.
    pub target_touches: Vec<TouchPoint>,
    /// Touches that changed in this event.
    pub changed_touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Builds an event for `touch` from a snapshot of the active touches.
    pub fn new(kind: TouchEventKind, touch: TouchPoint, active: Vec<TouchPoint>) -> Self {
        let target_touches = active
            .iter()
            .filter(|t| t.target == touch.target)
            .cloned()
            .collect();
        Self {
            kind,
            changed_touches: vec![touch.clone()],
            touch,
            touches: active,
            target_touches,
        }
    }

    pub fn identifier(&self) -> i32 {
        self.touch.identifier
    }
}
