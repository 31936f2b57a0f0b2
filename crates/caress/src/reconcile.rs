//! Reconciliation of TUIO alive sets into touch lifecycle events.
//!
//! State is kept per source (the TUIO application that sent the bundle) and per
//! entity kind. `alive` is the only authority on what exists: ids it no longer
//! lists end their touch. `set` creates or updates. Touch points share one
//! namespace per source, so a cursor and an object with the same session id in
//! the same source overwrite each other's touch.

use crate::config::DuplicatePolicy;
use crate::entity::TrackedEntity;
use crate::event::{TouchEvent, TouchEventKind};
use crate::touch::{TouchPoint, TouchSurface, Viewport};
use std::collections::{BTreeMap, BTreeSet};
use tuio::{Blob2D, Cursor2D, EntityKind, MessageBody, Object2D, PacketEntry, TuioMessage, TuioPacket};

/// Source used until a bundle names one with a `source` message.
pub const LOCAL_SOURCE: &str = "local";

#[derive(Debug, Clone, Default)]
struct Namespace {
    entities: BTreeMap<i32, TrackedEntity>,
    /// Ids of the most recent `alive` for this namespace, if one was seen.
    last_alive: Option<BTreeSet<i32>>,
}

/// All tracked entities and touch points of one client session.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationState {
    entities: BTreeMap<String, BTreeMap<EntityKind, Namespace>>,
    touches: BTreeMap<String, BTreeMap<i32, TouchPoint>>,
}

impl ReconciliationState {
    fn ensure(&mut self, source: &str, kind: EntityKind) -> &mut Namespace {
        self.touches.entry(source.to_string()).or_default();
        self.entities
            .entry(source.to_string())
            .or_default()
            .entry(kind)
            .or_default()
    }

    /// Sources seen since the last disconnect.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.touches.keys().map(String::as_str)
    }

    /// Entities of one kind in one source, keyed by session id.
    pub fn entities(&self, source: &str, kind: EntityKind) -> Option<&BTreeMap<i32, TrackedEntity>> {
        self.entities
            .get(source)
            .and_then(|kinds| kinds.get(&kind))
            .map(|ns| &ns.entities)
    }

    pub fn entity(&self, source: &str, kind: EntityKind, id: i32) -> Option<&TrackedEntity> {
        self.entities(source, kind).and_then(|m| m.get(&id))
    }

    pub fn touch(&self, source: &str, id: i32) -> Option<&TouchPoint> {
        self.touches.get(source).and_then(|m| m.get(&id))
    }

    /// Every active touch point, ordered by source then id.
    pub fn active_touches(&self) -> Vec<TouchPoint> {
        self.touches
            .values()
            .flat_map(|m| m.values().cloned())
            .collect()
    }

    pub fn touch_count(&self) -> usize {
        self.touches.values().map(BTreeMap::len).sum()
    }

    /// True when nothing at all is tracked, not even empty source namespaces.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.touches.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.touches.clear();
    }
}

/// Applies decoded TUIO packets to a [ReconciliationState] and reports the
/// resulting touch events. One reconciler per client session; calls must be
/// serialized by the owner.
pub struct Reconciler<S = Viewport> {
    state: ReconciliationState,
    surface: S,
    duplicates: DuplicatePolicy,
}

impl Default for Reconciler<Viewport> {
    fn default() -> Self {
        Reconciler::new(Viewport::default())
    }
}

impl<S: TouchSurface> Reconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            state: ReconciliationState::default(),
            surface,
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cursors(&self, source: &str) -> Vec<&Cursor2D> {
        self.of_kind(source, EntityKind::Cursor)
            .filter_map(|e| match e {
                TrackedEntity::Cursor(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn objects(&self, source: &str) -> Vec<&Object2D> {
        self.of_kind(source, EntityKind::Object)
            .filter_map(|e| match e {
                TrackedEntity::Object(o) => Some(o),
                _ => None,
            })
            .collect()
    }

    pub fn blobs(&self, source: &str) -> Vec<&Blob2D> {
        self.of_kind(source, EntityKind::Blob)
            .filter_map(|e| match e {
                TrackedEntity::Blob(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    fn of_kind(&self, source: &str, kind: EntityKind) -> impl Iterator<Item = &TrackedEntity> + '_ {
        self.state
            .entities(source, kind)
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// Applies one packet. Events come out in the order of the messages that
    /// caused them.
    pub fn apply_packet(&mut self, packet: &TuioPacket) -> Vec<TouchEvent> {
        let mut events = Vec::new();
        let mut source = LOCAL_SOURCE.to_string();
        self.apply_bundle(packet, &mut source, &mut events);
        events
    }

    fn apply_bundle(&mut self, packet: &TuioPacket, source: &mut String, events: &mut Vec<TouchEvent>) {
        if packet.duplicate && self.duplicates == DuplicatePolicy::Suppress {
            tracing::debug!(messages = packet.messages.len(), "duplicate bundle skipped");
            return;
        }
        for entry in &packet.messages {
            match entry {
                PacketEntry::Message(m) => self.apply_message(m, source, events),
                PacketEntry::Bundle(nested) => self.apply_bundle(nested, source, events),
                PacketEntry::Rejected(_) => {}
            }
        }
    }

    fn apply_message(&mut self, message: &TuioMessage, source: &mut String, events: &mut Vec<TouchEvent>) {
        let kind = match message.profile() {
            Some(p) => p.entity_kind(),
            None => {
                tracing::trace!(profile = %message.profile, "message for unknown profile ignored");
                return;
            }
        };
        match &message.body {
            MessageBody::Source { address } => {
                *source = address.clone();
                self.state.ensure(source, kind);
            }
            MessageBody::Alive { session_ids } => self.alive(source, kind, session_ids, events),
            MessageBody::Set(fields) => self.set(source, TrackedEntity::from(fields.clone()), events),
            MessageBody::Fseq { .. } => {}
        }
    }

    fn alive(&mut self, source: &str, kind: EntityKind, reported: &[i32], events: &mut Vec<TouchEvent>) {
        let reported: BTreeSet<i32> = reported.iter().copied().collect();
        let ns = self.state.ensure(source, kind);
        let stale: Vec<i32> = ns
            .entities
            .keys()
            .filter(|id| !reported.contains(id))
            .copied()
            .collect();
        for id in &stale {
            ns.entities.remove(id);
        }
        ns.last_alive = Some(reported);

        for id in stale {
            let removed = self.state.touches.get_mut(source).and_then(|m| m.remove(&id));
            match removed {
                Some(touch) => events.push(self.event(TouchEventKind::End, touch)),
                None => tracing::debug!(source, id, ?kind, "entity ended without a touch point"),
            }
        }
    }

    fn set(&mut self, source: &str, entity: TrackedEntity, events: &mut Vec<TouchEvent>) {
        let id = entity.session_id();
        let kind = entity.kind();
        let mut touch = entity.to_touch(source, &self.surface);

        let ns = self.state.ensure(source, kind);
        if let Some(alive) = &ns.last_alive {
            if !alive.contains(&id) {
                tracing::debug!(source, id, ?kind, "set for id missing from latest alive");
            }
        }
        let existed = ns.entities.insert(id, entity).is_some();

        let touches = self.state.touches.entry(source.to_string()).or_default();
        let previous_target = touches.get(&id).map(|t| t.target);
        let event_kind = match (existed, previous_target) {
            (true, Some(target)) => {
                // A touch keeps the target it started on.
                touch.target = target;
                TouchEventKind::Move
            }
            (true, None) => {
                tracing::debug!(source, id, ?kind, "touch point reinstated after id collision");
                TouchEventKind::Start
            }
            (false, _) => TouchEventKind::Start,
        };
        touches.insert(id, touch.clone());
        events.push(self.event(event_kind, touch));
    }

    /// Cancels every active touch and forgets all state. Call when the
    /// transport feeding this reconciler goes away.
    pub fn disconnect(&mut self) -> Vec<TouchEvent> {
        let mut events = Vec::new();
        let keys: Vec<(String, i32)> = self
            .state
            .touches
            .iter()
            .flat_map(|(source, m)| m.keys().map(move |id| (source.clone(), *id)))
            .collect();
        for (source, id) in keys {
            let removed = self.state.touches.get_mut(&source).and_then(|m| m.remove(&id));
            if let Some(touch) = removed {
                events.push(self.event(TouchEventKind::Cancel, touch));
            }
        }
        self.state.clear();
        tracing::info!(cancelled = events.len(), "touch state cleared");
        events
    }

    fn event(&self, kind: TouchEventKind, touch: TouchPoint) -> TouchEvent {
        tracing::trace!(event = %kind, source = %touch.source, id = touch.identifier, "touch event");
        TouchEvent::new(kind, touch, self.state.active_touches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::{Size, SurfacePoint};
    use tuio::{OscAtom, OscBundle, OscMessage, OscPacket, OscTimestamp, SetFields};

    fn packet(messages: Vec<OscMessage>) -> TuioPacket {
        let bundle = OscBundle {
            timestamp: OscTimestamp::IMMEDIATE,
            elements: messages.into_iter().map(OscPacket::Message).collect(),
        };
        TuioPacket::from_bundle(&bundle)
    }

    fn nested(elements: Vec<OscPacket>) -> OscPacket {
        OscPacket::Bundle(OscBundle {
            timestamp: OscTimestamp::IMMEDIATE,
            elements,
        })
    }

    fn tree(elements: Vec<OscPacket>) -> TuioPacket {
        TuioPacket::from_bundle(&OscBundle {
            timestamp: OscTimestamp::IMMEDIATE,
            elements,
        })
    }

    fn source(name: &str) -> OscMessage {
        OscMessage::new("/tuio/2Dcur", vec![s("source"), s(name)])
    }

    fn s(v: &str) -> OscAtom {
        OscAtom::String(v.into())
    }

    fn alive(profile: &str, ids: &[i32]) -> OscMessage {
        let mut args = vec![s("alive")];
        args.extend(ids.iter().map(|i| OscAtom::Int32(*i)));
        OscMessage::new(profile, args)
    }

    fn cursor_set(id: i32, x: f32, y: f32) -> OscMessage {
        OscMessage::new(
            "/tuio/2Dcur",
            vec![s("set"), OscAtom::Int32(id), OscAtom::Float32(x), OscAtom::Float32(y)],
        )
    }

    fn object_set(id: i32, class_id: i32) -> OscMessage {
        OscMessage::new(
            "/tuio/2Dobj",
            vec![
                s("set"),
                OscAtom::Int32(id),
                OscAtom::Int32(class_id),
                OscAtom::Float32(0.5),
                OscAtom::Float32(0.5),
            ],
        )
    }

    fn kinds(events: &[TouchEvent]) -> Vec<(TouchEventKind, i32)> {
        events.iter().map(|e| (e.kind, e.identifier())).collect()
    }

    /// Left half of the surface is target 1, right half target 2.
    struct SplitSurface;

    impl TouchSurface for SplitSurface {
        fn locate(&self, x: f32, y: f32) -> SurfacePoint {
            SurfacePoint {
                client: (x * 100.0, y * 100.0),
                page: (x * 100.0, y * 100.0),
                screen: (x * 100.0, y * 100.0),
                target: Some(if x < 0.5 { 1 } else { 2 }),
            }
        }

        fn screen_size(&self) -> Size {
            Size::new(100.0, 100.0)
        }
    }

    #[test]
    fn set_then_set_is_start_then_move() {
        let mut r = Reconciler::new(Viewport::default());
        let e1 = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[1]), cursor_set(1, 0.1, 0.1)]));
        let e2 = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[1]), cursor_set(1, 0.2, 0.2)]));
        assert_eq!(kinds(&e1), vec![(TouchEventKind::Start, 1)]);
        assert_eq!(kinds(&e2), vec![(TouchEventKind::Move, 1)]);
        assert_eq!(r.state().touch(LOCAL_SOURCE, 1).map(|t| t.x_position), Some(0.2));
    }

    #[test]
    fn alive_removes_only_missing_ids() {
        let mut r = Reconciler::new(Viewport::default());
        r.apply_packet(&packet(vec![
            alive("/tuio/2Dcur", &[1, 2, 3]),
            cursor_set(1, 0.1, 0.1),
            cursor_set(2, 0.2, 0.2),
            cursor_set(3, 0.3, 0.3),
        ]));
        let events = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[2])]));
        assert_eq!(
            kinds(&events),
            vec![(TouchEventKind::End, 1), (TouchEventKind::End, 3)]
        );
        let remaining: Vec<i32> = r.cursors(LOCAL_SOURCE).iter().map(|c| c.session_id).collect();
        assert_eq!(remaining, vec![2]);
        // The end event's snapshot no longer includes the ended touch.
        assert!(events[0].touches.iter().all(|t| t.identifier != 1));
    }

    #[test]
    fn alive_does_not_create() {
        let mut r = Reconciler::new(Viewport::default());
        let events = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[7])]));
        assert!(events.is_empty());
        assert_eq!(r.state().touch_count(), 0);
    }

    #[test]
    fn source_message_scopes_the_rest_of_the_packet() {
        let mut r = Reconciler::new(Viewport::default());
        let events = r.apply_packet(&packet(vec![
            OscMessage::new("/tuio/2Dcur", vec![s("source"), s("appA")]),
            alive("/tuio/2Dcur", &[1]),
            cursor_set(1, 0.5, 0.5),
        ]));
        assert_eq!(events[0].touch.source, "appA");
        assert!(r.state().touch("appA", 1).is_some());
        assert!(r.state().touch(LOCAL_SOURCE, 1).is_none());

        // Next packet without a source message falls back to the local source.
        r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[]), cursor_set(1, 0.5, 0.5)]));
        assert!(r.state().touch(LOCAL_SOURCE, 1).is_some());
        assert!(r.state().touch("appA", 1).is_some());
    }

    #[test]
    fn kinds_have_separate_alive_sets() {
        let mut r = Reconciler::new(Viewport::default());
        r.apply_packet(&packet(vec![
            alive("/tuio/2Dcur", &[1]),
            cursor_set(1, 0.1, 0.1),
            alive("/tuio/2Dobj", &[2]),
            object_set(2, 40),
        ]));
        let events = r.apply_packet(&packet(vec![alive("/tuio/2Dobj", &[])]));
        assert_eq!(kinds(&events), vec![(TouchEventKind::End, 2)]);
        assert_eq!(events[0].touch.class_id, Some(40));
        assert_eq!(r.cursors(LOCAL_SOURCE).len(), 1);
        assert!(r.objects(LOCAL_SOURCE).is_empty());
    }

    #[test]
    fn cross_kind_collision_shares_the_touch_slot() {
        let mut r = Reconciler::new(Viewport::default());
        r.apply_packet(&packet(vec![
            alive("/tuio/2Dcur", &[5]),
            cursor_set(5, 0.1, 0.1),
            alive("/tuio/2Dobj", &[5]),
            object_set(5, 9),
        ]));
        assert_eq!(r.state().touch_count(), 1);
        assert_eq!(r.state().touch(LOCAL_SOURCE, 5).and_then(|t| t.class_id), Some(9));

        // Ending the cursor ends the shared touch; the object's next set reinstates it.
        let ended = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[])]));
        assert_eq!(kinds(&ended), vec![(TouchEventKind::End, 5)]);
        let back = r.apply_packet(&packet(vec![alive("/tuio/2Dobj", &[5]), object_set(5, 9)]));
        assert_eq!(kinds(&back), vec![(TouchEventKind::Start, 5)]);
    }

    #[test]
    fn nested_bundles_inherit_source_and_keep_wire_order() {
        let mut r = Reconciler::new(Viewport::default());
        let events = r.apply_packet(&tree(vec![
            OscPacket::Message(source("appA")),
            nested(vec![
                OscPacket::Message(alive("/tuio/2Dcur", &[1, 2])),
                OscPacket::Message(cursor_set(1, 0.1, 0.1)),
            ]),
            nested(vec![
                OscPacket::Message(source("appB")),
                OscPacket::Message(alive("/tuio/2Dcur", &[])),
                OscPacket::Message(OscMessage::new("/tuio/2Dcur", vec![s("fseq"), OscAtom::Int32(-1)])),
            ]),
            OscPacket::Message(cursor_set(2, 0.2, 0.2)),
        ]));
        let summary: Vec<(TouchEventKind, &str, i32)> = events
            .iter()
            .map(|e| (e.kind, e.touch.source.as_str(), e.identifier()))
            .collect();
        assert_eq!(
            summary,
            vec![(TouchEventKind::Start, "appA", 1), (TouchEventKind::Start, "appA", 2)]
        );
        // The suppressed duplicate neither switched the source nor touched state.
        let sources: Vec<&str> = r.state().sources().collect();
        assert_eq!(sources, vec!["appA"]);
    }

    #[test]
    fn source_in_nested_bundle_carries_to_later_siblings() {
        let mut r = Reconciler::new(Viewport::default());
        let events = r.apply_packet(&tree(vec![
            nested(vec![
                OscPacket::Message(source("appB")),
                OscPacket::Message(alive("/tuio/2Dcur", &[3, 4])),
                OscPacket::Message(cursor_set(3, 0.3, 0.3)),
            ]),
            OscPacket::Message(cursor_set(4, 0.4, 0.4)),
        ]));
        let placed: Vec<(&str, i32)> = events
            .iter()
            .map(|e| (e.touch.source.as_str(), e.identifier()))
            .collect();
        assert_eq!(placed, vec![("appB", 3), ("appB", 4)]);

        // The next packet starts over in the local source.
        let events = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[5]), cursor_set(5, 0.5, 0.5)]));
        assert_eq!(events[0].touch.source, LOCAL_SOURCE);
    }

    #[test]
    fn duplicate_bundles_are_suppressed_by_default() {
        let dup = packet(vec![
            alive("/tuio/2Dcur", &[1]),
            cursor_set(1, 0.5, 0.5),
            OscMessage::new("/tuio/2Dcur", vec![s("fseq"), OscAtom::Int32(-1)]),
        ]);
        assert!(dup.duplicate);

        let mut suppress = Reconciler::new(Viewport::default());
        assert!(suppress.apply_packet(&dup).is_empty());
        assert!(suppress.state().is_empty());

        let mut apply = Reconciler::new(Viewport::default()).with_duplicate_policy(DuplicatePolicy::Apply);
        assert_eq!(kinds(&apply.apply_packet(&dup)), vec![(TouchEventKind::Start, 1)]);
    }

    #[test]
    fn target_is_fixed_at_creation() {
        let mut r = Reconciler::new(SplitSurface);
        r.apply_packet(&packet(vec![
            alive("/tuio/2Dcur", &[1, 2]),
            cursor_set(1, 0.1, 0.5),
            cursor_set(2, 0.2, 0.5),
        ]));
        // Touch 1 drags into the right half but stays on target 1.
        let events = r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[1, 2]), cursor_set(1, 0.75, 0.5)]));
        assert_eq!(events[0].touch.target, Some(1));
        assert_eq!(events[0].touch.client_x, 75.0);
        let ids: Vec<i32> = events[0].target_touches.iter().map(|t| t.identifier).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn disconnect_cancels_everything() {
        let mut r = Reconciler::new(Viewport::default());
        r.apply_packet(&packet(vec![
            alive("/tuio/2Dcur", &[1, 2]),
            cursor_set(1, 0.1, 0.1),
            cursor_set(2, 0.2, 0.2),
        ]));
        let events = r.disconnect();
        assert_eq!(
            kinds(&events),
            vec![(TouchEventKind::Cancel, 1), (TouchEventKind::Cancel, 2)]
        );
        assert_eq!(events[0].touches.len(), 1);
        assert!(events[1].touches.is_empty());
        assert!(r.state().is_empty());
        assert!(r.disconnect().is_empty());
    }

    #[test]
    fn rejected_messages_do_not_mutate() {
        let mut r = Reconciler::new(Viewport::default());
        let events = r.apply_packet(&packet(vec![
            OscMessage::new(
                "/tuio/2Dxyz",
                vec![s("set"), OscAtom::Int32(1), OscAtom::Float32(0.5), OscAtom::Float32(0.5)],
            ),
            OscMessage::new("/tuio/2Dcur", vec![s("set")]),
        ]));
        assert!(events.is_empty());
        assert!(r.state().is_empty());
    }

    #[test]
    fn entity_holds_latest_fields() {
        let mut r = Reconciler::new(Viewport::default());
        r.apply_packet(&packet(vec![alive("/tuio/2Dcur", &[4]), cursor_set(4, 0.3, 0.6)]));
        match r.state().entity(LOCAL_SOURCE, EntityKind::Cursor, 4) {
            Some(TrackedEntity::Cursor(c)) => assert_eq!((c.x_position, c.y_position), (0.3, 0.6)),
            other => panic!("expected cursor, got {:?}", other),
        }
        let fields = SetFields::Cursor2D(Cursor2D {
            session_id: 4,
            x_position: 0.3,
            y_position: 0.6,
            x_velocity: 0.0,
            y_velocity: 0.0,
            motion_acceleration: 0.0,
        });
        assert_eq!(
            r.state().entity(LOCAL_SOURCE, EntityKind::Cursor, 4),
            Some(&TrackedEntity::from(fields))
        );
    }
}
