use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::area::{AreaController, Axes, Direction};
use crate::error::{AnnotateError, Result};
use crate::geometry::{Area, AreaId, AreaPatch, Point, RelativeArea, Size};
use crate::handle::Handle;
use crate::options::Options;

// ── Gestures & events ───────────────────────────────────────────────────────

/// The pointer gesture in progress. Pointer moves and releases only do
/// anything while this is not `Idle`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    Drawing { id: AreaId },
    Resizing { id: AreaId, axes: Axes },
    Moving { id: AreaId, grab_offset: Point },
}

impl Gesture {
    pub fn area(&self) -> Option<AreaId> {
        match *self {
            Gesture::Idle => None,
            Gesture::Drawing { id } | Gesture::Resizing { id, .. } | Gesture::Moving { id, .. } => {
                Some(id)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectEvent {
    Loaded,
    Changing { id: AreaId, areas: Vec<Area> },
    Changed { id: AreaId, areas: Vec<Area> },
}

pub type Listener = Box<dyn FnMut(AreaId, &[Area])>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventKind {
    Changing,
    Changed,
}

// ── Commands ────────────────────────────────────────────────────────────────

/// Operations callable from outside the pointer loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Add(Vec<AreaPatch>),
    Set {
        id: AreaId,
        dims: AreaPatch,
        silent: bool,
    },
    Remove(AreaId),
    Reset,
    Destroy,
    QueryAreas,
    QueryRelativeAreas,
    Contains(Point),
    BlurAll,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Done,
    Areas(Vec<Area>),
    RelativeAreas(Vec<RelativeArea>),
    Contains(bool),
}

impl Command {
    /// Builds a command from a method name and JSON arguments, e.g.
    /// `("set", [2, {"width": 40}, true])`.
    pub fn parse(method: &str, args: &[Value]) -> Result<Self> {
        let command = match method {
            "add" => {
                let value = args
                    .first()
                    .ok_or_else(|| AnnotateError::invalid_arguments(method, "missing area"))?;
                let patches = if value.is_array() {
                    from_arg(method, value)?
                } else {
                    vec![from_arg(method, value)?]
                };
                Command::Add(patches)
            }
            "set" => Command::Set {
                id: required(method, args, 0)?,
                dims: required(method, args, 1)?,
                silent: optional(method, args, 2)?.unwrap_or(false),
            },
            "remove" => Command::Remove(required(method, args, 0)?),
            "reset" => Command::Reset,
            "destroy" => Command::Destroy,
            "areas" => Command::QueryAreas,
            "relativeAreas" => Command::QueryRelativeAreas,
            "contains" => Command::Contains(required(method, args, 0)?),
            "blurAll" => Command::BlurAll,
            _ => {
                return Err(AnnotateError::UnknownMethod {
                    method: method.to_owned(),
                })
            }
        };
        Ok(command)
    }
}

fn from_arg<T: DeserializeOwned>(method: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| AnnotateError::invalid_arguments(method, e.to_string()))
}

fn required<T: DeserializeOwned>(method: &str, args: &[Value], index: usize) -> Result<T> {
    let value = args.get(index).ok_or_else(|| {
        AnnotateError::invalid_arguments(method, format!("missing argument {index}"))
    })?;
    from_arg(method, value)
}

fn optional<T: DeserializeOwned>(method: &str, args: &[Value], index: usize) -> Result<Option<T>> {
    args.get(index)
        .filter(|v| !v.is_null())
        .map(|v| from_arg(method, v))
        .transpose()
}

// ── Selector ────────────────────────────────────────────────────────────────

/// Multi-area rectangle selection over one image.
///
/// Geometry lives in display (container) pixels; `relative_areas` maps it
/// back onto the image's natural pixels.
pub struct AreaSelector {
    options: Options,
    natural: Size,
    display: Size,
    ratio: f32,
    areas: BTreeMap<AreaId, AreaController>,
    gesture: Gesture,
    events: Vec<SelectEvent>,
    on_changing: Option<Listener>,
    on_changed: Option<Listener>,
    destroyed: bool,
}

impl AreaSelector {
    pub fn new(natural: Size, options: Options) -> Self {
        let options = options.normalized();

        let mut ratio = 1.0;
        let mut display_size = natural;
        if options.width > 0.0 && natural.width > 0.0 && options.width != natural.width {
            ratio = options.width / natural.width;
            display_size = Size::new(options.width, natural.height * ratio);
        }

        let initial = options.areas.clone();
        let mut selector = Self {
            options,
            natural,
            display: display_size,
            ratio,
            areas: BTreeMap::new(),
            gesture: Gesture::Idle,
            events: Vec::new(),
            on_changing: None,
            on_changed: None,
            destroyed: false,
        };
        for patch in &initial {
            selector.add_one(patch, true);
        }
        selector.blur_all();

        tracing::info!(
            natural_width = natural.width,
            display_width = display_size.width,
            ratio,
            areas = selector.areas.len(),
            "area selector ready"
        );
        selector.events.push(SelectEvent::Loaded);
        selector
    }

    pub fn on_changing(&mut self, listener: impl FnMut(AreaId, &[Area]) + 'static) {
        self.on_changing = Some(Box::new(listener));
    }

    pub fn on_changed(&mut self, listener: impl FnMut(AreaId, &[Area]) + 'static) {
        self.on_changed = Some(Box::new(listener));
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Size of the image as displayed, in container pixels.
    pub fn image_size(&self) -> Size {
        self.display
    }

    pub fn natural_size(&self) -> Size {
        self.natural
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn take_events(&mut self) -> Vec<SelectEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id).map(AreaController::data)
    }

    pub fn areas(&self) -> Vec<Area> {
        self.areas.values().map(|a| *a.data()).collect()
    }

    pub fn relative_areas(&self) -> Vec<RelativeArea> {
        self.areas
            .values()
            .map(|a| a.data().relative(self.ratio))
            .collect()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.areas.values().any(|a| a.contains(point))
    }

    pub fn focused(&self) -> Option<AreaId> {
        self.areas.values().find(|a| a.is_focused()).map(AreaController::id)
    }

    pub fn blur_all(&mut self) {
        for area in self.areas.values_mut() {
            area.blur();
        }
    }

    fn focus(&mut self, id: AreaId) {
        self.blur_all();
        if let Some(area) = self.areas.get_mut(&id) {
            area.focus();
        }
    }

    // ── Area lifecycle ──────────────────────────────────────────────────

    /// Allocates a focused, empty area unless `maxAreas` is reached.
    fn new_area(&mut self) -> Option<AreaId> {
        self.blur_all();
        if self.options.max_areas != 0 && self.options.max_areas <= self.areas.len() {
            tracing::debug!(max_areas = self.options.max_areas, "area limit reached");
            return None;
        }
        let id = self
            .areas
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        let mut area = AreaController::new(id);
        area.focus();
        self.areas.insert(id, area);
        tracing::debug!(id, "area created");
        Some(id)
    }

    fn add_one(&mut self, patch: &AreaPatch, silent: bool) -> Option<AreaId> {
        let id = self.new_area()?;
        self.set(id, patch, silent);
        Some(id)
    }

    pub fn add(&mut self, patches: &[AreaPatch]) -> Vec<AreaId> {
        self.blur_all();
        let ids = patches
            .iter()
            .filter_map(|patch| self.add_one(patch, false))
            .collect();
        if self.options.is_read_only() {
            self.blur_all();
        }
        ids
    }

    /// Merges `dims` into area `id` and focuses it. Unknown ids are ignored.
    pub fn set(&mut self, id: AreaId, dims: &AreaPatch, silent: bool) {
        let Some(area) = self.areas.get_mut(&id) else {
            return;
        };
        area.set(dims);
        if !silent {
            self.fire(EventKind::Changed, id);
        }
        self.focus(id);
    }

    pub fn remove(&mut self, id: AreaId) {
        if self.areas.remove(&id).is_none() {
            return;
        }
        if self.gesture.area() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        tracing::debug!(id, "area removed");
        self.fire(EventKind::Changed, id);
    }

    pub fn reset(&mut self) {
        let ids: Vec<AreaId> = self.areas.keys().copied().collect();
        for id in ids {
            self.remove(id);
        }
    }

    pub fn destroy(&mut self) {
        self.reset();
        self.on_changing = None;
        self.on_changed = None;
        self.destroyed = true;
        tracing::info!("area selector destroyed");
    }

    // ── Pointer & keyboard ──────────────────────────────────────────────

    /// Pointer-down on empty image space: starts drawing a new area.
    pub fn pointer_down_trigger(&mut self, pointer: Point) -> Option<AreaId> {
        if self.destroyed || !self.options.allow_select {
            return None;
        }
        let id = self.new_area()?;
        let pointer = pointer.clamp_to(self.display);
        let (min_size, image) = (self.options.min_size, self.display);
        if let Some(area) = self.areas.get_mut(&id) {
            area.start_drawing(pointer, min_size, image);
        }
        self.focus(id);
        self.gesture = Gesture::Drawing { id };
        Some(id)
    }

    /// Pointer-down on one of the focused area's resize handles.
    pub fn pointer_down_handle(&mut self, id: AreaId, handle: Handle) -> bool {
        if self.destroyed || !self.options.allow_resize {
            return false;
        }
        self.focus(id);
        let Some(area) = self.areas.get_mut(&id) else {
            return false;
        };
        let axes = area.pick_handle(handle);
        self.gesture = Gesture::Resizing { id, axes };
        true
    }

    /// Pointer-down on an area's fill layer: starts moving it.
    pub fn pointer_down_fill(&mut self, id: AreaId, pointer: Point) -> bool {
        if self.destroyed || !self.options.allow_move {
            return false;
        }
        self.focus(id);
        let pointer = pointer.clamp_to(self.display);
        let Some(area) = self.areas.get(&id) else {
            return false;
        };
        let grab_offset = area.pick_fill(pointer);
        self.gesture = Gesture::Moving { id, grab_offset };
        true
    }

    pub fn pointer_move(&mut self, pointer: Point) {
        let Some(id) = self.gesture.area() else {
            return;
        };
        let pointer = pointer.clamp_to(self.display);
        let display = self.display;
        let Some(area) = self.areas.get_mut(&id) else {
            self.gesture = Gesture::Idle;
            return;
        };
        match self.gesture {
            Gesture::Drawing { .. } => area.resize(pointer, Axes::BOTH, &self.options, display),
            Gesture::Resizing { axes, .. } => area.resize(pointer, axes, &self.options, display),
            Gesture::Moving { grab_offset, .. } => {
                area.move_with_pointer(pointer, grab_offset, display)
            }
            Gesture::Idle => return,
        }
        self.fire(EventKind::Changing, id);
    }

    /// Commits the active gesture.
    pub fn pointer_up(&mut self) {
        let Some(id) = self.gesture.area() else {
            return;
        };
        self.gesture = Gesture::Idle;
        let Some(area) = self.areas.get_mut(&id) else {
            return;
        };
        area.release();
        tracing::debug!(id, area = ?area.data(), "area committed");
        self.fire(EventKind::Changed, id);
    }

    /// Delete-button activation.
    pub fn delete(&mut self, id: AreaId) {
        if self.options.allow_delete {
            self.remove(id);
        }
    }

    /// Moves the focused area one pixel.
    pub fn nudge(&mut self, direction: Direction) -> bool {
        if self.destroyed || !self.options.allow_nudge {
            return false;
        }
        let Some(id) = self.focused() else {
            return false;
        };
        let display = self.display;
        if let Some(area) = self.areas.get_mut(&id) {
            area.nudge(direction, display);
        }
        self.fire(EventKind::Changed, id);
        true
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Reply> {
        if self.destroyed {
            tracing::warn!(?command, "command on destroyed selector");
            return Err(AnnotateError::Destroyed);
        }
        let reply = match command {
            Command::Add(patches) => {
                self.add(&patches);
                Reply::Done
            }
            Command::Set { id, dims, silent } => {
                self.set(id, &dims, silent);
                Reply::Done
            }
            Command::Remove(id) => {
                self.remove(id);
                Reply::Done
            }
            Command::Reset => {
                self.reset();
                Reply::Done
            }
            Command::Destroy => {
                self.destroy();
                Reply::Done
            }
            Command::QueryAreas => Reply::Areas(self.areas()),
            Command::QueryRelativeAreas => Reply::RelativeAreas(self.relative_areas()),
            Command::Contains(point) => Reply::Contains(self.contains(point)),
            Command::BlurAll => {
                self.blur_all();
                Reply::Done
            }
        };
        Ok(reply)
    }

    fn fire(&mut self, kind: EventKind, id: AreaId) {
        let areas = self.areas();
        let listener = match kind {
            EventKind::Changing => self.on_changing.as_mut(),
            EventKind::Changed => self.on_changed.as_mut(),
        };
        if let Some(listener) = listener {
            listener(id, &areas);
        }
        self.events.push(match kind {
            EventKind::Changing => SelectEvent::Changing { id, areas },
            EventKind::Changed => SelectEvent::Changed { id, areas },
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn selector(options: Options) -> AreaSelector {
        AreaSelector::new(Size::new(400.0, 300.0), options)
    }

    fn draw(sel: &mut AreaSelector, from: (f32, f32), to: (f32, f32)) -> Option<AreaId> {
        let id = sel.pointer_down_trigger(Point::new(from.0, from.1))?;
        sel.pointer_move(Point::new(to.0, to.1));
        sel.pointer_up();
        Some(id)
    }

    fn geometry(area: &Area) -> (f32, f32, f32, f32) {
        (area.x, area.y, area.width, area.height)
    }

    #[test]
    fn draw_commits_the_dragged_box() {
        let mut sel = selector(Options {
            min_size: [10.0, 10.0],
            ..Default::default()
        });
        let id = draw(&mut sel, (5.0, 5.0), (50.0, 80.0)).unwrap();
        assert_eq!(geometry(sel.area(id).unwrap()), (5.0, 5.0, 45.0, 75.0));
        assert_eq!(sel.gesture(), Gesture::Idle);
    }

    #[test]
    fn aspect_lock_applies_while_drawing() {
        let mut sel = selector(Options {
            aspect_ratio: 2.0,
            ..Default::default()
        });
        let id = draw(&mut sel, (0.0, 0.0), (40.0, 10.0)).unwrap();
        assert_eq!(geometry(sel.area(id).unwrap()), (0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn focusing_one_area_blurs_the_other() {
        let mut sel = selector(Options::default());
        let a = draw(&mut sel, (10.0, 10.0), (50.0, 50.0)).unwrap();
        let b = draw(&mut sel, (100.0, 100.0), (150.0, 150.0)).unwrap();

        assert!(sel.pointer_down_fill(a, Point::new(20.0, 20.0)));
        sel.pointer_up();
        assert!(sel.pointer_down_fill(b, Point::new(120.0, 120.0)));
        sel.pointer_up();

        assert_eq!(sel.area(b).unwrap().z, crate::geometry::FOCUSED_Z);
        assert_eq!(sel.area(a).unwrap().z, crate::geometry::BLURRED_Z);
        assert_eq!(sel.focused(), Some(b));
    }

    #[test]
    fn max_areas_refuses_new_areas_but_blurs() {
        let mut sel = selector(Options {
            max_areas: 1,
            ..Default::default()
        });
        let a = draw(&mut sel, (10.0, 10.0), (50.0, 50.0)).unwrap();
        assert_eq!(sel.focused(), Some(a));
        assert_eq!(sel.pointer_down_trigger(Point::new(200.0, 200.0)), None);
        assert_eq!(sel.focused(), None);
        assert_eq!(sel.areas().len(), 1);
    }

    #[test]
    fn ids_continue_after_the_highest_one() {
        let mut sel = selector(Options::default());
        let ids = sel.add(&[
            AreaPatch::rect(0.0, 0.0, 10.0, 10.0),
            AreaPatch::rect(20.0, 0.0, 10.0, 10.0),
            AreaPatch::rect(40.0, 0.0, 10.0, 10.0),
        ]);
        assert_eq!(ids, vec![0, 1, 2]);
        sel.remove(1);
        assert_eq!(sel.add(&[AreaPatch::rect(0.0, 50.0, 5.0, 5.0)]), vec![3]);
        sel.remove(3);
        sel.remove(2);
        assert_eq!(sel.add(&[AreaPatch::rect(0.0, 50.0, 5.0, 5.0)]), vec![1]);
    }

    #[test]
    fn moving_fires_changing_then_changed() {
        let mut sel = selector(Options::default());
        let id = sel.add(&[AreaPatch::rect(10.0, 10.0, 40.0, 40.0)])[0];
        sel.take_events();

        sel.pointer_down_fill(id, Point::new(20.0, 20.0));
        sel.pointer_move(Point::new(390.0, 25.0));
        sel.pointer_up();

        let area = sel.area(id).unwrap();
        assert_eq!(geometry(area), (360.0, 15.0, 40.0, 40.0));
        let events = sel.take_events();
        assert!(matches!(events[0], SelectEvent::Changing { id: 0, .. }));
        assert!(matches!(events[1], SelectEvent::Changed { id: 0, .. }));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn moves_are_ignored_without_a_gesture() {
        let mut sel = selector(Options::default());
        sel.add(&[AreaPatch::rect(10.0, 10.0, 40.0, 40.0)]);
        sel.take_events();
        sel.pointer_move(Point::new(100.0, 100.0));
        sel.pointer_up();
        assert!(sel.take_events().is_empty());
    }

    #[test]
    fn resize_from_handle() {
        let mut sel = selector(Options::default());
        let id = sel.add(&[AreaPatch::rect(100.0, 100.0, 50.0, 50.0)])[0];
        assert!(sel.pointer_down_handle(id, Handle::NorthWest));
        sel.pointer_move(Point::new(80.0, 90.0));
        sel.pointer_up();
        assert_eq!(geometry(sel.area(id).unwrap()), (80.0, 90.0, 70.0, 60.0));
    }

    #[test]
    fn disabled_move_and_resize_do_nothing() {
        let mut sel = selector(Options {
            allow_move: false,
            allow_resize: false,
            ..Default::default()
        });
        let id = sel.add(&[AreaPatch::rect(10.0, 10.0, 40.0, 40.0)])[0];
        assert!(!sel.pointer_down_fill(id, Point::new(20.0, 20.0)));
        assert!(!sel.pointer_down_handle(id, Handle::East));
        assert_eq!(sel.gesture(), Gesture::Idle);
    }

    #[test]
    fn read_only_selector_blurs_added_areas() {
        let mut sel = selector(Options {
            allow_edit: false,
            ..Default::default()
        });
        sel.add(&[AreaPatch::rect(10.0, 10.0, 40.0, 40.0)]);
        assert_eq!(sel.focused(), None);
        assert_eq!(sel.pointer_down_trigger(Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn delete_removes_and_reports_remaining_areas() {
        let mut sel = selector(Options::default());
        let ids = sel.add(&[
            AreaPatch::rect(0.0, 0.0, 10.0, 10.0),
            AreaPatch::rect(20.0, 0.0, 10.0, 10.0),
        ]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sel.on_changed(move |id, areas| sink.borrow_mut().push((id, areas.len())));

        sel.delete(ids[0]);
        assert_eq!(*seen.borrow(), vec![(ids[0], 1)]);
        assert_eq!(sel.areas().len(), 1);
    }

    #[test]
    fn nudge_moves_only_the_focused_area() {
        let mut sel = selector(Options::default());
        let ids = sel.add(&[
            AreaPatch::rect(10.0, 10.0, 10.0, 10.0),
            AreaPatch::rect(50.0, 50.0, 10.0, 10.0),
        ]);
        assert_eq!(sel.focused(), Some(ids[1]));
        assert!(sel.nudge(Direction::Right));
        assert_eq!(sel.area(ids[1]).unwrap().x, 51.0);
        assert_eq!(sel.area(ids[0]).unwrap().x, 10.0);

        sel.blur_all();
        assert!(!sel.nudge(Direction::Right));
    }

    #[test]
    fn nudge_can_be_disabled() {
        let mut sel = selector(Options {
            allow_nudge: false,
            ..Default::default()
        });
        sel.add(&[AreaPatch::rect(10.0, 10.0, 10.0, 10.0)]);
        assert!(!sel.nudge(Direction::Up));
    }

    #[test]
    fn width_override_scales_relative_areas() {
        let mut sel = AreaSelector::new(
            Size::new(1024.0, 512.0),
            Options {
                width: 512.0,
                ..Default::default()
            },
        );
        assert_eq!(sel.ratio(), 0.5);
        assert_eq!(sel.image_size(), Size::new(512.0, 256.0));

        sel.add(&[AreaPatch::rect(10.5, 20.0, 33.3, 40.0)]);
        let rel = sel.relative_areas()[0];
        assert_eq!((rel.x, rel.y, rel.width, rel.height), (21, 40, 66, 80));
    }

    #[test]
    fn initial_areas_are_added_silently_and_blurred() {
        let mut sel = selector(Options {
            areas: vec![AreaPatch::rect(1.0, 2.0, 3.0, 4.0)],
            ..Default::default()
        });
        assert_eq!(sel.areas().len(), 1);
        assert_eq!(sel.focused(), None);
        assert_eq!(sel.take_events(), vec![SelectEvent::Loaded]);
    }

    #[test]
    fn set_merges_and_focuses() {
        let mut sel = selector(Options::default());
        let ids = sel.add(&[
            AreaPatch::rect(0.0, 0.0, 10.0, 10.0),
            AreaPatch::rect(20.0, 0.0, 10.0, 10.0),
        ]);
        sel.take_events();
        sel.set(
            ids[0],
            &AreaPatch {
                width: Some(25.0),
                ..Default::default()
            },
            true,
        );
        assert_eq!(geometry(sel.area(ids[0]).unwrap()), (0.0, 0.0, 25.0, 10.0));
        assert_eq!(sel.focused(), Some(ids[0]));
        assert!(sel.take_events().is_empty());
        sel.set(99, &AreaPatch::default(), false);
        assert!(sel.take_events().is_empty());
    }

    #[test]
    fn commands_parse_from_method_names() {
        assert_eq!(
            Command::parse("set", &[json!(2), json!({"width": 40}), json!(true)]).unwrap(),
            Command::Set {
                id: 2,
                dims: AreaPatch {
                    width: Some(40.0),
                    ..Default::default()
                },
                silent: true,
            }
        );
        assert_eq!(
            Command::parse("add", &[json!({"x": 1, "y": 2, "width": 3, "height": 4})]).unwrap(),
            Command::Add(vec![AreaPatch::rect(1.0, 2.0, 3.0, 4.0)])
        );
        assert_eq!(
            Command::parse("contains", &[json!({"x": 5, "y": 6})]).unwrap(),
            Command::Contains(Point::new(5.0, 6.0))
        );
        assert!(matches!(
            Command::parse("explode", &[]),
            Err(AnnotateError::UnknownMethod { .. })
        ));
        assert!(matches!(
            Command::parse("remove", &[]),
            Err(AnnotateError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn dispatch_routes_commands() {
        let mut sel = selector(Options::default());
        sel.dispatch(Command::Add(vec![AreaPatch::rect(10.0, 10.0, 20.0, 20.0)]))
            .unwrap();
        assert_eq!(
            sel.dispatch(Command::Contains(Point::new(15.0, 15.0))).unwrap(),
            Reply::Contains(true)
        );
        match sel.dispatch(Command::QueryRelativeAreas).unwrap() {
            Reply::RelativeAreas(areas) => assert_eq!(areas.len(), 1),
            other => panic!("unexpected reply {other:?}"),
        }
        sel.dispatch(Command::Reset).unwrap();
        assert_eq!(sel.dispatch(Command::QueryAreas).unwrap(), Reply::Areas(vec![]));
        sel.dispatch(Command::Destroy).unwrap();
        assert!(matches!(
            sel.dispatch(Command::QueryAreas),
            Err(AnnotateError::Destroyed)
        ));
    }

    // ── Properties ──────────────────────────────────────────────────────

    #[derive(Clone, Debug)]
    enum Op {
        Draw(f32, f32, f32, f32),
        Move(usize, f32, f32),
        Resize(usize, usize, f32, f32),
        Nudge(usize),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let coord = || 0.0f32..400.0;
        prop_oneof![
            (coord(), coord(), coord(), coord()).prop_map(|(a, b, c, d)| Op::Draw(a, b, c, d)),
            (0usize..8, -50.0f32..450.0, -50.0f32..350.0).prop_map(|(i, x, y)| Op::Move(i, x, y)),
            (0usize..8, 0usize..8, coord(), coord())
                .prop_map(|(i, h, x, y)| Op::Resize(i, h, x, y)),
            (0usize..4).prop_map(Op::Nudge),
            (0usize..8).prop_map(Op::Delete),
        ]
    }

    fn pick(sel: &AreaSelector, index: usize) -> Option<AreaId> {
        let areas = sel.areas();
        if areas.is_empty() {
            None
        } else {
            Some(areas[index % areas.len()].id)
        }
    }

    fn apply(sel: &mut AreaSelector, op: &Op) {
        match *op {
            Op::Draw(x0, y0, x1, y1) => {
                draw(sel, (x0, y0), (x1, y1));
            }
            Op::Move(i, x, y) => {
                if let Some(id) = pick(sel, i) {
                    let area = *sel.area(id).unwrap();
                    sel.pointer_down_fill(id, Point::new(area.x, area.y));
                    sel.pointer_move(Point::new(x, y));
                    sel.pointer_up();
                }
            }
            Op::Resize(i, h, x, y) => {
                if let Some(id) = pick(sel, i) {
                    sel.pointer_down_handle(id, Handle::ALL[h]);
                    sel.pointer_move(Point::new(x, y));
                    sel.pointer_up();
                }
            }
            Op::Nudge(d) => {
                let directions = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
                sel.nudge(directions[d]);
            }
            Op::Delete(i) => {
                if let Some(id) = pick(sel, i) {
                    sel.delete(id);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn drawn_areas_respect_min_size(
            min_w in 1.0f32..40.0,
            min_h in 1.0f32..40.0,
            x0 in 0.0f32..400.0,
            y0 in 0.0f32..300.0,
            x1 in -100.0f32..500.0,
            y1 in -100.0f32..400.0,
        ) {
            let mut sel = selector(Options { min_size: [min_w, min_h], ..Default::default() });
            let id = draw(&mut sel, (x0, y0), (x1, y1)).unwrap();
            let area = sel.area(id).unwrap();
            prop_assert!(area.width >= min_w);
            prop_assert!(area.height >= min_h);
        }

        #[test]
        fn drawn_areas_respect_max_size(
            max_w in 20.0f32..200.0,
            max_h in 20.0f32..200.0,
            aspect in prop_oneof![Just(0.0f32), 0.25f32..4.0],
            x0 in 0.0f32..400.0,
            y0 in 0.0f32..300.0,
            x1 in 0.0f32..400.0,
            y1 in 0.0f32..300.0,
            handle in 0usize..8,
            x2 in -100.0f32..500.0,
            y2 in -100.0f32..400.0,
        ) {
            let mut sel = selector(Options {
                min_size: [10.0, 10.0],
                max_size: [max_w, max_h],
                aspect_ratio: aspect,
                ..Default::default()
            });
            let id = draw(&mut sel, (x0, y0), (x1, y1)).unwrap();
            let area = *sel.area(id).unwrap();
            prop_assert!(area.width <= max_w);
            prop_assert!(area.height <= max_h);

            sel.pointer_down_handle(id, Handle::ALL[handle]);
            sel.pointer_move(Point::new(x2, y2));
            sel.pointer_up();
            let area = sel.area(id).unwrap();
            prop_assert!(area.width <= max_w);
            prop_assert!(area.height <= max_h);
        }

        #[test]
        fn moved_areas_stay_on_the_image(
            x in 0i16..350,
            y in 0i16..250,
            w in 1i16..50,
            h in 1i16..50,
            to_x in -200i16..600,
            to_y in -200i16..500,
        ) {
            // Whole pixels keep the edge sums exact.
            let (x, y, w, h) = (f32::from(x), f32::from(y), f32::from(w), f32::from(h));
            let (to_x, to_y) = (f32::from(to_x), f32::from(to_y));
            let mut sel = selector(Options::default());
            let id = sel.add(&[AreaPatch::rect(x, y, w, h)])[0];
            sel.pointer_down_fill(id, Point::new(x + w / 2.0, y + h / 2.0));
            sel.pointer_move(Point::new(to_x, to_y));
            sel.pointer_up();
            let area = sel.area(id).unwrap();
            prop_assert!(area.x >= 0.0 && area.y >= 0.0);
            prop_assert!(area.x + area.width <= 400.0);
            prop_assert!(area.y + area.height <= 300.0);
        }

        #[test]
        fn at_most_one_area_is_focused(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let mut sel = selector(Options::default());
            for op in &ops {
                apply(&mut sel, op);
                let focused = sel.areas().iter().filter(|a| a.is_focused()).count();
                prop_assert!(focused <= 1);
            }
        }

        #[test]
        fn relative_areas_floor_the_scaled_geometry(
            natural in 100.0f32..2000.0,
            width in 50.0f32..1000.0,
            x in 0.0f32..40.0,
            y in 0.0f32..40.0,
            w in 1.0f32..40.0,
            h in 1.0f32..40.0,
        ) {
            let mut sel = AreaSelector::new(
                Size::new(natural, natural),
                Options { width, ..Default::default() },
            );
            sel.add(&[AreaPatch::rect(x, y, w, h)]);
            let ratio = sel.ratio();
            let area = sel.areas()[0];
            let rel = sel.relative_areas()[0];
            prop_assert_eq!(rel.x, (area.x / ratio).floor() as i32);
            prop_assert_eq!(rel.y, (area.y / ratio).floor() as i32);
            prop_assert_eq!(rel.width, (area.width / ratio).floor() as i32);
            prop_assert_eq!(rel.height, (area.height / ratio).floor() as i32);
        }
    }
}
