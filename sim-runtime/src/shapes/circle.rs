//! 圆

use std::cell::Cell;
use std::f64::consts::TAU;
use std::rc::Rc;

use crate::color::Color;
use crate::element::{Binding, Element, ElementCore, ElementId, SimulationElement};
use crate::events::{EventRouter, Interactive, PointerEvent};
use crate::surface::Surface;
use crate::transition::Completion;
use crate::vector::Point;

#[derive(Debug)]
struct CircleInner {
    core: ElementCore,
    radius: Rc<Cell<f64>>,
    events: EventRouter,
}

/// 圆
#[derive(Debug, Clone)]
pub struct Circle {
    inner: Rc<CircleInner>,
}

impl Circle {
    pub fn new(position: Point, radius: f64, color: Color) -> Self {
        Self {
            inner: Rc::new(CircleInner {
                core: ElementCore::new(position, color),
                radius: Rc::new(Cell::new(radius)),
                events: EventRouter::new(),
            }),
        }
    }

    pub fn radius(&self) -> f64 {
        self.inner.radius.get()
    }

    /// 半径过渡到 `value`
    pub fn set_radius(&self, value: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let step = (value - self.radius()) / core.tick_divisor(seconds);
        let (zero, tick, done) = (
            self.inner.radius.clone(),
            self.inner.radius.clone(),
            self.inner.radius.clone(),
        );

        core.transition(
            seconds,
            move || zero.set(value),
            move || tick.set(tick.get() + step),
            move || done.set(value),
        )
    }

    /// 半径乘以 `factor`
    pub fn scale(&self, factor: f64, seconds: f64) -> Completion {
        self.set_radius(self.radius() * factor, seconds)
    }
}

impl SimulationElement for Circle {
    fn core(&self) -> &ElementCore {
        &self.inner.core
    }
}

impl Interactive for Circle {
    fn contains(&self, point: &Point) -> bool {
        point.distance(&self.position()) < self.radius()
    }

    fn events(&self) -> &EventRouter {
        &self.inner.events
    }
}

impl Element for Circle {
    fn id(&self) -> ElementId {
        self.inner.core.id()
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let position = self.position();
        surface.begin_path();
        surface.set_fill_style(&self.color().to_hex());
        surface.arc(position.x(), position.y(), self.radius(), 0.0, TAU, false);
        surface.fill();
        surface.close_path();
    }

    fn bind(&self, binding: &Binding) {
        self.inner.core.bind(binding);
    }

    fn dispatch_pointer(&self, event: &PointerEvent) {
        self.route_pointer(event);
    }

    fn refresh_hover(&self, event: &PointerEvent) {
        self.route_hover(event);
    }
}
