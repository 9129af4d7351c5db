//! 线段
//!
//! 起点就是元素位置；终点只用于计算方向向量 `end - start`。
//! 旋转只作用于方向向量，平移同时移动两个端点。

use std::cell::RefCell;
use std::rc::Rc;

use crate::color::Color;
use crate::element::{Binding, Body, Element, ElementCore, ElementId, SimulationElement};
use crate::surface::Surface;
use crate::transition::Completion;
use crate::vector::{Point, Vector2D};

#[derive(Debug)]
struct LineState {
    end: Point,
    thickness: f64,
    rotation: f64,
    /// 方向向量（已应用旋转）
    vec: Vector2D,
}

impl LineState {
    fn rebuild_vector(&mut self, start: &Point) {
        self.vec = Vector2D::with_rotation(self.end.x() - start.x(), self.end.y() - start.y(), self.rotation);
    }
}

#[derive(Debug)]
struct LineInner {
    core: ElementCore,
    state: Rc<RefCell<LineState>>,
}

/// 线段
#[derive(Debug, Clone)]
pub struct Line {
    inner: Rc<LineInner>,
}

impl Line {
    pub fn new(start: Point, end: Point, thickness: f64, color: Color) -> Self {
        let mut state = LineState {
            end,
            thickness,
            rotation: 0.0,
            vec: Vector2D::default(),
        };
        state.rebuild_vector(&start);
        Self {
            inner: Rc::new(LineInner {
                core: ElementCore::new(start, color),
                state: Rc::new(RefCell::new(state)),
            }),
        }
    }

    /// 设置初始旋转角（角度制）
    pub fn with_rotation(self, rotation: f64) -> Self {
        self.inner.state.borrow_mut().rotation = rotation;
        self.rebuild_vector();
        self
    }

    pub fn start(&self) -> Point {
        self.position()
    }

    pub fn end(&self) -> Point {
        self.inner.state.borrow().end.clone()
    }

    pub fn thickness(&self) -> f64 {
        self.inner.state.borrow().thickness
    }

    pub fn rotation(&self) -> f64 {
        self.inner.state.borrow().rotation
    }

    /// 方向向量
    pub fn vector(&self) -> Vector2D {
        self.inner.state.borrow().vec.clone()
    }

    /// 移动起点（立即生效，重新计算方向向量）
    pub fn move_start(&self, point: &Point) {
        self.inner.core.body().borrow_mut().position = point.clone();
        self.rebuild_vector();
    }

    /// 移动终点（立即生效，重新计算方向向量）
    pub fn move_end(&self, point: &Point) {
        self.inner.state.borrow_mut().end = point.clone();
        self.rebuild_vector();
    }

    fn rebuild_vector(&self) {
        let start = self.position();
        self.inner.state.borrow_mut().rebuild_vector(&start);
    }

    pub fn rotate(&self, deg: f64, seconds: f64) -> Completion {
        let target = self.rotation() + deg;
        self.rotation_transition(target, seconds)
    }

    pub fn rotate_to(&self, deg: f64, seconds: f64) -> Completion {
        self.rotation_transition(deg, seconds)
    }

    fn rotation_transition(&self, target: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let step = (target - self.rotation()) / core.tick_divisor(seconds);
        let snap = move |state: &Rc<RefCell<LineState>>| {
            let mut state = state.borrow_mut();
            state.rotation = target;
            state.vec.rotate_to(target);
        };
        let state = &self.inner.state;
        let (zero, tick, done) = (state.clone(), state.clone(), state.clone());

        core.transition(
            seconds,
            move || snap(&zero),
            move || {
                let mut state = tick.borrow_mut();
                state.rotation += step;
                let rotation = state.rotation;
                state.vec.rotate_to(rotation);
            },
            move || snap(&done),
        )
    }

    fn translate(body: &RefCell<Body>, state: &RefCell<LineState>, dx: f64, dy: f64) {
        body.borrow_mut().position.translate(dx, dy);
        state.borrow_mut().end.translate(dx, dy);
    }
}

impl SimulationElement for Line {
    fn core(&self) -> &ElementCore {
        &self.inner.core
    }

    /// 同时平移两个端点
    fn move_by(&self, offset: &Vector2D, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let (dx, dy) = (offset.x(), offset.y());
        let n = core.tick_divisor(seconds);
        let (step_x, step_y) = (dx / n, dy / n);
        let start = self.position();
        let end = self.end();

        let zero = (core.body(), self.inner.state.clone());
        let tick = zero.clone();
        let done = zero.clone();

        core.transition(
            seconds,
            move || Self::translate(&zero.0, &zero.1, dx, dy),
            move || Self::translate(&tick.0, &tick.1, step_x, step_y),
            move || {
                done.0.borrow_mut().position.set(start.x() + dx, start.y() + dy);
                done.1.borrow_mut().end.set(end.x() + dx, end.y() + dy);
            },
        )
    }

    /// 把起点移动到 `point`，终点随之平移
    fn move_to(&self, point: &Point, seconds: f64) -> Completion {
        let start = self.position();
        self.move_by(&Vector2D::new(point.x() - start.x(), point.y() - start.y()), seconds)
    }
}

impl Element for Line {
    fn id(&self) -> ElementId {
        self.inner.core.id()
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let start = self.position();
        let state = self.inner.state.borrow();
        state
            .vec
            .draw(surface, start.x(), start.y(), &self.color().to_hex(), 1.0, state.thickness);
    }

    fn bind(&self, binding: &Binding) {
        self.inner.core.bind(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::scheduler::Scheduler;
    use crate::surface::RecordingSurface;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_vector_is_end_minus_start() {
        let line = Line::new(Point::new(1.0, 1.0), Point::new(4.0, 5.0), 2.0, Color::BLACK);
        assert_eq!(line.vector().x(), 3.0);
        assert_eq!(line.vector().y(), 4.0);

        line.move_end(&Point::new(1.0, 11.0));
        assert_eq!(line.vector().y(), 10.0);

        line.move_start(&Point::new(0.0, 0.0));
        assert_eq!(line.vector().x(), 1.0);
        assert_eq!(line.vector().y(), 11.0);
    }

    #[test]
    fn test_rotate_only_changes_direction() {
        let line = Line::new(Point::new(5.0, 5.0), Point::new(15.0, 5.0), 1.0, Color::BLACK);
        let _ = line.rotate(90.0, 0.0);

        assert_eq!(line.start(), Point::new(5.0, 5.0));
        assert_eq!(line.end(), Point::new(15.0, 5.0));
        assert!(line.vector().x().abs() < EPS);
        assert!((line.vector().y() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_move_by_translates_both_endpoints() {
        let scheduler = Scheduler::new(FrameClock::new(10.0));
        let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 1.0, Color::BLACK);
        line.bind(&Binding::new(&scheduler, "canvas"));

        let mut done = line.move_by(&Vector2D::new(0.0, 5.0), 1.0);
        scheduler.step_n(10);
        assert!(done.is_finished());
        assert_eq!(line.start(), Point::new(0.0, 5.0));
        assert_eq!(line.end(), Point::new(10.0, 5.0));
        assert_eq!(line.vector().x(), 10.0);
    }

    #[test]
    fn test_move_to_keeps_length() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0), 1.0, Color::BLACK);
        let _ = line.move_to(&Point::new(10.0, 10.0), 0.0);
        assert_eq!(line.start(), Point::new(10.0, 10.0));
        assert_eq!(line.end(), Point::new(13.0, 14.0));
    }

    #[test]
    fn test_draw_strokes_vector_from_start() {
        let line = Line::new(Point::new(2.0, 3.0), Point::new(12.0, 3.0), 4.0, Color::new(255.0, 0.0, 0.0));
        let mut surface = RecordingSurface::new();
        line.draw(&mut surface);

        insta::assert_snapshot!(surface.script(), @r"
        begin_path
        stroke_style #ff0000
        line_width 4
        move_to 2 3
        line_to 12 3
        stroke
        close_path
        ");
    }
}
