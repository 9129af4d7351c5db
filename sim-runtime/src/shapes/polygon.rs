//! 多边形
//!
//! 顶点保存为相对位置的偏移向量，旋转时每个顶点从自己的静止坐标重新计算。
//! 多边形没有命中测试，因此不支持指针事件。

use std::cell::RefCell;
use std::rc::Rc;

use crate::color::Color;
use crate::element::{Binding, Element, ElementCore, ElementId, SimulationElement};
use crate::surface::Surface;
use crate::transition::Completion;
use crate::vector::Point;

#[derive(Debug)]
struct PolygonState {
    points: Vec<Point>,
    rotation: f64,
}

impl PolygonState {
    fn apply_rotation(&mut self) {
        let rotation = self.rotation;
        for point in &mut self.points {
            point.rotate_to(rotation);
        }
    }
}

#[derive(Debug)]
struct PolygonInner {
    core: ElementCore,
    state: Rc<RefCell<PolygonState>>,
}

/// 多边形
#[derive(Debug, Clone)]
pub struct Polygon {
    inner: Rc<PolygonInner>,
}

impl Polygon {
    /// - `points`: 相对 `position` 的顶点
    pub fn new(position: Point, points: Vec<Point>, color: Color) -> Self {
        Self::with_offset(position, points, color, 0.0, 0.0)
    }

    /// 创建多边形，顶点整体加上 `(offset_x, offset_y)` 后作为旋转用的静止坐标
    pub fn with_offset(position: Point, points: Vec<Point>, color: Color, offset_x: f64, offset_y: f64) -> Self {
        let points = points
            .iter()
            .map(|p| Point::new(p.x() + offset_x, p.y() + offset_y))
            .collect();
        Self {
            inner: Rc::new(PolygonInner {
                core: ElementCore::new(position, color),
                state: Rc::new(RefCell::new(PolygonState {
                    points,
                    rotation: 0.0,
                })),
            }),
        }
    }

    /// 设置初始旋转角（角度制）
    pub fn with_rotation(self, rotation: f64) -> Self {
        {
            let mut state = self.inner.state.borrow_mut();
            state.rotation = rotation;
            state.apply_rotation();
        }
        self
    }

    /// 顶点（相对位置的当前坐标）
    pub fn points(&self) -> Vec<Point> {
        self.inner.state.borrow().points.clone()
    }

    pub fn rotation(&self) -> f64 {
        self.inner.state.borrow().rotation
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
        let snap = move |state: &Rc<RefCell<PolygonState>>| {
            let mut state = state.borrow_mut();
            state.rotation = target;
            state.apply_rotation();
        };
        let state = &self.inner.state;
        let (zero, tick, done) = (state.clone(), state.clone(), state.clone());

        core.transition(
            seconds,
            move || snap(&zero),
            move || {
                let mut state = tick.borrow_mut();
                state.rotation += step;
                state.apply_rotation();
            },
            move || snap(&done),
        )
    }
}

impl SimulationElement for Polygon {
    fn core(&self) -> &ElementCore {
        &self.inner.core
    }
}

impl Element for Polygon {
    fn id(&self) -> ElementId {
        self.inner.core.id()
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let state = self.inner.state.borrow();
        let Some((first, rest)) = state.points.split_first() else {
            return;
        };
        let position = self.position();

        surface.begin_path();
        surface.set_fill_style(&self.color().to_hex());
        surface.move_to(first.x() + position.x(), first.y() + position.y());
        for point in rest {
            surface.line_to(point.x() + position.x(), point.y() + position.y());
        }
        surface.fill();
        surface.close_path();
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

    fn triangle() -> Vec<Point> {
        vec![
            Point::new(0.0, -10.0),
            Point::new(10.0, 10.0),
            Point::new(-10.0, 10.0),
        ]
    }

    #[test]
    fn test_offset_applied_at_construction() {
        let polygon = Polygon::with_offset(Point::new(0.0, 0.0), triangle(), Color::BLACK, 5.0, 0.0);
        assert_eq!(polygon.points()[0], Point::new(5.0, -10.0));
    }

    #[test]
    fn test_rotate_is_absolute_from_rest() {
        let scheduler = Scheduler::new(FrameClock::new(20.0));
        let polygon = Polygon::new(Point::new(0.0, 0.0), triangle(), Color::BLACK);
        polygon.bind(&Binding::new(&scheduler, "canvas"));

        let mut done = polygon.rotate(180.0, 0.5);
        scheduler.step_n(10);
        assert!(done.is_finished());

        let _ = polygon.rotate_to(0.0, 0.0);
        let apex = &polygon.points()[0];
        assert!((apex.x() - 0.0).abs() < 1e-9);
        assert!((apex.y() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_translates_points() {
        let polygon = Polygon::new(Point::new(100.0, 50.0), triangle(), Color::BLACK);
        let mut surface = RecordingSurface::new();
        polygon.draw(&mut surface);

        insta::assert_snapshot!(surface.script(), @r"
        begin_path
        fill_style #000000
        move_to 100 40
        line_to 110 60
        line_to 90 60
        fill
        close_path
        ");
    }

    #[test]
    fn test_empty_polygon_draws_nothing() {
        let polygon = Polygon::new(Point::new(0.0, 0.0), Vec::new(), Color::BLACK);
        let mut surface = RecordingSurface::new();
        polygon.draw(&mut surface);
        assert!(surface.is_empty());
    }
}
