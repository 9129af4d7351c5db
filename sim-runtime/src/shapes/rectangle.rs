//! 矩形
//!
//! 四个角点各是一个以旋转中心（位置 + 偏移）为原点的 [`Vector2D`]，共享同一个旋转角。
//! 缩放类动画逐个角点独立推进，结束时把角点逆旋转回局部坐标系重新测量宽高。

use std::cell::RefCell;
use std::rc::Rc;

use crate::color::Color;
use crate::element::{Binding, Element, ElementCore, ElementId, SimulationElement};
use crate::events::{EventRouter, Interactive, PointerEvent};
use crate::surface::Surface;
use crate::transition::Completion;
use crate::vector::{Point, Vector2D};

/// 角点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// 水平方向符号（左 -1，右 +1）
    fn sign_x(self) -> f64 {
        match self {
            Self::TopLeft | Self::BottomLeft => -1.0,
            Self::TopRight | Self::BottomRight => 1.0,
        }
    }

    /// 垂直方向符号（上 -1，下 +1）
    fn sign_y(self) -> f64 {
        match self {
            Self::TopLeft | Self::TopRight => -1.0,
            Self::BottomLeft | Self::BottomRight => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct RectangleState {
    corners: [Vector2D; 4],
    width: f64,
    height: f64,
    offset_x: f64,
    offset_y: f64,
    rotation: f64,
    show_node_vectors: bool,
}

impl RectangleState {
    fn new(width: f64, height: f64, offset_x: f64, offset_y: f64, rotation: f64) -> Self {
        let corners = Corner::ALL.map(|corner| {
            Vector2D::new(
                corner.sign_x() * width / 2.0 - offset_x,
                corner.sign_y() * height / 2.0 - offset_y,
            )
        });
        let mut state = Self {
            corners,
            width,
            height,
            offset_x,
            offset_y,
            rotation,
            show_node_vectors: false,
        };
        state.apply_rotation();
        state
    }

    fn corner(&self, corner: Corner) -> &Vector2D {
        &self.corners[corner.index()]
    }

    fn apply_rotation(&mut self) {
        let rotation = self.rotation;
        for corner in &mut self.corners {
            corner.rotate_to(rotation);
        }
    }

    /// 角点在局部坐标系（逆旋转 `rotation`）中的坐标
    fn local(&self, corner: Corner) -> (f64, f64) {
        let v = self.corner(corner);
        let local = Vector2D::with_rotation(v.x(), v.y(), -self.rotation);
        (local.x(), local.y())
    }

    /// 用局部坐标重建角点
    fn set_local(&mut self, corner: Corner, (x, y): (f64, f64)) {
        self.corners[corner.index()] = Vector2D::with_rotation(x, y, self.rotation);
    }

    /// 局部坐标系中的边界 `(min_x, max_x, min_y, max_y)`
    fn local_bounds(&self) -> (f64, f64, f64, f64) {
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for corner in Corner::ALL {
            let (x, y) = self.local(corner);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        (min_x, max_x, min_y, max_y)
    }

    /// 在局部坐标系中重新测量宽高
    fn measure(&mut self) {
        let (min_x, max_x, min_y, max_y) = self.local_bounds();
        self.width = max_x - min_x;
        self.height = max_y - min_y;
    }

    fn for_each_corner(&mut self, mut f: impl FnMut(Corner, &mut Vector2D)) {
        for corner in Corner::ALL {
            f(corner, &mut self.corners[corner.index()]);
        }
    }
}

#[derive(Debug)]
struct RectangleInner {
    core: ElementCore,
    state: Rc<RefCell<RectangleState>>,
    events: EventRouter,
}

/// 矩形
#[derive(Debug, Clone)]
pub struct Rectangle {
    inner: Rc<RectangleInner>,
}

impl Rectangle {
    /// 以 `position` 为中心创建矩形
    pub fn new(position: Point, width: f64, height: f64, color: Color) -> Self {
        Self {
            inner: Rc::new(RectangleInner {
                core: ElementCore::new(position, color),
                state: Rc::new(RefCell::new(RectangleState::new(width, height, 0.0, 0.0, 0.0))),
                events: EventRouter::new(),
            }),
        }
    }

    /// 设置旋转中心相对位置的偏移（重建角点）
    pub fn with_offset(self, offset_x: f64, offset_y: f64) -> Self {
        {
            let mut state = self.inner.state.borrow_mut();
            let (width, height, rotation) = (state.width, state.height, state.rotation);
            *state = RectangleState::new(width, height, offset_x, offset_y, rotation);
        }
        self
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

    pub fn width(&self) -> f64 {
        self.inner.state.borrow().width
    }

    pub fn height(&self) -> f64 {
        self.inner.state.borrow().height
    }

    pub fn rotation(&self) -> f64 {
        self.inner.state.borrow().rotation
    }

    pub fn offset(&self) -> (f64, f64) {
        let state = self.inner.state.borrow();
        (state.offset_x, state.offset_y)
    }

    /// 角点（相对旋转中心的当前坐标）
    pub fn corner(&self, corner: Corner) -> Vector2D {
        self.inner.state.borrow().corner(corner).clone()
    }

    /// 是否绘制角点向量（调试）
    pub fn set_node_vectors(&self, show: bool) {
        self.inner.state.borrow_mut().show_node_vectors = show;
    }

    fn state(&self) -> Rc<RefCell<RectangleState>> {
        self.inner.state.clone()
    }

    // ========== 旋转 ==========

    /// 在当前角度上旋转 `deg` 度
    pub fn rotate(&self, deg: f64, seconds: f64) -> Completion {
        let target = self.rotation() + deg;
        self.rotation_transition(target, seconds)
    }

    /// 旋转到 `deg` 度
    pub fn rotate_to(&self, deg: f64, seconds: f64) -> Completion {
        self.rotation_transition(deg, seconds)
    }

    fn rotation_transition(&self, target: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let step = (target - self.rotation()) / core.tick_divisor(seconds);
        let snap = move |state: &Rc<RefCell<RectangleState>>| {
            let mut state = state.borrow_mut();
            state.rotation = target;
            state.apply_rotation();
        };
        let (zero, tick, done) = (self.state(), self.state(), self.state());

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

    // ========== 缩放 ==========

    /// 每个角点的模长乘以 `factor`
    pub fn scale(&self, factor: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let n = core.tick_divisor(seconds);
        let mags = self.inner.state.borrow().corners.clone().map(|c| c.mag());
        let (zero, tick, done) = (self.state(), self.state(), self.state());

        core.transition(
            seconds,
            move || {
                let mut state = zero.borrow_mut();
                state.for_each_corner(|_, v| v.multiply(factor));
                state.measure();
            },
            move || {
                tick.borrow_mut().for_each_corner(|corner, v| {
                    let mag = mags[corner.index()];
                    v.append_mag((mag * factor - mag) / n);
                });
            },
            move || {
                let mut state = done.borrow_mut();
                state.for_each_corner(|corner, v| v.set_mag(mags[corner.index()] * factor));
                state.measure();
            },
        )
    }

    /// 每个角点的 x 分量乘以 `factor`
    pub fn scale_width(&self, factor: f64, seconds: f64) -> Completion {
        self.axis_scale(Axis::X, factor, seconds)
    }

    /// 每个角点的 y 分量乘以 `factor`
    pub fn scale_height(&self, factor: f64, seconds: f64) -> Completion {
        self.axis_scale(Axis::Y, factor, seconds)
    }

    fn axis_scale(&self, axis: Axis, factor: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let n = core.tick_divisor(seconds);
        let starts = self.inner.state.borrow().corners.clone();
        let targets = starts.clone().map(|c| axis.get(&c) * factor);
        let steps = starts.clone().map(|c| (axis.get(&c) * factor - axis.get(&c)) / n);
        let (zero, tick, done) = (self.state(), self.state(), self.state());

        core.transition(
            seconds,
            move || {
                let mut state = zero.borrow_mut();
                state.for_each_corner(|_, v| axis.multiply(v, factor));
                state.measure();
            },
            move || {
                tick.borrow_mut()
                    .for_each_corner(|corner, v| axis.append(v, steps[corner.index()]));
            },
            move || {
                let mut state = done.borrow_mut();
                state.for_each_corner(|corner, v| {
                    *v = starts[corner.index()].clone();
                    axis.set(v, targets[corner.index()]);
                });
                state.measure();
            },
        )
    }

    /// 宽度过渡到 `value`（局部坐标系中保持水平中心不变）
    pub fn set_width(&self, value: f64, seconds: f64) -> Completion {
        let (center, current) = {
            let state = self.inner.state.borrow();
            let (left, _) = state.local(Corner::TopLeft);
            let (right, _) = state.local(Corner::TopRight);
            ((left + right) / 2.0, right - left)
        };
        self.axis_resize(Axis::X, center, current, value, seconds)
    }

    /// 高度过渡到 `value`（局部坐标系中保持垂直中心不变）
    pub fn set_height(&self, value: f64, seconds: f64) -> Completion {
        let (center, current) = {
            let state = self.inner.state.borrow();
            let (_, top) = state.local(Corner::TopRight);
            let (_, bottom) = state.local(Corner::BottomRight);
            ((top + bottom) / 2.0, bottom - top)
        };
        self.axis_resize(Axis::Y, center, current, value, seconds)
    }

    /// 宽度增加 `delta`
    pub fn expand_width(&self, delta: f64, seconds: f64) -> Completion {
        self.set_width(self.width() + delta, seconds)
    }

    /// 高度增加 `delta`
    pub fn expand_height(&self, delta: f64, seconds: f64) -> Completion {
        self.set_height(self.height() + delta, seconds)
    }

    fn axis_resize(&self, axis: Axis, center: f64, current: f64, value: f64, seconds: f64) -> Completion {
        let core = &self.inner.core;
        let half_step = (value - current) / 2.0 / core.tick_divisor(seconds);
        let snap = move |state: &Rc<RefCell<RectangleState>>| {
            let mut state = state.borrow_mut();
            for corner in Corner::ALL {
                let local = state.local(corner);
                let edge = center + axis.sign(corner) * value / 2.0;
                state.set_local(corner, axis.replace(local, edge));
            }
            state.measure();
        };
        let (zero, tick, done) = (self.state(), self.state(), self.state());

        core.transition(
            seconds,
            move || snap(&zero),
            move || {
                let mut state = tick.borrow_mut();
                for corner in Corner::ALL {
                    let local = state.local(corner);
                    let edge = axis.pick(local) + axis.sign(corner) * half_step;
                    state.set_local(corner, axis.replace(local, edge));
                }
            },
            move || snap(&done),
        )
    }
}

/// 缩放作用的坐标轴
#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn get(self, v: &Vector2D) -> f64 {
        match self {
            Self::X => v.x(),
            Self::Y => v.y(),
        }
    }

    fn set(self, v: &mut Vector2D, value: f64) {
        match self {
            Self::X => v.set_x(value),
            Self::Y => v.set_y(value),
        }
    }

    fn append(self, v: &mut Vector2D, value: f64) {
        match self {
            Self::X => v.append_x(value),
            Self::Y => v.append_y(value),
        }
    }

    fn multiply(self, v: &mut Vector2D, factor: f64) {
        match self {
            Self::X => v.multiply_x(factor),
            Self::Y => v.multiply_y(factor),
        }
    }

    fn pick(self, (x, y): (f64, f64)) -> f64 {
        match self {
            Self::X => x,
            Self::Y => y,
        }
    }

    fn replace(self, (x, y): (f64, f64), value: f64) -> (f64, f64) {
        match self {
            Self::X => (value, y),
            Self::Y => (x, value),
        }
    }

    fn sign(self, corner: Corner) -> f64 {
        match self {
            Self::X => corner.sign_x(),
            Self::Y => corner.sign_y(),
        }
    }
}

impl SimulationElement for Rectangle {
    fn core(&self) -> &ElementCore {
        &self.inner.core
    }
}

impl Interactive for Rectangle {
    /// 把查询点逆旋转到局部坐标系，再与角点的局部边界比较（严格不等）
    fn contains(&self, point: &Point) -> bool {
        let position = self.position();
        let state = self.inner.state.borrow();
        let local = Vector2D::with_rotation(
            point.x() - position.x() - state.offset_x,
            point.y() - position.y() - state.offset_y,
            -state.rotation,
        );
        let (min_x, max_x, min_y, max_y) = state.local_bounds();

        local.x() > min_x && local.x() < max_x && local.y() > min_y && local.y() < max_y
    }

    fn events(&self) -> &EventRouter {
        &self.inner.events
    }
}

impl Element for Rectangle {
    fn id(&self) -> ElementId {
        self.inner.core.id()
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let position = self.position();
        let state = self.inner.state.borrow();
        let origin_x = position.x() + state.offset_x;
        let origin_y = position.y() + state.offset_y;

        surface.begin_path();
        surface.set_fill_style(&self.color().to_hex());
        let path = [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomRight,
            Corner::BottomLeft,
        ];
        for (i, corner) in path.into_iter().enumerate() {
            let v = state.corner(corner);
            if i == 0 {
                surface.move_to(origin_x + v.x(), origin_y + v.y());
            } else {
                surface.line_to(origin_x + v.x(), origin_y + v.y());
            }
        }
        surface.fill();
        surface.close_path();

        if state.show_node_vectors {
            for corner in &state.corners {
                corner.draw(surface, origin_x, origin_y, "#000000", 1.0, 1.0);
            }
        }
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
