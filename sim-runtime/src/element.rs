//! # Element 模块
//!
//! 场景元素的核心接口。
//!
//! ## 核心概念
//!
//! - [`ElementId`]: 创建时分配的唯一标识符，用于按身份移除
//! - [`Binding`]: 元素加入场景后获得的绑定（调度器弱引用 + 绘图表面 id）
//! - [`Element`]: 可绘制能力接口，场景图只接受实现了它的值
//! - [`ElementCore`] / [`SimulationElement`]: 位置 + 颜色，以及基于过渡引擎的 `fill` / `move_by` / `move_to`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::clock::FrameClock;
use crate::color::{Color, ColorInput};
use crate::events::PointerEvent;
use crate::scheduler::{Scheduler, WeakScheduler};
use crate::surface::Surface;
use crate::transition::{Completion, TransitionOutcome};
use crate::vector::{Point, Vector2D};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// 元素唯一标识符
///
/// 使用全局计数器生成，不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// 分配新的 ID
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Element({})", self.0)
    }
}

/// 元素与舞台之间的绑定
#[derive(Debug, Clone)]
pub struct Binding {
    scheduler: WeakScheduler,
    surface_id: Rc<str>,
}

impl Binding {
    pub fn new(scheduler: &Scheduler, surface_id: &str) -> Self {
        Self {
            scheduler: scheduler.downgrade(),
            surface_id: Rc::from(surface_id),
        }
    }

    /// 调度器（舞台已销毁时为 `None`）
    pub fn scheduler(&self) -> Option<Scheduler> {
        self.scheduler.upgrade()
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }
}

/// 可绘制元素
///
/// 场景图中的每个成员都实现此 trait。`draw` 只根据当前状态产生绘图调用，不修改模型状态。
pub trait Element {
    fn id(&self) -> ElementId;

    /// 把当前状态绘制到表面
    fn draw(&self, surface: &mut dyn Surface);

    /// 绑定到舞台（集合会向所有子元素传播）
    fn bind(&self, binding: &Binding);

    /// 处理指针事件（可交互元素覆盖）
    fn dispatch_pointer(&self, _event: &PointerEvent) {}

    /// 用最近的指针位置重新检查悬停状态（每帧调用）
    fn refresh_hover(&self, _event: &PointerEvent) {}

    /// 是否（直接或间接）包含指定元素
    fn contains_element(&self, _id: ElementId) -> bool {
        false
    }
}

/// 元素基础状态：位置和颜色
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Point,
    pub color: Color,
}

/// 元素公共部分
#[derive(Debug)]
pub struct ElementCore {
    id: ElementId,
    body: Rc<RefCell<Body>>,
    binding: RefCell<Option<Binding>>,
}

impl ElementCore {
    pub fn new(position: Point, color: Color) -> Self {
        Self {
            id: ElementId::next(),
            body: Rc::new(RefCell::new(Body { position, color })),
            binding: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.body.borrow().position.clone()
    }

    pub fn color(&self) -> Color {
        self.body.borrow().color
    }

    /// 共享的基础状态（供动画回调持有）
    pub fn body(&self) -> Rc<RefCell<Body>> {
        self.body.clone()
    }

    pub fn bind(&self, binding: &Binding) {
        *self.binding.borrow_mut() = Some(binding.clone());
    }

    pub fn is_bound(&self) -> bool {
        self.binding.borrow().is_some()
    }

    pub fn scheduler(&self) -> Option<Scheduler> {
        self.binding.borrow().as_ref().and_then(Binding::scheduler)
    }

    /// 按绑定的帧时钟换算 tick 数；未绑定时使用默认时钟
    pub fn ticks_for(&self, seconds: f64) -> u32 {
        self.scheduler()
            .map(|s| s.clock())
            .unwrap_or_else(FrameClock::default)
            .ticks_for(seconds)
    }

    /// 每个 tick 的增量除数（至少为 1）
    pub(crate) fn tick_divisor(&self, seconds: f64) -> f64 {
        f64::from(self.ticks_for(seconds).max(1))
    }

    /// 通过绑定的调度器启动过渡
    ///
    /// 未加入舞台的元素没有调度器：时长大于 0 时直接应用最终值并记录警告。
    pub fn transition<Z, T, C>(&self, seconds: f64, on_zero: Z, on_tick: T, on_complete: C) -> Completion
    where
        Z: FnOnce(),
        T: FnMut() + 'static,
        C: FnOnce() + 'static,
    {
        match self.scheduler() {
            Some(scheduler) => scheduler.transition(seconds, on_zero, on_tick, on_complete),
            None => {
                if seconds > 0.0 {
                    warn!(id = %self.id, seconds = seconds, "元素未加入舞台，直接应用最终值");
                    on_complete();
                } else {
                    on_zero();
                }
                Completion::resolved(TransitionOutcome::Completed)
            }
        }
    }

    // ========== 动画 ==========

    /// 颜色过渡
    ///
    /// 颜色无效时记录错误，返回已完成的信号。
    pub fn fill(&self, color: impl Into<ColorInput>, seconds: f64) -> Completion {
        let target = match color.into().resolve() {
            Ok(color) => color,
            Err(e) => {
                error!(id = %self.id, error = %e, "填充颜色无效");
                return Completion::resolved(TransitionOutcome::Completed);
            }
        };

        let mut current = self.color();
        let delta = current.step_towards(&target, self.ticks_for(seconds));
        let (zero, tick, done) = (self.body(), self.body(), self.body());

        self.transition(
            seconds,
            move || zero.borrow_mut().color = target,
            move || {
                current.offset(&delta);
                tick.borrow_mut().color = current;
            },
            move || done.borrow_mut().color = target,
        )
    }

    /// 相对位移
    pub fn move_by(&self, offset: &Vector2D, seconds: f64) -> Completion {
        let (dx, dy) = (offset.x(), offset.y());
        let n = self.tick_divisor(seconds);
        let (step_x, step_y) = (dx / n, dy / n);
        let start = self.position();
        let (zero, tick, done) = (self.body(), self.body(), self.body());

        self.transition(
            seconds,
            move || zero.borrow_mut().position.translate(dx, dy),
            move || tick.borrow_mut().position.translate(step_x, step_y),
            move || {
                done.borrow_mut()
                    .position
                    .set(start.x() + dx, start.y() + dy)
            },
        )
    }

    /// 移动到指定点
    pub fn move_to(&self, point: &Point, seconds: f64) -> Completion {
        let (tx, ty) = (point.x(), point.y());
        let n = self.tick_divisor(seconds);
        let start = self.position();
        let (step_x, step_y) = ((tx - start.x()) / n, (ty - start.y()) / n);
        let (zero, tick, done) = (self.body(), self.body(), self.body());

        self.transition(
            seconds,
            move || zero.borrow_mut().position.set(tx, ty),
            move || tick.borrow_mut().position.translate(step_x, step_y),
            move || done.borrow_mut().position.set(tx, ty),
        )
    }
}

/// 带位置和颜色的元素
///
/// 形状只需提供 [`SimulationElement::core`]，即可获得 `fill` / `move_by` / `move_to`。
pub trait SimulationElement {
    fn core(&self) -> &ElementCore;

    fn position(&self) -> Point {
        self.core().position()
    }

    fn color(&self) -> Color {
        self.core().color()
    }

    /// 颜色过渡（`seconds == 0` 立即生效）
    fn fill(&self, color: impl Into<ColorInput>, seconds: f64) -> Completion
    where
        Self: Sized,
    {
        self.core().fill(color, seconds)
    }

    /// 相对位移
    fn move_by(&self, offset: &Vector2D, seconds: f64) -> Completion {
        self.core().move_by(offset, seconds)
    }

    /// 移动到指定点
    fn move_to(&self, point: &Point, seconds: f64) -> Completion {
        self.core().move_to(point, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;

    fn bound_core(scheduler: &Scheduler) -> ElementCore {
        let core = ElementCore::new(Point::new(0.0, 0.0), Color::BLACK);
        core.bind(&Binding::new(scheduler, "canvas"));
        core
    }

    #[test]
    fn test_element_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn test_fill_zero_applies_immediately() {
        let scheduler = Scheduler::new(FrameClock::default());
        let core = bound_core(&scheduler);

        let mut done = core.fill(Color::WHITE, 0.0);
        assert_eq!(core.color(), Color::WHITE);
        assert_eq!(done.try_outcome(), Some(TransitionOutcome::Completed));
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_fill_converges_exactly() {
        let scheduler = Scheduler::new(FrameClock::new(60.0));
        let core = bound_core(&scheduler);
        let target = Color::new(10.0, 200.0, 33.3);

        let mut done = core.fill(target, 0.5);
        let mut last = core.color();
        for _ in 0..29 {
            scheduler.step();
            let c = core.color();
            assert!(c.r >= last.r && c.r <= target.r);
            assert!(c.g >= last.g && c.g <= target.g);
            last = c;
        }
        assert!(!done.is_finished());

        scheduler.step();
        assert!(done.is_finished());
        assert_eq!(core.color(), target);
    }

    #[test]
    fn test_fill_invalid_hex_is_soft_failure() {
        let scheduler = Scheduler::new(FrameClock::default());
        let core = bound_core(&scheduler);

        let mut done = core.fill("#nothex", 1.0);
        assert_eq!(done.try_outcome(), Some(TransitionOutcome::Completed));
        assert_eq!(core.color(), Color::BLACK);
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_fill_hex_string() {
        let scheduler = Scheduler::new(FrameClock::default());
        let core = bound_core(&scheduler);
        let _ = core.fill("#ff0000", 0.0);
        assert_eq!(core.color(), Color::new(255.0, 0.0, 0.0));
    }

    #[test]
    fn test_unbound_element_applies_final_value() {
        let core = ElementCore::new(Point::new(1.0, 1.0), Color::BLACK);
        let mut done = core.move_to(&Point::new(5.0, 6.0), 2.0);
        assert_eq!(done.try_outcome(), Some(TransitionOutcome::Completed));
        assert_eq!(core.position(), Point::new(5.0, 6.0));
    }

    #[test]
    fn test_move_by_snaps_to_start_plus_offset() {
        let scheduler = Scheduler::new(FrameClock::new(30.0));
        let core = bound_core(&scheduler);

        let mut done = core.move_by(&Vector2D::new(0.1, -0.7), 1.0);
        scheduler.step_n(30);
        assert!(done.is_finished());
        assert_eq!(core.position().x(), 0.1);
        assert_eq!(core.position().y(), -0.7);
    }

    #[test]
    fn test_overlapping_moves_interleave() {
        let scheduler = Scheduler::new(FrameClock::new(10.0));
        let core = bound_core(&scheduler);

        let mut first = core.move_by(&Vector2D::new(10.0, 0.0), 1.0);
        let mut second = core.move_by(&Vector2D::new(10.0, 0.0), 1.0);

        // 两个过渡的增量叠加
        scheduler.step_n(5);
        assert!((core.position().x() - 10.0).abs() < 1e-9);

        // 各自在结束时写入 "起点 + 位移"，起点快照相同
        scheduler.step_n(5);
        assert!(first.is_finished());
        assert!(second.is_finished());
        assert_eq!(core.position().x(), 10.0);
    }
}
