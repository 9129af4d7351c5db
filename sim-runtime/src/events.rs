//! # Events 模块
//!
//! 每个形状独立的指针事件订阅。
//!
//! ## 支持的事件
//!
//! - `hover`: 进入 / 离开两个回调（等价于 `mouseover` + `mouseleave`）
//! - `mouseover`: 指针进入形状
//! - `mouseleave`: 指针离开形状
//! - `click`: 在形状内点击
//! - `mousemove`: 在形状内移动
//!
//! ## 悬停状态机
//!
//! ```text
//!          contains && Idle
//!   Idle ─────────────────────► Hovering   (触发 mouseover)
//!     ▲                            │
//!     └────────────────────────────┘
//!          !contains && Hovering           (触发 mouseleave)
//! ```
//!
//! 指针停留在形状内时的连续移动事件不会重复触发 `mouseover`。

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

use tracing::warn;

use crate::error::EventError;
use crate::vector::Point;

/// 指针事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Click,
}

/// 指针事件（视口坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
        }
    }

    pub fn clicked(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Click,
            x,
            y,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// 可订阅的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Hover,
    MouseOver,
    MouseLeave,
    Click,
    MouseMove,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        Self::MouseMove,
        Self::Click,
        Self::Hover,
        Self::MouseOver,
        Self::MouseLeave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::MouseOver => "mouseover",
            Self::MouseLeave => "mouseleave",
            Self::Click => "click",
            Self::MouseMove => "mousemove",
        }
    }

    fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(EventKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent {
                name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

/// 悬停状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering,
}

/// 指针回调
pub type PointerCallback = Rc<dyn Fn(&PointerEvent)>;

/// 单个形状的事件路由
///
/// 只保存订阅和悬停状态；命中测试结果由形状在分发时传入。
#[derive(Default)]
pub struct EventRouter {
    hover: Cell<HoverState>,
    listeners: RefCell<Vec<(EventKind, PointerCallback)>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("hover", &self.hover.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover_state(&self) -> HoverState {
        self.hover.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    // ========== 订阅 ==========

    /// 按事件名订阅单个回调
    ///
    /// 未知事件名或缺少离开回调的 `hover` 记录警告，不做任何订阅。
    pub fn on<F>(&self, name: &str, callback: F) -> Result<(), EventError>
    where
        F: Fn(&PointerEvent) + 'static,
    {
        let kind = name.parse::<EventKind>().inspect_err(|e| {
            warn!(event = name, error = %e, "无效事件，忽略订阅");
        })?;

        if kind == EventKind::Hover {
            warn!("'hover' 需要进入和离开两个回调，请使用 on_hover");
            return Err(EventError::MissingLeaveCallback);
        }

        self.subscribe(kind, Rc::new(callback));
        Ok(())
    }

    /// 订阅悬停（进入 + 离开）
    pub fn on_hover<F, G>(&self, enter: F, leave: G)
    where
        F: Fn(&PointerEvent) + 'static,
        G: Fn(&PointerEvent) + 'static,
    {
        self.subscribe(EventKind::MouseOver, Rc::new(enter));
        self.subscribe(EventKind::MouseLeave, Rc::new(leave));
    }

    /// 按类型订阅
    pub fn subscribe(&self, kind: EventKind, callback: PointerCallback) {
        self.listeners.borrow_mut().push((kind, callback));
    }

    // ========== 分发 ==========

    /// 分发指针事件
    ///
    /// - `inside`: 事件坐标是否落在形状内
    pub fn dispatch(&self, event: &PointerEvent, inside: bool) {
        let mut fire = Vec::new();
        match event.kind {
            PointerKind::Move => {
                self.advance_hover(inside, &mut fire);
                if inside {
                    self.collect(EventKind::MouseMove, &mut fire);
                }
            }
            PointerKind::Click => {
                if inside {
                    self.collect(EventKind::Click, &mut fire);
                }
            }
        }
        // 回调里可能再次访问本路由（例如重新订阅），调用前不持有借用
        for callback in fire {
            callback(event);
        }
    }

    /// 只推进悬停状态机（每帧用最近的指针位置调用）
    pub fn refresh_hover(&self, event: &PointerEvent, inside: bool) {
        let mut fire = Vec::new();
        self.advance_hover(inside, &mut fire);
        for callback in fire {
            callback(event);
        }
    }

    fn advance_hover(&self, inside: bool, fire: &mut Vec<PointerCallback>) {
        match (self.hover.get(), inside) {
            (HoverState::Idle, true) => {
                self.hover.set(HoverState::Hovering);
                self.collect(EventKind::MouseOver, fire);
            }
            (HoverState::Hovering, false) => {
                self.hover.set(HoverState::Idle);
                self.collect(EventKind::MouseLeave, fire);
            }
            _ => {}
        }
    }

    fn collect(&self, kind: EventKind, fire: &mut Vec<PointerCallback>) {
        fire.extend(
            self.listeners
                .borrow()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, callback)| callback.clone()),
        );
    }
}

/// 可交互形状
///
/// 提供命中测试和事件路由的形状实现此 trait，即可获得 `on` / `on_hover`。
pub trait Interactive {
    /// 点是否落在形状内（边界上不算）
    fn contains(&self, point: &Point) -> bool;

    fn events(&self) -> &EventRouter;

    fn on<F>(&self, name: &str, callback: F) -> Result<(), EventError>
    where
        F: Fn(&PointerEvent) + 'static,
        Self: Sized,
    {
        self.events().on(name, callback)
    }

    fn on_hover<F, G>(&self, enter: F, leave: G)
    where
        F: Fn(&PointerEvent) + 'static,
        G: Fn(&PointerEvent) + 'static,
        Self: Sized,
    {
        self.events().on_hover(enter, leave);
    }

    fn hover_state(&self) -> HoverState {
        self.events().hover_state()
    }

    /// 命中测试后分发指针事件
    fn route_pointer(&self, event: &PointerEvent) {
        let inside = self.contains(&event.point());
        self.events().dispatch(event, inside);
    }

    /// 命中测试后刷新悬停状态
    fn route_hover(&self, event: &PointerEvent) {
        let inside = self.contains(&event.point());
        self.events().refresh_hover(event, inside);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&PointerEvent) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &PointerEvent| c.set(c.get() + 1))
    }

    #[test]
    fn test_parse_event_kind() {
        assert_eq!("hover".parse::<EventKind>().unwrap(), EventKind::Hover);
        assert_eq!("click".parse::<EventKind>().unwrap(), EventKind::Click);
        assert!("drag".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_unknown_event_is_noop() {
        let router = EventRouter::new();
        let (_, cb) = counter();
        assert!(router.on("drag", cb).is_err());
        assert_eq!(router.listener_count(), 0);
    }

    #[test]
    fn test_hover_requires_two_callbacks() {
        let router = EventRouter::new();
        let (_, cb) = counter();
        assert_eq!(router.on("hover", cb), Err(EventError::MissingLeaveCallback));
        assert_eq!(router.listener_count(), 0);
    }

    #[test]
    fn test_hover_fires_once_per_transition() {
        let router = EventRouter::new();
        let (enter_count, enter) = counter();
        let (leave_count, leave) = counter();
        router.on_hover(enter, leave);

        router.dispatch(&PointerEvent::moved(0.0, 0.0), true);
        router.dispatch(&PointerEvent::moved(1.0, 0.0), true);
        router.dispatch(&PointerEvent::moved(2.0, 0.0), true);
        assert_eq!(enter_count.get(), 1);
        assert_eq!(leave_count.get(), 0);
        assert_eq!(router.hover_state(), HoverState::Hovering);

        router.dispatch(&PointerEvent::moved(9.0, 0.0), false);
        router.dispatch(&PointerEvent::moved(10.0, 0.0), false);
        assert_eq!(enter_count.get(), 1);
        assert_eq!(leave_count.get(), 1);
        assert_eq!(router.hover_state(), HoverState::Idle);
    }

    #[test]
    fn test_click_and_mousemove_filter_by_containment() {
        let router = EventRouter::new();
        let (clicks, on_click) = counter();
        let (moves, on_move) = counter();
        router.on("click", on_click).unwrap();
        router.on("mousemove", on_move).unwrap();

        router.dispatch(&PointerEvent::clicked(0.0, 0.0), true);
        router.dispatch(&PointerEvent::clicked(0.0, 0.0), false);
        router.dispatch(&PointerEvent::moved(0.0, 0.0), true);
        router.dispatch(&PointerEvent::moved(0.0, 0.0), true);
        router.dispatch(&PointerEvent::moved(0.0, 0.0), false);

        assert_eq!(clicks.get(), 1);
        assert_eq!(moves.get(), 2);
    }

    #[test]
    fn test_callback_may_subscribe_during_dispatch() {
        let router = Rc::new(EventRouter::new());
        let r = router.clone();
        router
            .on("click", move |_| {
                r.subscribe(EventKind::Click, Rc::new(|_| {}));
            })
            .unwrap();

        router.dispatch(&PointerEvent::clicked(0.0, 0.0), true);
        assert_eq!(router.listener_count(), 2);
    }
}
