//! # Stage 模块
//!
//! 舞台：场景图的根。持有调度器、绘图表面和根集合，负责逐帧渲染和指针事件路由。
//!
//! ## 每帧流程
//!
//! ```text
//! scheduler.tick(now)     推进所有过渡
//!        │
//!        ▼
//! clear_rect + 背景填充
//!        │
//!        ▼
//! root.draw(surface)      匿名元素 → 带键元素，递归
//!        │
//!        ▼
//! root.refresh_hover()    用最近的指针位置刷新悬停状态
//! ```
//!
//! ## 惰性舞台
//!
//! 找不到绘图表面时舞台仍然可以构造和添加元素，但不会渲染，也不路由指针事件。
//! 调度器照常推进，动画仍然会完成。
//!
//! 所有方法都只需要 `&self`，因此渲染循环 [`Stage::run`] 可以和动画脚本在同一个
//! 单线程运行时里并发执行。

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::FrameClock;
use crate::color::{Color, ColorInput};
use crate::config::StageConfig;
use crate::element::{Binding, Element};
use crate::error::{ColorError, EventError, SceneError};
use crate::events::{EventKind, PointerCallback, PointerEvent, PointerKind};
use crate::scene::SceneCollection;
use crate::scheduler::Scheduler;
use crate::surface::{Surface, SurfaceHost};

/// 实时渲染循环的最长帧间隔
const MAX_FRAME_PERIOD: Duration = Duration::from_secs(60 * 60);

/// 舞台级监听器支持的事件
const STAGE_EVENTS: [EventKind; 2] = [EventKind::MouseMove, EventKind::Click];

/// 舞台
pub struct Stage {
    config: StageConfig,
    scheduler: Scheduler,
    root: SceneCollection,
    surface: RefCell<Option<Box<dyn Surface>>>,
    background: Cell<Color>,
    size: Cell<(f64, f64)>,
    container: Cell<Option<(f64, f64)>>,
    fitting: Cell<bool>,
    last_pointer: Cell<Option<PointerEvent>>,
    listeners: RefCell<Vec<(PointerKind, PointerCallback)>>,
    frame_count: Cell<u64>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("surface_id", &self.config.surface_id)
            .field("inert", &self.is_inert())
            .field("size", &self.size.get())
            .field("frame_count", &self.frame_count.get())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Stage {
    /// 创建舞台
    ///
    /// 从宿主按 `config.surface_id` 获取绘图表面；不存在时记录警告，舞台进入惰性模式。
    pub fn new(config: StageConfig, host: &mut dyn SurfaceHost) -> Self {
        let scheduler = Scheduler::new(FrameClock::new(config.fps));
        let root = SceneCollection::named("root");
        root.bind(&Binding::new(&scheduler, &config.surface_id));

        let surface = host.acquire(&config.surface_id);
        if surface.is_none() {
            warn!(surface_id = %config.surface_id, "找不到绘图表面，舞台不会渲染");
        }

        let background = Color::from_hex(&config.background).unwrap_or_else(|e| {
            error!(error = %e, "背景色无效，使用白色");
            Color::WHITE
        });

        let stage = Self {
            size: Cell::new((config.width, config.height)),
            container: Cell::new(host.container_size(&config.surface_id)),
            fitting: Cell::new(false),
            surface: RefCell::new(surface),
            background: Cell::new(background),
            last_pointer: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            frame_count: Cell::new(0),
            scheduler,
            root,
            config,
        };

        if stage.config.fit_container {
            stage.fit_element();
        }

        info!(
            surface_id = %stage.config.surface_id,
            fps = stage.scheduler.clock().fps(),
            inert = stage.is_inert(),
            "舞台已创建"
        );
        stage
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// 调度器句柄
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    pub fn clock(&self) -> FrameClock {
        self.scheduler.clock()
    }

    /// 根集合
    pub fn root(&self) -> &SceneCollection {
        &self.root
    }

    /// 是否缺少绘图表面
    pub fn is_inert(&self) -> bool {
        self.surface.borrow().is_none()
    }

    /// 已渲染的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    // ========== 场景 ==========

    /// 添加元素（`key` 为 `None` 时追加到最上层）
    pub fn add<E: Element + 'static>(&self, element: E, key: Option<&str>) -> Result<(), SceneError> {
        self.root.add(element, key)
    }

    /// 添加到最下层
    pub fn add_behind<E: Element + 'static>(&self, element: E) -> Result<(), SceneError> {
        self.root.add_behind(element)
    }

    pub fn remove_with_id(&self, key: &str) -> Option<Rc<dyn Element>> {
        self.root.remove_with_id(key)
    }

    pub fn remove_with_object(&self, element: &dyn Element) -> bool {
        self.root.remove_with_object(element)
    }

    pub fn get(&self, key: &str) -> Option<Rc<dyn Element>> {
        self.root.get(key)
    }

    // ========== 尺寸 ==========

    pub fn width(&self) -> f64 {
        self.size.get().0
    }

    pub fn height(&self) -> f64 {
        self.size.get().1
    }

    pub fn is_fitting(&self) -> bool {
        self.fitting.get()
    }

    /// 跟随容器尺寸
    pub fn fit_element(&self) {
        if self.is_inert() {
            return;
        }
        self.fitting.set(true);
        self.apply_container_size();
    }

    /// 固定尺寸（取消跟随容器）
    pub fn set_size(&self, width: f64, height: f64) {
        if self.is_inert() {
            return;
        }
        self.size.set((width, height));
        self.fitting.set(false);
    }

    /// 容器尺寸变化（宿主的 resize 事件）
    pub fn resize(&self, container_width: f64, container_height: f64) {
        self.container.set(Some((container_width, container_height)));
        self.apply_container_size();
    }

    fn apply_container_size(&self) {
        if !self.fitting.get() {
            return;
        }
        match self.container.get() {
            Some(size) => {
                debug!(width = size.0, height = size.1, "跟随容器尺寸");
                self.size.set(size);
            }
            None => debug!("容器尺寸未知，保持当前尺寸"),
        }
    }

    // ========== 背景 ==========

    pub fn background(&self) -> Color {
        self.background.get()
    }

    /// 设置背景色（颜色值或十六进制字符串）
    ///
    /// 无效输入记录警告，背景保持不变。
    pub fn set_background_color(&self, color: impl Into<ColorInput>) -> Result<(), ColorError> {
        let color = color.into().resolve().inspect_err(|e| {
            warn!(error = %e, "无效的背景色");
        })?;
        self.background.set(color);
        Ok(())
    }

    // ========== 指针事件 ==========

    /// 舞台级指针监听（`mousemove` / `click`），不做命中测试
    pub fn on<F>(&self, name: &str, callback: F) -> Result<(), EventError>
    where
        F: Fn(&PointerEvent) + 'static,
    {
        let kind = match name.parse::<EventKind>() {
            Ok(EventKind::MouseMove) => PointerKind::Move,
            Ok(EventKind::Click) => PointerKind::Click,
            _ => {
                let valid = STAGE_EVENTS.map(|k| k.as_str()).join(", ");
                warn!(event = name, valid = %valid, "舞台不支持该事件，忽略订阅");
                return Err(EventError::UnknownEvent {
                    name: name.to_string(),
                    valid,
                });
            }
        };
        self.listeners.borrow_mut().push((kind, Rc::new(callback)));
        Ok(())
    }

    /// 指针移动
    pub fn pointer_move(&self, x: f64, y: f64) {
        self.route_pointer(PointerEvent::moved(x, y));
    }

    /// 点击
    pub fn click(&self, x: f64, y: f64) {
        self.route_pointer(PointerEvent::clicked(x, y));
    }

    /// 最近一次指针移动事件
    pub fn last_pointer(&self) -> Option<PointerEvent> {
        self.last_pointer.get()
    }

    fn route_pointer(&self, event: PointerEvent) {
        if self.is_inert() {
            return;
        }
        if event.kind == PointerKind::Move {
            self.last_pointer.set(Some(event));
        }

        let fire: Vec<PointerCallback> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in fire {
            callback(&event);
        }

        self.root.dispatch_pointer(&event);
    }

    // ========== 渲染 ==========

    /// 渲染一帧；惰性舞台返回 `false`
    pub fn frame(&self) -> bool {
        {
            let mut surface = self.surface.borrow_mut();
            let Some(surface) = surface.as_mut() else {
                return false;
            };
            let (width, height) = self.size.get();

            surface.clear_rect(0.0, 0.0, width, height);
            surface.begin_path();
            surface.set_fill_style(&self.background.get().to_hex());
            surface.fill_rect(0.0, 0.0, width, height);
            surface.close_path();

            self.root.draw(&mut **surface);
        }
        self.frame_count.set(self.frame_count.get() + 1);

        // 悬停回调可能启动新的动画，在释放绘图表面之后调用
        if let Some(event) = self.last_pointer.get() {
            self.root.refresh_hover(&event);
        }
        true
    }

    /// 按帧率推进一个 tick 并渲染
    pub fn step(&self) {
        self.scheduler.step();
        self.frame();
    }

    pub fn step_n(&self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// 实时渲染循环
    ///
    /// - `frames`: 渲染的帧数；`None` 时一直运行
    ///
    /// 返回本次渲染的帧数。惰性舞台立即返回 0。
    pub async fn run(&self, frames: Option<u64>) -> u64 {
        if self.is_inert() {
            warn!("舞台没有绘图表面，渲染循环不启动");
            return 0;
        }

        let period = self
            .clock()
            .interval()
            .clamp(Duration::from_nanos(1), MAX_FRAME_PERIOD);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let start = tokio::time::Instant::now();
        let offset = self.scheduler.now();
        let mut drawn = 0;

        while frames.is_none_or(|limit| drawn < limit) {
            interval.tick().await;
            self.scheduler.tick(offset.saturating_add(start.elapsed()));
            self.frame();
            drawn += 1;
        }

        debug!(frames = drawn, "渲染循环结束");
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::SimulationElement;
    use crate::events::Interactive;
    use crate::shapes::Circle;
    use crate::surface::{DrawCommand, RecordingHost};
    use crate::vector::Point;

    fn stage_with_surface(config: StageConfig) -> (Stage, crate::surface::RecordingSurface) {
        let mut host = RecordingHost::new();
        let surface = host.register(&config.surface_id);
        (Stage::new(config, &mut host), surface)
    }

    #[test]
    fn test_frame_draws_background_then_scene() {
        let (stage, surface) = stage_with_surface(StageConfig {
            width: 100.0,
            height: 50.0,
            ..Default::default()
        });
        stage
            .add(Circle::new(Point::new(10.0, 10.0), 5.0, Color::BLACK), None)
            .unwrap();

        assert!(stage.frame());
        let commands = surface.commands();
        assert_eq!(
            commands[..5],
            [
                DrawCommand::ClearRect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 50.0
                },
                DrawCommand::BeginPath,
                DrawCommand::FillStyle("#ffffff".to_string()),
                DrawCommand::FillRect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 50.0
                },
                DrawCommand::ClosePath,
            ]
        );
        assert!(commands.iter().any(|c| matches!(c, DrawCommand::Arc { .. })));
        assert_eq!(stage.frame_count(), 1);
    }

    #[test]
    fn test_missing_surface_is_inert() {
        let mut host = RecordingHost::new();
        let stage = Stage::new(StageConfig::default(), &mut host);
        assert!(stage.is_inert());
        assert!(!stage.frame());

        // 调度器仍然推进
        let circle = Circle::new(Point::new(0.0, 0.0), 1.0, Color::BLACK);
        stage.add(circle.clone(), None).unwrap();
        let mut done = circle.fill(Color::WHITE, 0.1);
        stage.step_n(6);
        assert!(done.is_finished());
        assert_eq!(stage.frame_count(), 0);
    }

    #[test]
    fn test_background_color() {
        let (stage, _) = stage_with_surface(StageConfig::default());
        stage.set_background_color("#000").unwrap();
        assert_eq!(stage.background(), Color::BLACK);

        assert!(stage.set_background_color("black").is_err());
        assert_eq!(stage.background(), Color::BLACK);

        stage.set_background_color(Color::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(stage.background().to_hex(), "#010203");
    }

    #[test]
    fn test_fit_and_resize() {
        let mut host = RecordingHost::new();
        host.register("canvas");
        host.set_container_size("canvas", 1024.0, 768.0);
        let stage = Stage::new(
            StageConfig {
                fit_container: true,
                ..Default::default()
            },
            &mut host,
        );
        assert!(stage.is_fitting());
        assert_eq!((stage.width(), stage.height()), (1024.0, 768.0));

        stage.resize(640.0, 480.0);
        assert_eq!(stage.width(), 640.0);

        stage.set_size(300.0, 200.0);
        assert!(!stage.is_fitting());
        stage.resize(2000.0, 2000.0);
        assert_eq!((stage.width(), stage.height()), (300.0, 200.0));

        stage.fit_element();
        assert_eq!((stage.width(), stage.height()), (2000.0, 2000.0));
    }

    #[test]
    fn test_stage_listeners() {
        let (stage, _) = stage_with_surface(StageConfig::default());
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        stage.on("click", move |_| c.set(c.get() + 1)).unwrap();
        assert!(stage.on("hover", |_| {}).is_err());

        stage.click(1.0, 1.0);
        stage.pointer_move(1.0, 1.0);
        assert_eq!(clicks.get(), 1);
        assert_eq!(stage.last_pointer(), Some(PointerEvent::moved(1.0, 1.0)));
    }

    #[test]
    fn test_tiny_fps_from_config_does_not_panic() {
        let config = StageConfig::from_json_str(r#"{"fps": 1e-20}"#).unwrap();
        assert!(config.validate().is_ok());

        let (stage, _) = stage_with_surface(config);
        let circle = Circle::new(Point::new(0.0, 0.0), 5.0, Color::BLACK);
        stage.add(circle.clone(), None).unwrap();

        let mut done = circle.move_to(&Point::new(10.0, 0.0), 1.0);
        stage.step_n(2);
        assert!(done.is_finished());
        assert_eq!(circle.position(), Point::new(10.0, 0.0));
        assert_eq!(stage.scheduler().now(), Duration::MAX);
    }

    #[test]
    fn test_hover_refreshes_when_shape_moves_under_pointer() {
        let (stage, _) = stage_with_surface(StageConfig {
            fps: 10.0,
            ..Default::default()
        });
        let circle = Circle::new(Point::new(0.0, 0.0), 5.0, Color::BLACK);
        stage.add(circle.clone(), None).unwrap();

        stage.pointer_move(50.0, 0.0);
        assert_eq!(circle.hover_state(), crate::events::HoverState::Idle);

        let mut done = circle.move_to(&Point::new(50.0, 0.0), 1.0);
        stage.step_n(10);
        assert!(done.is_finished());
        assert_eq!(circle.hover_state(), crate::events::HoverState::Hovering);
    }
}
