//! # Sim Runtime
//!
//! 2D 场景图动画运行时。
//!
//! ## 架构概述
//!
//! `sim-runtime` 是纯逻辑核心，不实现光栅化，也不读取窗口事件。
//! 它通过两个能力接口与宿主层（Host）通信：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── SurfaceHost::acquire ──────►│ Stage::new
//!   │──── pointer_move / click ──────►│ 命中测试 + 悬停状态机
//!   │──── resize ────────────────────►│
//!   │                                  │ tick → 过渡推进 → draw
//!   │◄─── Surface 绘图调用 ───────────│
//!   │                                  │
//! ```
//!
//! ## 核心类型
//!
//! - [`Vector2D`]：带静止坐标和累计旋转角的二维向量
//! - [`Color`]：不截断的 RGB 颜色
//! - [`Scheduler`] / [`Completion`]：帧节拍调度器和可 await 的动画完成信号
//! - [`Circle`] / [`Rectangle`] / [`Polygon`] / [`Line`]：形状
//! - [`SceneCollection`]：场景集合（可嵌套）
//! - [`Stage`]：场景图的根，持有帧时钟、背景和绘图表面
//!
//! ## 使用示例
//!
//! ```ignore
//! use sim_runtime::{Circle, Color, Point, RecordingHost, SimulationElement, Stage, StageConfig};
//!
//! let mut host = RecordingHost::new();
//! host.register("canvas");
//! let stage = Stage::new(StageConfig::default(), &mut host);
//!
//! let circle = Circle::new(Point::new(150.0, 150.0), 50.0, Color::new(0.0, 0.0, 255.0));
//! stage.add(circle.clone(), None)?;
//!
//! // 渲染循环和动画脚本并发运行
//! tokio::join!(stage.run(Some(120)), async {
//!     circle.fill(Color::new(0.0, 255.0, 0.0), 1.0).await;
//! });
//! ```
//!
//! ## 模块结构
//!
//! - [`vector`] / [`color`]：值类型
//! - [`clock`] / [`scheduler`] / [`transition`]：时间轴和过渡引擎
//! - [`surface`]：绘图表面能力接口和记录实现
//! - [`element`] / [`shapes`] / [`scene`] / [`events`]：场景图
//! - [`stage`] / [`config`]：舞台和配置
//! - [`error`]：错误类型定义

pub mod clock;
pub mod color;
pub mod config;
pub mod element;
pub mod error;
pub mod events;
pub mod scene;
pub mod scheduler;
pub mod shapes;
pub mod stage;
pub mod surface;
pub mod transition;
pub mod vector;

// 重导出核心类型
pub use clock::{DEFAULT_FPS, FrameClock};
pub use color::{Color, ColorInput};
pub use config::StageConfig;
pub use element::{Binding, Element, ElementCore, ElementId, SimulationElement};
pub use error::{ColorError, ConfigError, EventError, SceneError, SimError, SimResult};
pub use events::{EventKind, EventRouter, HoverState, Interactive, PointerEvent, PointerKind};
pub use scene::SceneCollection;
pub use scheduler::{CancelToken, PeriodicTask, Scheduler, TaskStatus};
pub use shapes::{Circle, Corner, Line, Polygon, Rectangle};
pub use stage::Stage;
pub use surface::{DrawCommand, RecordingHost, RecordingSurface, Surface, SurfaceHost};
pub use transition::{Completion, TransitionOutcome, TransitionState};
pub use vector::{Point, Vector2D};
