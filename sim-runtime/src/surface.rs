//! # Surface 模块
//!
//! 绘图表面能力接口。运行时只产生绘图调用，不实现真正的光栅化。
//!
//! - [`Surface`]: 路径 / 填充 / 描边原语（与 2D canvas 上下文同构）
//! - [`SurfaceHost`]: 按 id 提供绘图表面及其容器尺寸
//! - [`RecordingSurface`]: 把绘图调用记录为 [`DrawCommand`]，用于测试和无头运行

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use serde::Serialize;

/// 绘图表面
pub trait Surface {
    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, anticlockwise: bool);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

/// 绘图表面提供者（宿主侧）
pub trait SurfaceHost {
    /// 按 id 获取绘图表面；不存在时返回 `None`
    fn acquire(&mut self, id: &str) -> Option<Box<dyn Surface>>;

    /// 绘图表面所在容器的尺寸
    fn container_size(&self, id: &str) -> Option<(f64, f64)>;
}

/// 一条绘图调用
///
/// 序列化为外部标记的 JSON，例如 `{"move_to":{"x":1.0,"y":2.0}}`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCommand {
    BeginPath,
    ClosePath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    Fill,
    Stroke,
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    FillRect { x: f64, y: f64, width: f64, height: f64 },
}

impl std::fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeginPath => write!(f, "begin_path"),
            Self::ClosePath => write!(f, "close_path"),
            Self::MoveTo { x, y } => write!(f, "move_to {x} {y}"),
            Self::LineTo { x, y } => write!(f, "line_to {x} {y}"),
            Self::Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => write!(
                f,
                "arc {x} {y} {radius} {start_angle} {end_angle} {anticlockwise}"
            ),
            Self::FillStyle(style) => write!(f, "fill_style {style}"),
            Self::StrokeStyle(style) => write!(f, "stroke_style {style}"),
            Self::LineWidth(width) => write!(f, "line_width {width}"),
            Self::Fill => write!(f, "fill"),
            Self::Stroke => write!(f, "stroke"),
            Self::ClearRect {
                x,
                y,
                width,
                height,
            } => write!(f, "clear_rect {x} {y} {width} {height}"),
            Self::FillRect {
                x,
                y,
                width,
                height,
            } => write!(f, "fill_rect {x} {y} {width} {height}"),
        }
    }
}

/// 记录型绘图表面
///
/// 克隆共享同一份记录，因此交给舞台之后仍然可以在外部检查。
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Rc<RefCell<Vec<DrawCommand>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的绘图调用
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    /// 清空记录
    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    /// 每条调用一行的文本形式（快照测试使用）
    pub fn script(&self) -> String {
        let mut out = String::new();
        for command in self.commands.borrow().iter() {
            let _ = writeln!(out, "{command}");
        }
        out
    }

    fn push(&self, command: DrawCommand) {
        self.commands.borrow_mut().push(command);
    }
}

impl Surface for RecordingSurface {
    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, anticlockwise: bool) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle(style.to_string()));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle(style.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
        });
    }
}

/// 记录型宿主：按 id 注册 [`RecordingSurface`]
#[derive(Debug, Default)]
pub struct RecordingHost {
    surfaces: HashMap<String, RecordingSurface>,
    containers: HashMap<String, (f64, f64)>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个绘图表面，返回其记录句柄
    pub fn register(&mut self, id: &str) -> RecordingSurface {
        self.surfaces.entry(id.to_string()).or_default().clone()
    }

    /// 设置容器尺寸
    pub fn set_container_size(&mut self, id: &str, width: f64, height: f64) {
        self.containers.insert(id.to_string(), (width, height));
    }

    pub fn surface(&self, id: &str) -> Option<RecordingSurface> {
        self.surfaces.get(id).cloned()
    }
}

impl SurfaceHost for RecordingHost {
    fn acquire(&mut self, id: &str) -> Option<Box<dyn Surface>> {
        self.surfaces
            .get(id)
            .map(|surface| Box::new(surface.clone()) as Box<dyn Surface>)
    }

    fn container_size(&self, id: &str) -> Option<(f64, f64)> {
        self.containers.get(id).copied()
    }
}
