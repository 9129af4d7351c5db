//! # Host CLI
//!
//! 无头宿主：把场景渲染到记录型绘图表面，按脚本驱动动画和指针事件，最后输出统计。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli
//! cargo run -p host-cli -- --frames 300 --fps 30
//! cargo run -p host-cli -- --config stage.json --surface main
//! cargo run -p host-cli -- --frames 10 --dump frames.json
//! RUST_LOG=sim_runtime=debug cargo run -p host-cli
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sim_runtime::{
    Circle, Color, Interactive, Line, Point, Polygon, RecordingHost, Rectangle, SceneCollection,
    SimulationElement, Stage, StageConfig, TaskStatus,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "host-cli")]
#[command(about = "无头舞台宿主 - 渲染演示场景并输出绘图统计")]
#[command(version)]
struct Cli {
    /// 舞台配置文件（JSON）；不指定时使用默认配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 渲染帧数
    #[arg(short, long, default_value = "180")]
    frames: u64,

    /// 覆盖配置中的帧率
    #[arg(long)]
    fps: Option<f64>,

    /// 覆盖配置中的绘图表面 id
    #[arg(long)]
    surface: Option<String>,

    /// 把记录的绘图调用写入 JSON 文件
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(cli: &Cli) -> Result<StageConfig> {
    let mut config = match &cli.config {
        Some(path) => StageConfig::load(path)
            .with_context(|| format!("加载舞台配置失败: {}", path.display()))?,
        None => StageConfig::default(),
    };

    // 命令行参数优先
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(surface) = &cli.surface {
        config.surface_id = surface.clone();
    }

    config.validate().context("舞台配置无效")?;
    Ok(config)
}

/// 演示场景中需要继续驱动的形状
struct Demo {
    circle: Circle,
    square: Rectangle,
    poly: Polygon,
    line: Line,
}

fn build_scene(stage: &Stage) -> Result<Demo> {
    let blue = Color::new(0.0, 0.0, 255.0);
    let red = Color::new(255.0, 0.0, 0.0);
    let green = Color::new(0.0, 255.0, 0.0);

    let collection = SceneCollection::named("demo");
    stage.add(collection.clone(), None)?;

    let circle = Circle::new(Point::new(150.0, 150.0), 50.0, blue);
    collection.add(circle.clone(), None)?;

    let square = Rectangle::new(Point::new(350.0, 400.0), 100.0, 200.0, red).with_offset(50.0, 100.0);
    collection.add(square.clone(), Some("sq"))?;

    let poly = Polygon::new(
        Point::new(600.0, 600.0),
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 200.0),
            Point::new(0.0, 100.0),
        ],
        green,
    );
    stage.add(poly.clone(), None)?;

    let line = Line::new(Point::new(100.0, 100.0), Point::new(0.0, 0.0), 4.0, Color::new(0.0, 255.0, 255.0));
    stage.add(line.clone(), None)?;

    {
        let (enter, leave) = (circle.clone(), circle.clone());
        circle.on_hover(
            move |_| {
                let _ = enter.fill(red, 0.0);
            },
            move |_| {
                let _ = leave.fill(blue, 0.0);
            },
        );
    }
    {
        let (enter, leave) = (square.clone(), square.clone());
        square.on_hover(
            move |_| {
                let _ = enter.fill(green, 0.0);
            },
            move |_| {
                let _ = leave.fill(red, 0.0);
            },
        );
    }

    Ok(Demo {
        circle,
        square,
        poly,
        line,
    })
}

/// 动画脚本：与渲染循环并发执行
async fn run_script(stage: &Stage, demo: &Demo) {
    // 多边形和线段每个 tick 旋转 2°
    {
        let (poly, line) = (demo.poly.clone(), demo.line.clone());
        stage.scheduler().every(move |_| {
            let _ = poly.rotate(2.0, 0.0);
            let _ = line.rotate(2.0, 0.0);
            TaskStatus::Continue
        });
    }

    let square = async {
        demo.square.scale_width(2.0, 1.0).await;
        demo.square.scale_height(2.0, 2.0).await;
        info!(
            width = demo.square.width(),
            height = demo.square.height(),
            "方块缩放完成"
        );
        let square = demo.square.clone();
        stage.scheduler().every(move |_| {
            let _ = square.rotate(0.5, 0.0);
            TaskStatus::Continue
        });
    };

    let colors = async {
        let cycle = [
            Color::new(0.0, 255.0, 0.0),
            Color::new(0.0, 0.0, 255.0),
            Color::new(255.0, 0.0, 0.0),
        ];
        for color in cycle.iter().cycle().take(6) {
            demo.circle.fill(*color, 1.0).await;
        }
    };

    // 模拟指针划过圆和方块
    let pointer = async {
        let path = [(150.0, 150.0), (160.0, 150.0), (400.0, 500.0), (700.0, 50.0)];
        for (x, y) in path {
            tokio::time::sleep(Duration::from_millis(500)).await;
            stage.pointer_move(x, y);
        }
        stage.click(150.0, 150.0);
    };

    tokio::join!(square, colors, pointer);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut host = RecordingHost::new();
    let surface = host.register(&config.surface_id);
    host.set_container_size(&config.surface_id, config.width, config.height);

    let stage = Stage::new(config, &mut host);
    if stage.is_inert() {
        warn!("舞台处于惰性模式，不会产生绘图调用");
    }
    let demo = build_scene(&stage)?;

    // 渲染循环结束时脚本可能还没跑完，以渲染帧数为准
    let render = stage.run(Some(cli.frames));
    let script = run_script(&stage, &demo);
    tokio::pin!(render, script);
    let mut script_done = false;
    let frames = loop {
        tokio::select! {
            frames = &mut render => break frames,
            _ = &mut script, if !script_done => {
                info!("动画脚本执行完毕");
                script_done = true;
            }
        }
    };

    let summary = serde_json::json!({
        "surface": stage.config().surface_id,
        "fps": stage.clock().fps(),
        "frames": frames,
        "draw_commands": surface.len(),
        "circle_color": demo.circle.color().to_hex(),
        "square": {
            "width": demo.square.width(),
            "height": demo.square.height(),
            "rotation": demo.square.rotation(),
        },
        "poly_rotation": demo.poly.rotation(),
        "line_rotation": demo.line.rotation(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &cli.dump {
        let json = serde_json::to_string_pretty(&surface.commands())?;
        std::fs::write(path, json)
            .with_context(|| format!("写入绘图调用失败: {}", path.display()))?;
        info!(path = %path.display(), "绘图调用已导出");
    }
    info!(frames = frames, draw_commands = surface.len(), "渲染结束");

    Ok(())
}
