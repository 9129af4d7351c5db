//! # 实时渲染循环测试
//!
//! 使用 tokio 的暂停时间驱动 `Stage::run`，动画脚本与渲染循环并发执行。

use sim_runtime::{
    Circle, Color, Point, RecordingHost, Rectangle, SimulationElement, Stage, StageConfig,
    TransitionOutcome,
};

fn test_stage(fps: f64) -> Stage {
    let mut host = RecordingHost::new();
    host.register("canvas");
    Stage::new(
        StageConfig {
            fps,
            ..Default::default()
        },
        &mut host,
    )
}

#[tokio::test(start_paused = true)]
async fn test_await_completion_while_rendering() {
    let stage = test_stage(10.0);
    let circle = Circle::new(Point::new(0.0, 0.0), 5.0, Color::BLACK);
    stage.add(circle.clone(), None).unwrap();

    let (frames, outcome) = tokio::join!(stage.run(Some(11)), async {
        circle.move_to(&Point::new(100.0, 0.0), 1.0).await
    });

    // 第一帧在 t = 0，之后每 100ms 一帧
    assert_eq!(frames, 11);
    assert_eq!(outcome, TransitionOutcome::Completed);
    assert_eq!(circle.position(), Point::new(100.0, 0.0));
    assert_eq!(stage.frame_count(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_animations() {
    let stage = test_stage(20.0);
    let square = Rectangle::new(Point::new(350.0, 400.0), 100.0, 200.0, Color::new(255.0, 0.0, 0.0));
    stage.add(square.clone(), Some("sq")).unwrap();

    let script = async {
        let first = square.scale_width(2.0, 1.0).await;
        let second = square.scale_height(2.0, 2.0).await;
        (first, second)
    };
    let (_, (first, second)) = tokio::join!(stage.run(Some(80)), script);

    assert_eq!(first, TransitionOutcome::Completed);
    assert_eq!(second, TransitionOutcome::Completed);
    assert_eq!(square.width(), 200.0);
    assert_eq!(square.height(), 400.0);
}

#[tokio::test(start_paused = true)]
async fn test_inert_stage_does_not_render() {
    let mut host = RecordingHost::new();
    let stage = Stage::new(StageConfig::default(), &mut host);
    assert_eq!(stage.run(Some(10)).await, 0);
    assert_eq!(stage.frame_count(), 0);
}
