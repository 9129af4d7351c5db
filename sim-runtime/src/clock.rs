//! # Clock 模块
//!
//! 帧时钟：保存帧率，把秒数换算成 tick 数。
//!
//! 帧率在舞台构造时确定，之后不可修改。时钟作为配置值传入调度器，
//! 而不是进程级全局变量。

use std::time::Duration;

/// 默认帧率（tick/秒）
pub const DEFAULT_FPS: f64 = 60.0;

/// 帧时钟
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

impl FrameClock {
    /// 创建帧时钟
    ///
    /// 帧率不是正有限数时回退到 [`DEFAULT_FPS`]。
    pub fn new(fps: f64) -> Self {
        if !fps.is_finite() || fps <= 0.0 {
            tracing::warn!(fps = fps, fallback = DEFAULT_FPS, "无效帧率，使用默认值");
            return Self::default();
        }
        Self { fps }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// 把秒数换算为 tick 数
    ///
    /// `round(seconds * fps)`，`seconds > 0` 时至少 1 个 tick；非正时长为 0。
    pub fn ticks_for(&self, seconds: f64) -> u32 {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0;
        }
        let ticks = (seconds * self.fps).round();
        if ticks >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            (ticks as u32).max(1)
        }
    }

    /// 两个 tick 之间的间隔；超出 `Duration` 范围时取 `Duration::MAX`
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fps).unwrap_or(Duration::MAX)
    }

    /// 第 `tick` 个 tick 对应的时间轴位置（饱和）
    pub fn time_at(&self, tick: u64) -> Duration {
        Duration::try_from_secs_f64(tick as f64 / self.fps).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_for() {
        let clock = FrameClock::new(60.0);
        assert_eq!(clock.ticks_for(1.0), 60);
        assert_eq!(clock.ticks_for(0.5), 30);
        assert_eq!(clock.ticks_for(0.0), 0);
        assert_eq!(clock.ticks_for(-2.0), 0);
        // 不足半个 tick 也至少 1 个
        assert_eq!(clock.ticks_for(0.001), 1);
    }

    #[test]
    fn test_invalid_fps_falls_back() {
        assert_eq!(FrameClock::new(0.0).fps(), DEFAULT_FPS);
        assert_eq!(FrameClock::new(f64::NAN).fps(), DEFAULT_FPS);
        assert_eq!(FrameClock::new(-30.0).fps(), DEFAULT_FPS);
    }

    #[test]
    fn test_interval_and_time_at() {
        let clock = FrameClock::new(50.0);
        assert_eq!(clock.interval(), Duration::from_millis(20));
        assert_eq!(clock.time_at(50), Duration::from_secs(1));
    }

    #[test]
    fn test_tiny_fps_saturates() {
        let clock = FrameClock::new(1e-20);
        assert_eq!(clock.fps(), 1e-20);
        assert_eq!(clock.interval(), Duration::MAX);
        assert_eq!(clock.time_at(1), Duration::MAX);
        assert_eq!(clock.time_at(0), Duration::ZERO);
    }
}
