//! # Transition 模块
//!
//! 过渡（补间）引擎：在 N 个 tick 内把一个属性从起始值线性推进到目标值。
//!
//! ## 核心设计
//!
//! 引擎本身不知道被动画的是什么属性。调用方提供三个回调：
//!
//! - `on_zero`: 时长为 0 时同步调用，直接设置最终值
//! - `on_tick`: 每个 tick 调用一次，按固定增量推进
//! - `on_complete`: 结束时调用，把属性设为精确的最终值（消除浮点累积误差）
//!
//! 所有动画方法（`fill`、`move_by`、`move_to`、`rotate`、`scale*`）都只是提供这三个回调的薄封装。
//!
//! ## 结束条件
//!
//! 已执行 tick 数达到总 tick 数，或自启动以来的时间轴耗时达到时长，以先到者为准。
//! 前者保证确定性驱动下恰好 N 个 tick，后者容忍调度抖动。
//!
//! ## 完成信号
//!
//! [`Completion`] 是单生产者 / 单消费者的 future：引擎在结束时发送结果，调用方 `.await`。

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::scheduler::{CancelToken, PeriodicTask, Scheduler, TaskStatus};

/// 过渡结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// 正常完成，属性已设为最终值
    Completed,
    /// 被取消，属性停在取消时的中间值
    Cancelled,
    /// 调度器在过渡结束前被销毁
    Dropped,
}

/// 过渡状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    /// 正在播放
    #[default]
    Playing,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl TransitionState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

type TickFn = Box<dyn FnMut()>;
type CompleteFn = Box<dyn FnOnce()>;

/// 单个过渡实例
pub struct Transition {
    /// 总 tick 数
    total_ticks: u32,
    /// 已执行 tick 数
    elapsed_ticks: u32,
    /// 启动时的时间轴位置
    started_at: Duration,
    /// 时长
    duration: Duration,
    /// 当前状态
    state: TransitionState,
    on_tick: TickFn,
    on_complete: Option<CompleteFn>,
    done: Option<oneshot::Sender<TransitionOutcome>>,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("total_ticks", &self.total_ticks)
            .field("elapsed_ticks", &self.elapsed_ticks)
            .field("started_at", &self.started_at)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .finish()
    }
}

impl Transition {
    fn new(
        total_ticks: u32,
        started_at: Duration,
        duration: Duration,
        on_tick: TickFn,
        on_complete: CompleteFn,
        done: oneshot::Sender<TransitionOutcome>,
    ) -> Self {
        Self {
            total_ticks,
            elapsed_ticks: 0,
            started_at,
            duration,
            state: TransitionState::Playing,
            on_tick,
            on_complete: Some(on_complete),
            done: Some(done),
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    fn resolve(&mut self, outcome: TransitionOutcome) {
        if let Some(done) = self.done.take() {
            // 接收端被丢弃说明调用方不关心结果
            let _ = done.send(outcome);
        }
    }
}

impl PeriodicTask for Transition {
    fn tick(&mut self, now: Duration) -> TaskStatus {
        if self.state.is_finished() {
            return TaskStatus::Finished;
        }

        (self.on_tick)();
        self.elapsed_ticks += 1;

        let elapsed = now.saturating_sub(self.started_at);
        if self.elapsed_ticks >= self.total_ticks || elapsed >= self.duration {
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
            self.state = TransitionState::Completed;
            self.resolve(TransitionOutcome::Completed);
            TaskStatus::Finished
        } else {
            TaskStatus::Continue
        }
    }

    fn on_cancel(&mut self) {
        if self.state.is_active() {
            self.state = TransitionState::Cancelled;
            self.resolve(TransitionOutcome::Cancelled);
        }
    }
}

impl Scheduler {
    /// 启动一个过渡
    ///
    /// # 参数
    /// - `seconds`: 时长（秒）；非正数视为 0
    /// - `on_zero`: 时长为 0 时同步调用，不会调度任何 tick
    /// - `on_tick`: 每个 tick 调用一次
    /// - `on_complete`: 结束时调用，必须设置精确的最终值
    ///
    /// # 返回
    /// 完成信号。时长为 0 时已处于完成状态。
    pub fn transition<Z, T, C>(&self, seconds: f64, on_zero: Z, on_tick: T, on_complete: C) -> Completion
    where
        Z: FnOnce(),
        T: FnMut() + 'static,
        C: FnOnce() + 'static,
    {
        let ticks = self.clock().ticks_for(seconds);
        if ticks == 0 {
            on_zero();
            return Completion::resolved(TransitionOutcome::Completed);
        }

        let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
        let (tx, rx) = oneshot::channel();
        let cancel = CancelToken::new();
        let transition = Transition::new(
            ticks,
            self.now(),
            duration,
            Box::new(on_tick),
            Box::new(on_complete),
            tx,
        );
        tracing::trace!(ticks = ticks, seconds = seconds, "启动过渡");
        self.spawn_with(transition, cancel.clone());

        Completion::pending(rx, cancel)
    }
}

/// 动画完成信号
///
/// 实现 `Future<Output = TransitionOutcome>`；也可以用 [`Completion::try_outcome`] 轮询。
#[derive(Debug)]
#[must_use = "Completion 不 await 也会继续运行，但结果会被丢弃"]
pub struct Completion {
    rx: Option<oneshot::Receiver<TransitionOutcome>>,
    outcome: Option<TransitionOutcome>,
    cancel: CancelToken,
}

impl Completion {
    pub(crate) fn pending(rx: oneshot::Receiver<TransitionOutcome>, cancel: CancelToken) -> Self {
        Self {
            rx: Some(rx),
            outcome: None,
            cancel,
        }
    }

    /// 已经完成的信号
    pub fn resolved(outcome: TransitionOutcome) -> Self {
        Self {
            rx: None,
            outcome: Some(outcome),
            cancel: CancelToken::new(),
        }
    }

    /// 非阻塞地查询结果
    pub fn try_outcome(&mut self) -> Option<TransitionOutcome> {
        if self.outcome.is_none() {
            let rx = self.rx.as_mut()?;
            self.outcome = match rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(TransitionOutcome::Dropped),
            };
        }
        self.outcome
    }

    /// 是否已结束
    pub fn is_finished(&mut self) -> bool {
        self.try_outcome().is_some()
    }

    /// 取消过渡；属性停在当前中间值，结果为 [`TransitionOutcome::Cancelled`]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 取消令牌（可交给其他代码持有）
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Future for Completion {
    type Output = TransitionOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(TransitionOutcome::Dropped);
        };
        let outcome = match Pin::new(rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(_)) => TransitionOutcome::Dropped,
            Poll::Pending => return Poll::Pending,
        };
        self.outcome = Some(outcome);
        Poll::Ready(outcome)
    }
}
