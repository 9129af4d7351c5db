//! # Scheduler 模块
//!
//! 单线程协作式调度器：以帧时钟的间隔运行周期任务，直到任务结束或被取消。
//!
//! ## 时间轴
//!
//! 调度器不读取系统时间。驱动方（[`Stage`](crate::Stage) 的渲染循环或测试）
//! 每个 tick 调用一次 [`Scheduler::tick`] 并传入时间轴位置：
//!
//! - 实时运行时传入自启动以来的真实耗时
//! - 测试中用 [`Scheduler::step`] 按帧率精确推进
//!
//! ## 顺序
//!
//! 在 tick 期间新注册的任务从下一个 tick 开始运行，
//! 因此任务回调里可以安全地启动新的动画。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::clock::FrameClock;

/// 周期任务一次 tick 之后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// 下一个 tick 继续运行
    Continue,
    /// 已结束，从调度器移除
    Finished,
}

/// 周期任务
pub trait PeriodicTask {
    /// 每个 tick 调用一次
    ///
    /// - `now`: 当前时间轴位置
    fn tick(&mut self, now: Duration) -> TaskStatus;

    /// 任务被取消时调用（之后任务被丢弃）
    fn on_cancel(&mut self) {}
}

impl<F> PeriodicTask for F
where
    F: FnMut(Duration) -> TaskStatus,
{
    fn tick(&mut self, now: Duration) -> TaskStatus {
        self(now)
    }
}

/// 取消令牌
///
/// 可克隆，所有克隆共享同一个取消标记。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消；任务在下一个 tick 之前被移除
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct ScheduledTask {
    task: Box<dyn PeriodicTask>,
    cancel: CancelToken,
}

struct SchedulerInner {
    clock: FrameClock,
    now: Cell<Duration>,
    tick_count: Cell<u64>,
    /// 正在运行的任务（tick 期间被取出）
    active: RefCell<Vec<ScheduledTask>>,
    /// 等待下一个 tick 加入的任务
    incoming: RefCell<Vec<ScheduledTask>>,
}

/// 调度器句柄
///
/// 克隆开销很低，所有克隆指向同一个调度器。
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("fps", &self.inner.clock.fps())
            .field("now", &self.inner.now.get())
            .field("tick_count", &self.inner.tick_count.get())
            .field("tasks", &self.task_count())
            .finish()
    }
}

impl Scheduler {
    /// 创建调度器
    pub fn new(clock: FrameClock) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                clock,
                now: Cell::new(Duration::ZERO),
                tick_count: Cell::new(0),
                active: RefCell::new(Vec::new()),
                incoming: RefCell::new(Vec::new()),
            }),
        }
    }

    /// 弱引用（元素绑定使用，避免引用环）
    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn clock(&self) -> FrameClock {
        self.inner.clock
    }

    /// 当前时间轴位置
    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    /// 已执行的 tick 数
    pub fn tick_count(&self) -> u64 {
        self.inner.tick_count.get()
    }

    /// 尚未结束的任务数（包括等待下一个 tick 的任务）
    pub fn task_count(&self) -> usize {
        let live = |tasks: &Vec<ScheduledTask>| {
            tasks.iter().filter(|t| !t.cancel.is_cancelled()).count()
        };
        live(&self.inner.active.borrow()) + live(&self.inner.incoming.borrow())
    }

    // ========== 注册 ==========

    /// 注册周期任务，从下一个 tick 开始运行
    pub fn spawn<T: PeriodicTask + 'static>(&self, task: T) -> CancelToken {
        let token = CancelToken::new();
        self.spawn_with(task, token.clone());
        token
    }

    /// 使用已有取消令牌注册周期任务
    pub fn spawn_with<T: PeriodicTask + 'static>(&self, task: T, cancel: CancelToken) {
        self.inner.incoming.borrow_mut().push(ScheduledTask {
            task: Box::new(task),
            cancel,
        });
    }

    /// 每个 tick 运行一次闭包，直到闭包返回 [`TaskStatus::Finished`] 或被取消
    pub fn every<F>(&self, f: F) -> CancelToken
    where
        F: FnMut(Duration) -> TaskStatus + 'static,
    {
        self.spawn(f)
    }

    // ========== 驱动 ==========

    /// 执行一个 tick
    ///
    /// - `now`: 时间轴位置；小于上一次的值时保持不变
    pub fn tick(&self, now: Duration) {
        let inner = &self.inner;
        inner.now.set(inner.now.get().max(now));
        inner.tick_count.set(inner.tick_count.get() + 1);

        let mut tasks = std::mem::take(&mut *inner.active.borrow_mut());
        tasks.append(&mut inner.incoming.borrow_mut());

        let now = inner.now.get();
        tasks.retain_mut(|scheduled| {
            if scheduled.cancel.is_cancelled() {
                scheduled.task.on_cancel();
                return false;
            }
            scheduled.task.tick(now) == TaskStatus::Continue
        });

        // tick 期间注册的任务留在 incoming，下一个 tick 再加入
        let mut active = inner.active.borrow_mut();
        tasks.append(&mut active);
        *active = tasks;
    }

    /// 按帧率推进一个 tick（确定性驱动）
    pub fn step(&self) {
        let next = self.clock().time_at(self.tick_count() + 1);
        self.tick(next);
    }

    /// 连续推进 `n` 个 tick
    pub fn step_n(&self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }
}

/// 调度器弱引用
#[derive(Clone, Default)]
pub struct WeakScheduler {
    inner: Weak<SchedulerInner>,
}

impl WeakScheduler {
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

impl std::fmt::Debug for WeakScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakScheduler")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
