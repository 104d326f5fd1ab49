//! 渲染等待
//!
//! 截图前轮询预览中的子文档，直到绘制画布出现或达到尝试上限。
//! 等待总会结束：超时和访问失败都只意味着"尽力而为"地截图。

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::capture::surface::{FrameProbe, PreviewSurface};
use crate::config::Config;

/// 可注入的时钟，测试中不需要真实计时
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// tokio 计时器
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// 有界重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// 重试结果
#[derive(Debug)]
pub enum RetryOutcome {
    /// 条件在第 `attempts` 次检查时满足
    Ready { attempts: u32 },
    /// 用完所有尝试
    Exhausted { attempts: u32 },
    /// 检查本身出错，立即停止
    Failed { attempts: u32, error: anyhow::Error },
}

/// 按固定间隔检查 `predicate`，最多 `max_attempts` 次
///
/// 第一次检查立即进行，之后每次检查前等待 `interval`；
/// 检查返回错误时不再重试。
pub async fn retry<C, F, Fut>(clock: &C, policy: RetryPolicy, mut predicate: F) -> RetryOutcome
where
    C: Clock + ?Sized,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            clock.sleep(policy.interval).await;
        }
        match predicate(attempt).await {
            Ok(true) => return RetryOutcome::Ready { attempts: attempt },
            Ok(false) => continue,
            Err(error) => return RetryOutcome::Failed { attempts: attempt, error },
        }
    }
    RetryOutcome::Exhausted {
        attempts: policy.max_attempts,
    }
}

/// 等待器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Searching,
    Polling,
    Ready,
    TimedOut,
}

/// 等待结果（`TimedOut` 与 `Ready` 一样可以继续截图）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
}

/// 等待参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    /// 轮询间隔与次数
    pub poll: RetryPolicy,
    /// 画布出现后的额外等待
    pub settle: Duration,
    /// 没有子文档时的短暂等待
    pub no_frame_delay: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            poll: RetryPolicy {
                interval: Duration::from_millis(100),
                max_attempts: 30,
            },
            settle: Duration::from_millis(1500),
            no_frame_delay: Duration::from_millis(100),
        }
    }
}

impl From<&Config> for WaiterConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll: RetryPolicy {
                interval: Duration::from_millis(config.poll_interval_ms),
                max_attempts: config.max_poll_attempts,
            },
            settle: Duration::from_millis(config.render_settle_ms),
            no_frame_delay: Duration::from_millis(config.no_frame_delay_ms),
        }
    }
}

/// 渲染等待器
pub struct RenderWaiter<C: Clock> {
    clock: C,
    config: WaiterConfig,
}

impl<C: Clock> RenderWaiter<C> {
    pub fn new(clock: C, config: WaiterConfig) -> Self {
        Self { clock, config }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// 等待预览渲染完成，永远不会返回错误
    pub async fn wait(&self, surface: &dyn PreviewSurface) -> WaitOutcome {
        let label = surface.label().to_string();
        let mut state = WaitState::Searching;
        debug!("[{}] 等待渲染: {:?}", label, state);

        match surface.probe_frame().await {
            Ok(FrameProbe::NoFrame) => {
                self.clock.sleep(self.config.no_frame_delay).await;
                state = WaitState::Ready;
                debug!("[{}] 没有嵌套子文档: {:?}", label, state);
                return WaitOutcome::Ready;
            }
            Ok(FrameProbe::Inaccessible) | Err(_) => {
                state = WaitState::TimedOut;
                warn!("[{}] ⚠️ 子文档不可访问，跳过等待: {:?}", label, state);
                return WaitOutcome::TimedOut;
            }
            Ok(FrameProbe::Pending) | Ok(FrameProbe::Rendered) => {
                state = WaitState::Polling;
                debug!("[{}] 找到子文档: {:?}", label, state);
            }
        }

        let outcome = retry(&self.clock, self.config.poll, |_| async move {
            match surface.probe_frame().await? {
                FrameProbe::Rendered => Ok(true),
                FrameProbe::Pending => Ok(false),
                FrameProbe::NoFrame | FrameProbe::Inaccessible => {
                    anyhow::bail!("子文档在轮询期间变为不可访问")
                }
            }
        })
        .await;

        match outcome {
            RetryOutcome::Ready { attempts } => {
                self.clock.sleep(self.config.settle).await;
                state = WaitState::Ready;
                info!("[{}] ✓ 画布已渲染 (第 {} 次检查): {:?}", label, attempts, state);
                WaitOutcome::Ready
            }
            RetryOutcome::Exhausted { attempts } => {
                state = WaitState::TimedOut;
                warn!("[{}] ⚠️ {} 次检查后画布仍未渲染: {:?}", label, attempts, state);
                WaitOutcome::TimedOut
            }
            RetryOutcome::Failed { attempts, error } => {
                state = WaitState::TimedOut;
                warn!("[{}] ⚠️ 第 {} 次检查失败: {}: {:?}", label, attempts, error, state);
                WaitOutcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::future::BoxFuture;

    use super::Clock;

    /// 记录每次 sleep 的时长，立即返回
    #[derive(Debug, Clone, Default)]
    pub struct RecordingClock {
        pub sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingClock {
        pub fn recorded(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    impl Clock for RecordingClock {
        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
            self.sleeps.lock().unwrap().push(duration);
            Box::pin(async {})
        }
    }
}
