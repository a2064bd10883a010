/// 通用轮询原语
///
/// 按 interval 对齐采样：采样时刻为启动后 interval 的整数倍，
/// 两次对齐检查之间以 200ms 为步长休眠，超时的误差不超过一个步长

use common::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// 对齐检查之间的休眠步长
pub const POLL_TICK: Duration = Duration::from_millis(200);

/// 轮询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// None 表示不设上限
    pub timeout: Option<Duration>,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            interval,
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            timeout: None,
            interval,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), Duration::from_secs(1))
    }
}

/// 某一时刻的轮询决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// 进入新的对齐时隙，需要采样
    Sample { slot: u64 },
    /// 当前时隙已采样过
    Idle,
    /// 已超时
    Expired,
}

/// 采样计划，只依赖经过的时间，不涉及休眠
#[derive(Debug, Clone)]
pub struct PollSchedule {
    settings: PollSettings,
    next_slot: u64,
}

impl PollSchedule {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            next_slot: 0,
        }
    }

    /// 经过的时间所在的时隙编号
    pub fn slot_of(elapsed: Duration, interval: Duration) -> u64 {
        let interval = interval.as_millis().max(1);
        (elapsed.as_millis() / interval) as u64
    }

    pub fn decide(&self, elapsed: Duration) -> PollDecision {
        if let Some(timeout) = self.settings.timeout {
            if elapsed >= timeout {
                return PollDecision::Expired;
            }
        }

        let slot = Self::slot_of(elapsed, self.settings.interval);
        if slot >= self.next_slot {
            PollDecision::Sample { slot }
        } else {
            PollDecision::Idle
        }
    }

    /// 记录已完成采样的时隙
    pub fn record(&mut self, slot: u64) {
        self.next_slot = slot + 1;
    }
}

/// 轮询直到条件满足
///
/// `check` 每次执行一次远程检查：`Ok(Some(v))` 完成，`Ok(None)` 继续等待，
/// `Err` 立即返回。超时返回 `Error::Timeout`，包含 VM ID 与等待条件描述
pub async fn poll_until<T, F, Fut>(
    settings: PollSettings,
    vm_id: u32,
    condition: &str,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let mut schedule = PollSchedule::new(settings);

    loop {
        match schedule.decide(start.elapsed()) {
            PollDecision::Expired => {
                warn!("等待 VM {} {} 超时", vm_id, condition);
                return Err(Error::Timeout {
                    vm_id,
                    condition: condition.to_string(),
                });
            }
            PollDecision::Sample { slot } => {
                schedule.record(slot);
                debug!("VM {} 检查 {} (slot={})", vm_id, condition, slot);
                if let Some(value) = check().await? {
                    return Ok(value);
                }
            }
            PollDecision::Idle => {}
        }

        sleep(POLL_TICK).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_schedule_aligns_to_interval() {
        let mut schedule = PollSchedule::new(PollSettings::new(
            Duration::from_secs(10),
            Duration::from_secs(2),
        ));

        assert_eq!(schedule.decide(Duration::ZERO), PollDecision::Sample { slot: 0 });
        schedule.record(0);
        assert_eq!(schedule.decide(Duration::from_millis(1800)), PollDecision::Idle);
        assert_eq!(
            schedule.decide(Duration::from_millis(2000)),
            PollDecision::Sample { slot: 1 }
        );
        schedule.record(1);
        assert_eq!(schedule.decide(Duration::from_millis(3999)), PollDecision::Idle);
        assert_eq!(schedule.decide(Duration::from_secs(10)), PollDecision::Expired);
    }

    #[test]
    fn test_schedule_skips_missed_slots() {
        let mut schedule = PollSchedule::new(PollSettings::unbounded(Duration::from_secs(1)));
        schedule.record(0);
        // 检查本身耗时超过多个 interval 时只补采一次
        assert_eq!(
            schedule.decide(Duration::from_millis(3500)),
            PollDecision::Sample { slot: 3 }
        );
        schedule.record(3);
        assert_eq!(schedule.decide(Duration::from_millis(3700)), PollDecision::Idle);
    }

    #[test]
    fn test_unbounded_never_expires() {
        let schedule = PollSchedule::new(PollSettings::unbounded(Duration::from_secs(2)));
        assert_ne!(
            schedule.decide(Duration::from_secs(86_400)),
            PollDecision::Expired
        );
    }

    #[test]
    fn test_zero_interval() {
        assert_eq!(PollSchedule::slot_of(Duration::from_millis(5), Duration::ZERO), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_done_samples_once_per_interval() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let timeout = Duration::from_secs(5);
        let start = Instant::now();

        let result: Result<()> = poll_until(
            PollSettings::new(timeout, Duration::from_secs(1)),
            101,
            "测试条件",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
        )
        .await;

        let elapsed = start.elapsed();
        assert!(matches!(result, Err(Error::Timeout { vm_id: 101, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(elapsed >= timeout);
        assert!(elapsed <= timeout + POLL_TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_condition_keeps_call_count() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<()> = poll_until(
            PollSettings::new(Duration::from_secs(6), Duration::from_secs(2)),
            101,
            "慢速条件",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(700)).await;
                Ok(None)
            },
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_on_first_check_returns_immediately() {
        let start = Instant::now();
        let value = poll_until(
            PollSettings::default(),
            101,
            "立即完成",
            || async { Ok(Some(42)) },
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert!(start.elapsed() < POLL_TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_is_fatal() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<()> = poll_until(
            PollSettings::default(),
            101,
            "错误条件",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Transport("connection refused".to_string()))
            },
        )
        .await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
