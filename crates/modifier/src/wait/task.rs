use common::models::{TaskRef, TaskStatus, VmLocation};
use common::Result;
use std::time::Duration;
use tracing::{debug, info};

use super::{VmWaiter, TASK_POLL_INTERVAL};
use crate::poller::{poll_until, PollSettings};

impl VmWaiter {
    /// 等待异步任务离开 running 状态
    ///
    /// 查询出错立即返回，不重试。`timeout` 为 None 时不设上限
    pub async fn wait_for_task(
        &self,
        vm: &VmLocation,
        task: &TaskRef,
        timeout: Option<Duration>,
    ) -> Result<TaskStatus> {
        let api = &self.api;
        let settings = PollSettings {
            timeout,
            interval: TASK_POLL_INTERVAL,
        };

        let status = poll_until(
            settings,
            vm.vm_id,
            &format!("任务 {} 完成", task),
            move || async move {
                let status = api.get_task_status(&vm.node, task).await?;
                debug!("任务 {} 当前状态: {}", task, status.status);
                Ok((!status.is_running()).then_some(status))
            },
        )
        .await?;

        info!(
            "任务已结束: vm={}, task={}, status={}, exit={}",
            vm,
            task,
            status.status,
            status.exit_status.as_deref().unwrap_or("-")
        );
        Ok(status)
    }
}
