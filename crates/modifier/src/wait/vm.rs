use common::models::VmLocation;
use common::Result;
use tracing::{debug, info, warn};

use super::VmWaiter;
use crate::poller::{poll_until, PollSettings};

impl VmWaiter {
    /// 等待虚拟机配置锁释放
    ///
    /// `ignore_error_response` 为 true 时，状态查询失败视为尚未完成并继续轮询
    pub async fn wait_for_config_unlock(
        &self,
        vm: &VmLocation,
        settings: PollSettings,
        ignore_error_response: bool,
    ) -> Result<()> {
        let api = &self.api;

        poll_until(settings, vm.vm_id, "配置解锁", move || async move {
            match api.get_vm_status(vm).await {
                Ok(status) if status.is_locked() => {
                    debug!("VM {} 配置仍被锁定: {:?}", vm, status.lock);
                    Ok(None)
                }
                Ok(_) => Ok(Some(())),
                Err(e) if ignore_error_response => {
                    warn!("查询 VM {} 状态失败，继续等待: {}", vm, e);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await?;

        info!("VM {} 配置已解锁", vm);
        Ok(())
    }

    /// 等待虚拟机进入指定状态（不区分大小写）
    pub async fn wait_for_state(
        &self,
        vm: &VmLocation,
        state: &str,
        settings: PollSettings,
    ) -> Result<()> {
        let api = &self.api;
        let target = state.to_lowercase();
        let expected = target.as_str();

        poll_until(
            settings,
            vm.vm_id,
            &format!("进入状态 \"{}\"", target),
            move || async move {
                let status = api.get_vm_status(vm).await?;
                debug!("VM {} 当前状态: {}", vm, status.status);
                Ok(status.status.eq_ignore_ascii_case(expected).then_some(()))
            },
        )
        .await?;

        info!("VM {} 已进入状态 {}", vm, target);
        Ok(())
    }
}
