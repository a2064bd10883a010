use common::models::{NetworkInterface, VmLocation};
use common::Result;
use tracing::{debug, info};

use super::VmWaiter;
use crate::poller::{poll_until, PollSettings};

impl VmWaiter {
    /// 等待客户机代理上报网卡
    ///
    /// 查询出错视为代理尚未就绪，继续轮询
    pub async fn wait_for_network_interfaces(
        &self,
        vm: &VmLocation,
        settings: PollSettings,
    ) -> Result<Vec<NetworkInterface>> {
        let api = &self.api;

        let interfaces = poll_until(settings, vm.vm_id, "客户机代理上报网卡", move || async move {
            match api.get_agent_network_interfaces(vm).await {
                Ok(interfaces) if !interfaces.is_empty() => Ok(Some(interfaces)),
                Ok(_) => Ok(None),
                Err(e) => {
                    debug!("VM {} 客户机代理尚未就绪: {}", vm, e);
                    Ok(None)
                }
            }
        })
        .await?;

        info!("VM {} 客户机代理已上报 {} 块网卡", vm, interfaces.len());
        Ok(interfaces)
    }

    /// 等待客户机代理停止上报网卡
    ///
    /// 代理返回错误即视为已停止上报。任何错误（包括与代理无关的传输错误）
    /// 都会被当作完成信号，调用方需要自行区分
    pub async fn wait_for_no_network_interfaces(
        &self,
        vm: &VmLocation,
        settings: PollSettings,
    ) -> Result<()> {
        let api = &self.api;

        poll_until(settings, vm.vm_id, "客户机代理停止上报网卡", move || async move {
            match api.get_agent_network_interfaces(vm).await {
                Ok(_) => Ok(None),
                Err(e) => {
                    debug!("VM {} 客户机代理返回错误，视为已停止上报: {}", vm, e);
                    Ok(Some(()))
                }
            }
        })
        .await?;

        info!("VM {} 客户机代理已停止上报网卡", vm);
        Ok(())
    }
}
