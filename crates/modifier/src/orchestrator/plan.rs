/// 修改计划
///
/// 请求在任何远程调用之前完成校验并展开为有序的步骤列表

use common::models::{DiskSlot, ModifyRequest, ModifyStage, MoveDiskSpec, VmLocation};
use common::Result;
use validator::Validate;

use super::ModifyOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyPlan {
    pub location: VmLocation,
    pub slot: DiskSlot,
    pub move_disk: Option<MoveDiskSpec>,
    pub new_size: Option<String>,
    pub reboot: bool,
}

impl ModifyPlan {
    /// 校验请求并生成计划
    pub fn from_request(request: &ModifyRequest) -> Result<Self> {
        request.validate()?;
        let slot = request.slot()?;

        Ok(Self {
            location: request.location(),
            slot,
            move_disk: request.move_target(),
            new_size: request.resize_target().map(str::to_string),
            reboot: request.reboot,
        })
    }

    /// 是否会修改虚拟机
    pub fn mutates(&self) -> bool {
        self.move_disk.is_some() || self.new_size.is_some() || self.reboot
    }

    /// 按执行顺序列出将要运行的步骤（不含 Idle 与 Done）
    pub fn stages(&self, options: &ModifyOptions) -> Vec<ModifyStage> {
        let wait_unlock = options.wait_for_unlock.is_some() && self.mutates();
        let mut stages = Vec::new();

        if wait_unlock {
            stages.push(ModifyStage::WaitingForUnlock);
        }
        if self.move_disk.is_some() {
            stages.push(ModifyStage::MovingDisk);
        }
        if self.new_size.is_some() {
            stages.push(ModifyStage::ResizingDisk);
        }
        if self.reboot {
            stages.push(ModifyStage::Rebooting);
            if options.agent_network.is_some() {
                stages.push(ModifyStage::WaitingForAgent);
            }
        }
        if wait_unlock {
            stages.push(ModifyStage::WaitingForUnlock);
        }
        stages.push(ModifyStage::ReadBack);

        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::PollSettings;
    use common::Error;

    #[test]
    fn test_move_only_plan() {
        let request = ModifyRequest::new("pve1", 101)
            .with_move("ceph", false)
            .with_reboot(false);
        let plan = ModifyPlan::from_request(&request).unwrap();

        assert_eq!(plan.slot.key(), "virtio0");
        assert_eq!(
            plan.stages(&ModifyOptions::default()),
            vec![ModifyStage::MovingDisk, ModifyStage::ReadBack]
        );
    }

    #[test]
    fn test_full_plan_with_waits() {
        let request = ModifyRequest::new("pve1", 101)
            .with_disk("scsi", 5)
            .with_move("ceph", true)
            .with_new_size("64G");
        let options = ModifyOptions {
            wait_for_unlock: Some(PollSettings::default()),
            agent_network: Some(PollSettings::default()),
            task_timeout: None,
        };
        let plan = ModifyPlan::from_request(&request).unwrap();

        assert_eq!(
            plan.stages(&options),
            vec![
                ModifyStage::WaitingForUnlock,
                ModifyStage::MovingDisk,
                ModifyStage::ResizingDisk,
                ModifyStage::Rebooting,
                ModifyStage::WaitingForAgent,
                ModifyStage::WaitingForUnlock,
                ModifyStage::ReadBack,
            ]
        );
    }

    #[test]
    fn test_noop_plan_skips_unlock() {
        let request = ModifyRequest::new("pve1", 101).with_reboot(false);
        let options = ModifyOptions {
            wait_for_unlock: Some(PollSettings::default()),
            ..ModifyOptions::default()
        };
        let plan = ModifyPlan::from_request(&request).unwrap();

        assert!(!plan.mutates());
        assert_eq!(plan.stages(&options), vec![ModifyStage::ReadBack]);
    }

    #[test]
    fn test_invalid_index_rejected() {
        let request = ModifyRequest::new("pve1", 101).with_disk("scsi", 14);
        assert!(matches!(
            ModifyPlan::from_request(&request),
            Err(Error::InvalidArgument(_))
        ));
    }
}
