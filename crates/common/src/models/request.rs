/// 虚拟机修改请求

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::constants::{DEFAULT_DISK_BUS, DEFAULT_NEW_DISK_SIZE};
use super::{DiskSlot, VmLocation};
use crate::errors::Result;

/// 一次编排的修改请求
///
/// 字段默认值与声明式资源保持一致：总线 virtio、序号 0、
/// 新大小 "0G" 表示不调整、目标存储为空表示不迁移、默认重启
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[validate(schema(function = "validate_disk_slot", skip_on_field_errors = false))]
pub struct ModifyRequest {
    #[validate(length(min = 1, max = 255))]
    pub node_name: String,

    #[validate(range(min = 100, max = 2147483637))]
    pub vm_id: u32,

    #[serde(default = "default_disk_name")]
    pub disk_name: String,

    #[serde(default)]
    pub disk_index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_disk_size")]
    pub new_disk_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_storage: Option<String>,

    /// 迁移后是否删除源磁盘
    #[serde(default)]
    pub delete_source: bool,

    #[serde(default = "default_reboot")]
    pub reboot: bool,
}

/// 磁盘迁移参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveDiskSpec {
    pub target_storage: String,
    pub delete_source: bool,
}

fn default_disk_name() -> String {
    DEFAULT_DISK_BUS.to_string()
}

fn default_reboot() -> bool {
    true
}

impl ModifyRequest {
    pub fn new(node_name: impl Into<String>, vm_id: u32) -> Self {
        Self {
            node_name: node_name.into(),
            vm_id,
            disk_name: default_disk_name(),
            disk_index: 0,
            new_disk_size: None,
            target_storage: None,
            delete_source: false,
            reboot: default_reboot(),
        }
    }

    pub fn with_disk(mut self, bus: impl Into<String>, index: u32) -> Self {
        self.disk_name = bus.into();
        self.disk_index = index;
        self
    }

    pub fn with_new_size(mut self, size: impl Into<String>) -> Self {
        self.new_disk_size = Some(size.into());
        self
    }

    pub fn with_move(mut self, target_storage: impl Into<String>, delete_source: bool) -> Self {
        self.target_storage = Some(target_storage.into());
        self.delete_source = delete_source;
        self
    }

    pub fn with_reboot(mut self, reboot: bool) -> Self {
        self.reboot = reboot;
        self
    }

    pub fn location(&self) -> VmLocation {
        VmLocation::new(self.node_name.clone(), self.vm_id)
    }

    /// 解析并校验磁盘槽位
    pub fn slot(&self) -> Result<DiskSlot> {
        DiskSlot::parse(&self.disk_name, self.disk_index)
    }

    /// 需要调整的目标大小，"0G" 与空值视为未设置
    pub fn resize_target(&self) -> Option<&str> {
        self.new_disk_size
            .as_deref()
            .filter(|size| !size.is_empty() && *size != DEFAULT_NEW_DISK_SIZE)
    }

    /// 需要迁移的目标存储，空值视为未设置
    pub fn move_target(&self) -> Option<MoveDiskSpec> {
        self.target_storage
            .as_deref()
            .filter(|storage| !storage.is_empty())
            .map(|storage| MoveDiskSpec {
                target_storage: storage.to_string(),
                delete_source: self.delete_source,
            })
    }
}

fn validate_disk_slot(request: &ModifyRequest) -> std::result::Result<(), ValidationError> {
    DiskSlot::parse(&request.disk_name, request.disk_index)
        .map(|_| ())
        .map_err(|e| {
            let mut err = ValidationError::new("disk_slot");
            err.message = Some(Cow::Owned(e.to_string()));
            err
        })
}

/// 大小格式：可选的 "+" 前缀、数字、可选的 K/M/G/T 单位，空值表示不调整
fn validate_disk_size(size: &str) -> std::result::Result<(), ValidationError> {
    if size.is_empty() {
        return Ok(());
    }
    let digits = size.strip_prefix('+').unwrap_or(size);
    let digits = digits
        .strip_suffix(|c: char| matches!(c, 'K' | 'M' | 'G' | 'T'))
        .unwrap_or(digits);

    let valid = !digits.is_empty() && {
        let mut parts = digits.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let fraction = parts.next();
        !whole.is_empty()
            && whole.chars().all(|c| c.is_ascii_digit())
            && fraction.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("disk_size"))
    }
}
