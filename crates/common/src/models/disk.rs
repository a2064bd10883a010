/// 磁盘寻址与磁盘配置

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::utils::parse_property_string;

/// 磁盘总线类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DiskBus {
    Virtio,
    Sata,
    Scsi,
    Ide,
}

/// 各总线允许的最大磁盘序号（含）
pub const DISK_BUS_LIMITS: &[(DiskBus, u8)] = &[
    (DiskBus::Virtio, 15),
    (DiskBus::Sata, 5),
    (DiskBus::Scsi, 13),
    (DiskBus::Ide, 2),
];

impl DiskBus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskBus::Virtio => "virtio",
            DiskBus::Sata => "sata",
            DiskBus::Scsi => "scsi",
            DiskBus::Ide => "ide",
        }
    }

    pub fn max_index(&self) -> u8 {
        DISK_BUS_LIMITS
            .iter()
            .find(|(bus, _)| bus == self)
            .map(|(_, max)| *max)
            .unwrap_or(0)
    }
}

impl FromStr for DiskBus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "virtio" => Ok(DiskBus::Virtio),
            "sata" => Ok(DiskBus::Sata),
            "scsi" => Ok(DiskBus::Scsi),
            "ide" => Ok(DiskBus::Ide),
            other => Err(Error::InvalidArgument(format!("不支持的磁盘总线: {}", other))),
        }
    }
}

impl fmt::Display for DiskBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 经过校验的磁盘槽位 (总线 + 序号)
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiskSlot {
    bus: DiskBus,
    index: u8,
}

impl DiskSlot {
    pub fn new(bus: DiskBus, index: u8) -> Result<Self> {
        let max = bus.max_index();
        if index > max {
            return Err(Error::InvalidArgument(format!(
                "磁盘序号 {} 超出 {} 总线范围 (0-{})",
                index, bus, max
            )));
        }
        Ok(Self { bus, index })
    }

    /// 从总线名与序号构造
    pub fn parse(bus: &str, index: u32) -> Result<Self> {
        let bus = DiskBus::from_str(bus)?;
        let index = u8::try_from(index).map_err(|_| {
            Error::InvalidArgument(format!("磁盘序号 {} 超出 {} 总线范围 (0-{})", index, bus, bus.max_index()))
        })?;
        Self::new(bus, index)
    }

    /// 从配置键 (如 "scsi5") 解析，不是磁盘键时返回 None
    pub fn from_key(key: &str) -> Option<Self> {
        let split = key.find(|c: char| c.is_ascii_digit())?;
        let (bus, index) = key.split_at(split);
        let bus = DiskBus::from_str(bus).ok()?;
        let index = index.parse::<u8>().ok()?;
        Self::new(bus, index).ok()
    }

    pub fn bus(&self) -> DiskBus {
        self.bus
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// 远程 API 使用的磁盘键
    pub fn key(&self) -> String {
        format!("{}{}", self.bus, self.index)
    }
}

impl fmt::Display for DiskSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.bus, self.index)
    }
}

/// 磁盘配置，由属性字符串解析
/// 例如 `local-lvm:vm-100-disk-0,cache=writeback,size=32G`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiskDescriptor {
    pub volume: Option<String>,
    pub size: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl DiskDescriptor {
    pub fn parse(value: &str) -> Self {
        let (volume, mut options) = parse_property_string(value);
        let volume = volume.or_else(|| options.remove("file"));
        let size = options.remove("size");
        Self {
            volume,
            size,
            options,
        }
    }

    /// 存储名 (volume 中冒号之前的部分)
    pub fn storage(&self) -> Option<&str> {
        self.volume
            .as_deref()
            .and_then(|v| v.split_once(':').map(|(storage, _)| storage))
    }

    pub fn is_cdrom(&self) -> bool {
        self.options.get("media").map(String::as_str) == Some("cdrom")
    }
}

/// 虚拟机配置的只读投影，按磁盘键索引
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VmConfig {
    pub disks: BTreeMap<String, DiskDescriptor>,
}

impl VmConfig {
    /// 从原始配置对象中提取所有磁盘
    pub fn from_raw(raw: &serde_json::Map<String, serde_json::Value>) -> Self {
        let disks = raw
            .iter()
            .filter_map(|(key, value)| {
                let slot = DiskSlot::from_key(key)?;
                let value = value.as_str()?;
                Some((slot.key(), DiskDescriptor::parse(value)))
            })
            .collect();
        Self { disks }
    }

    pub fn disk(&self, slot: &DiskSlot) -> Option<&DiskDescriptor> {
        self.disks.get(&slot.key())
    }
}
