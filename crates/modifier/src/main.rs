/// Easy VM Cloud - VM Modifier
///
/// 命令行入口：修改虚拟机磁盘与重启、回读磁盘大小、分配 VM ID、等待虚拟机状态

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::models::{DiskSlot, ModifyRequest, VmLocation};
use common::VmApi;
use pve_client::ProxmoxClient;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use vm_modifier::{Config, ModifyVmResource, VmIdAllocator, VmModifier, VmWaiter};

/// Proxmox VE 虚拟机修改工具
#[derive(Parser, Debug)]
#[command(name = "vm-modify", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct VmArgs {
    /// 节点名称
    #[arg(long)]
    node: String,

    /// VM ID
    #[arg(long)]
    vm_id: u32,
}

#[derive(Args, Debug)]
struct DiskArgs {
    /// 磁盘总线：virtio、sata、scsi、ide
    #[arg(long, default_value = "virtio")]
    disk: String,

    /// 总线上的序号
    #[arg(long, default_value = "0")]
    index: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 迁移、扩容磁盘并重启，完成后回读磁盘大小
    Apply {
        #[command(flatten)]
        vm: VmArgs,

        #[command(flatten)]
        disk: DiskArgs,

        /// 新的磁盘大小，例如 32G 或 +10G
        #[arg(long)]
        size: Option<String>,

        /// 迁移的目标存储
        #[arg(long)]
        storage: Option<String>,

        /// 迁移后删除源磁盘
        #[arg(long)]
        delete_source: bool,

        /// 不重启虚拟机
        #[arg(long)]
        no_reboot: bool,

        /// 修改前后等待配置解锁
        #[arg(long)]
        wait_unlock: bool,

        /// 重启后等待客户机代理上报网卡
        #[arg(long)]
        wait_agent: bool,
    },
    /// 回读磁盘大小
    Read {
        #[command(flatten)]
        vm: VmArgs,

        #[command(flatten)]
        disk: DiskArgs,
    },
    /// 分配下一个可用的 VM ID
    NextId,
    /// 等待配置解锁
    WaitUnlock {
        #[command(flatten)]
        vm: VmArgs,
    },
    /// 等待虚拟机进入指定状态
    WaitState {
        #[command(flatten)]
        vm: VmArgs,

        /// 目标状态，例如 running、stopped
        #[arg(long)]
        state: String,
    },
    /// 等待客户机代理上报网卡
    WaitAgent {
        #[command(flatten)]
        vm: VmArgs,

        /// 改为等待代理停止上报
        #[arg(long)]
        absent: bool,
    },
}

#[derive(Serialize)]
struct DiskSize {
    disk: DiskSlot,
    size: String,
}

#[derive(Serialize)]
struct NextId {
    vm_id: u32,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 日志级别优先取 RUST_LOG，其次 LOG_LEVEL
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let cli = Cli::parse();

    let cfg = Config::from_env()?;
    info!("✅ 配置加载成功");

    info!("🔗 连接 Proxmox VE: {}", cfg.pve_endpoint);
    let api: Arc<dyn VmApi> = Arc::new(ProxmoxClient::new(cfg.client_options())?);

    match cli.command {
        Command::Apply {
            vm,
            disk,
            size,
            storage,
            delete_source,
            no_reboot,
            wait_unlock,
            wait_agent,
        } => {
            let mut request = ModifyRequest::new(vm.node, vm.vm_id)
                .with_disk(disk.disk, disk.index)
                .with_reboot(!no_reboot);
            if let Some(size) = size {
                request = request.with_new_size(size);
            }
            if let Some(storage) = storage {
                request = request.with_move(storage, delete_source);
            }

            let resource = ModifyVmResource::new(api, cfg.modify_options(wait_unlock, wait_agent));
            info!("🚀 开始修改 VM {}", request.vm_id);
            let state = resource.create(&request).await?;
            print_json(&state)?;
        }
        Command::Read { vm, disk } => {
            let slot = DiskSlot::parse(&disk.disk, disk.index)?;
            let location = VmLocation::new(vm.node, vm.vm_id);
            let modifier = VmModifier::new(api);
            let size = modifier.read_disk_size(&location, &slot).await?;
            print_json(&DiskSize { disk: slot, size })?;
        }
        Command::NextId => {
            let vm_id = VmIdAllocator::new(api).next_id().await?;
            print_json(&NextId { vm_id })?;
        }
        Command::WaitUnlock { vm } => {
            let location = VmLocation::new(vm.node, vm.vm_id);
            VmWaiter::new(api)
                .wait_for_config_unlock(&location, cfg.wait_settings(), false)
                .await?;
        }
        Command::WaitState { vm, state } => {
            let location = VmLocation::new(vm.node, vm.vm_id);
            VmWaiter::new(api)
                .wait_for_state(&location, &state, cfg.wait_settings())
                .await?;
        }
        Command::WaitAgent { vm, absent } => {
            let location = VmLocation::new(vm.node, vm.vm_id);
            let waiter = VmWaiter::new(api);
            if absent {
                waiter
                    .wait_for_no_network_interfaces(&location, cfg.wait_settings())
                    .await?;
            } else {
                let interfaces = waiter
                    .wait_for_network_interfaces(&location, cfg.wait_settings())
                    .await?;
                print_json(&interfaces)?;
            }
        }
    }

    Ok(())
}
