//! Burst 内核构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml（或 build/.config）配置文件
//! 2. 校验调度策略并应用 BURST_SCHED 覆盖
//! 3. 生成 src/config.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

const POLICIES: [&str; 3] = ["fcfs", "sjf", "hbsjf"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KernelToml {
    general: General,
    smp: Smp,
    process: Process,
    scheduler: Scheduler,
    sync: Sync,
    debug: Debug,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct General {
    name: String,
    version: String,
}

impl Default for General {
    fn default() -> Self {
        Self { name: "Burst".into(), version: "0.1.0".into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Smp {
    max_cpus: usize,
}

impl Default for Smp {
    fn default() -> Self {
        Self { max_cpus: 2 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Process {
    nproc: usize,
    nofile: usize,
    kstack_limit: usize,
}

impl Default for Process {
    fn default() -> Self {
        Self { nproc: 64, nofile: 16, kstack_limit: 64 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Scheduler {
    policy: String,
    time_quantum: u32,
    tick_interval_us: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self { policy: "fcfs".into(), time_quantum: 2000, tick_interval_us: 1000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Sync {
    mutex_backoff_ticks: u64,
}

impl Default for Sync {
    fn default() -> Self {
        Self { mutex_backoff_ticks: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Debug {
    log_level: String,
}

impl Default for Debug {
    fn default() -> Self {
        Self { log_level: "info".into() }
    }
}

/// 解析 build/.config 文件（简单 section_key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, toml::map::Map<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        // 使用第一个下划线分割 section 与键名
        let Some((section, config_key)) = key.trim().split_once('_') else {
            continue;
        };

        let value = value.trim().trim_matches('"');
        let parsed = if value == "true" {
            toml::Value::Boolean(true)
        } else if value == "false" {
            toml::Value::Boolean(false)
        } else if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else {
            toml::Value::String(value.to_string())
        };

        sections
            .entry(section.to_string())
            .or_default()
            .insert(config_key.to_string(), parsed);
    }

    let mut root = toml::map::Map::new();
    for (name, table) in sections {
        root.insert(name, toml::Value::Table(table));
    }
    toml::Value::Table(root)
}

fn load_config() -> KernelToml {
    if let Ok(content) = fs::read_to_string("../build/.config") {
        println!("cargo:warning=Using build/.config configuration");
        return parse_dot_config(&content)
            .try_into()
            .expect("build/.config 解析失败");
    }

    let content = fs::read_to_string("../Kernel.toml").expect("无法读取 Kernel.toml");
    toml::from_str(&content).expect("Kernel.toml 解析失败")
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");
    println!("cargo:rerun-if-env-changed=BURST_SCHED");

    let mut config = load_config();

    if let Ok(policy) = env::var("BURST_SCHED") {
        config.scheduler.policy = policy;
    }
    config.scheduler.policy = config.scheduler.policy.to_ascii_lowercase();
    if !POLICIES.contains(&config.scheduler.policy.as_str()) {
        panic!(
            "未知的调度策略 `{}`，可选值：{}",
            config.scheduler.policy,
            POLICIES.join(" | ")
        );
    }
    assert!(config.smp.max_cpus >= 1, "smp.max_cpus 至少为 1");
    assert!(config.process.nproc >= 1, "process.nproc 至少为 1");
    assert!(config.scheduler.time_quantum >= 1, "scheduler.time_quantum 至少为 1");

    println!("cargo:rustc-env=CARGO_KERNEL_NAME={}", config.general.name);
    println!("cargo:rustc-env=CARGO_KERNEL_VERSION={}", config.general.version);

    generate_config_code(&config);
}

fn generate_config_code(config: &KernelToml) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR 未设置"));

    let config_code = format!(
        r#"//! Burst 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// SMP 配置
// ============================================================

/// 模拟的 CPU 数量
pub const MAX_CPUS: usize = {};

// ============================================================
// 进程配置
// ============================================================

/// 进程表槽位数
pub const NPROC: usize = {};

/// 每个进程的打开文件数上限
pub const NOFILE: usize = {};

/// 可同时存在的内核栈数量
pub const KSTACK_LIMIT: usize = {};

// ============================================================
// 调度器配置
// ============================================================

/// 调度策略（fcfs | sjf | hbsjf）
pub const SCHED_POLICY: &str = "{}";

/// 初始全局时间片（滴答数）
pub const TIME_QUANTUM: u32 = {};

/// 时钟中断间隔（微秒）
pub const TICK_INTERVAL_US: u64 = {};

// ============================================================
// 同步原语配置
// ============================================================

/// 互斥锁退避的滴答数
pub const MUTEX_BACKOFF_TICKS: u64 = {};

// ============================================================
// 调试配置
// ============================================================

/// 默认日志级别
pub const LOG_LEVEL: &str = "{}";
"#,
        config.general.name,
        config.general.version,
        config.smp.max_cpus,
        config.process.nproc,
        config.process.nofile,
        config.process.kstack_limit,
        config.scheduler.policy,
        config.scheduler.time_quantum,
        config.scheduler.tick_interval_us,
        config.sync.mutex_backoff_ticks,
        config.debug.log_level,
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing = fs::read_to_string(&config_file).unwrap_or_default();
    if existing != config_code {
        fs::write(&config_file, &config_code).expect("写入配置文件失败");
    }
}
