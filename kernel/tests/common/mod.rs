//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 场景测试共用的辅助函数

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use burst::{KernelConfig, Machine, PolicyKind, UserProc};

/// 小进程表、指定策略与 CPU 数的配置
pub fn config(policy: PolicyKind, ncpu: usize) -> KernelConfig {
    KernelConfig::default()
        .with_policy(policy)
        .with_ncpu(ncpu)
        .with_nproc(16)
}

/// 运行到关机，内核 panic 让测试失败
pub fn run<F>(config: KernelConfig, init: F)
where
    F: FnOnce(&UserProc) + Send + 'static,
{
    if let Err(panic) = Machine::run(config, init) {
        panic!("{}", panic);
    }
}

/// 通过一个子进程给当前进程声明 burst_time
///
/// burst_time 记在调用者的父进程上，所以要由子进程来设置。
pub fn declare_burst(user: &UserProc, n: i32) {
    let pid = user.fork(move |child| {
        assert_eq!(child.set_burst_time(n), 0);
    });
    assert!(pid > 0);
    assert_eq!(user.wait(), pid);
}

/// 进程间共享的记录表
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<i32>>>);

impl Trace {
    pub fn push(&self, value: i32) {
        self.0.lock().unwrap().push(value);
    }

    pub fn take(&self) -> Vec<i32> {
        self.0.lock().unwrap().clone()
    }
}
