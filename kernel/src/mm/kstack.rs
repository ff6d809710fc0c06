//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核栈
//!
//! 每个进程的内核栈是一个宿主线程，线程一启动就阻塞在自己的
//! 上下文上，等待第一次被调度。释放内核栈即让该线程结束。
//! 同时存在的内核栈数量受 `kstack_limit` 限制，超出时分配失败。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use spin::Mutex;

use crate::arch::context::Context;
use crate::errno::Errno;

/// 一个已分配的内核栈
pub struct KernelStack {
    context: Arc<Context>,
}

impl KernelStack {
    /// 此内核栈上执行流的上下文
    pub fn context(&self) -> Arc<Context> {
        self.context.clone()
    }
}

/// 内核栈分配器
pub struct KernelStacks {
    limit: usize,
    live: AtomicUsize,
    halted: Arc<AtomicBool>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl KernelStacks {
    pub fn new(limit: usize, halted: Arc<AtomicBool>) -> Self {
        Self {
            limit,
            live: AtomicUsize::new(0),
            halted,
            threads: Mutex::new(Vec::new()),
        }
    }

    /// 分配内核栈，`body` 在新栈上运行，参数是它自己的上下文
    pub fn alloc<F>(&self, name: String, body: F) -> Result<KernelStack, Errno>
    where
        F: FnOnce(Arc<Context>) + Send + 'static,
    {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.limit).then_some(n + 1))
            .map_err(|_| Errno::OutOfMemory)?;

        let context = Arc::new(Context::new(self.halted.clone()));
        let ctx = context.clone();
        match thread::Builder::new().name(name).spawn(move || body(ctx)) {
            Ok(handle) => {
                self.threads.lock().push(handle);
                Ok(KernelStack { context })
            }
            Err(err) => {
                log::warn!("kstack: spawn failed: {}", err);
                self.live.fetch_sub(1, Ordering::AcqRel);
                Err(Errno::OutOfMemory)
            }
        }
    }

    /// 释放内核栈
    pub fn free(&self, stack: KernelStack) {
        stack.context.reap();
        self.live.fetch_sub(1, Ordering::AcqRel);
    }

    /// 当前存在的内核栈数量
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// 等待所有内核栈线程结束，只在机器停机后调用
    pub fn join_all(&self) {
        let handles: Vec<_> = core::mem::take(&mut *self.threads.lock());
        for handle in handles {
            // 线程体自己捕获栈展开，这里不会拿到错误
            let _ = handle.join();
        }
    }
}
