//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 系统调用接口
//!
//! 进程的程序通过 [`UserProc`] 陷入内核。约定与 xv6 相同：成功返回
//! 非负值，任何错误一律返回 -1；返回值同时写入陷入帧的 a0。
//! 每次从系统调用返回前检查 kill 标记，被 kill 的进程不会再回到程序中。

use std::sync::Arc;

use crate::config::MUTEX_BACKOFF_TICKS;
use crate::errno::{syscall_ret, Errno};
use crate::kernel::Kernel;
use crate::process::{Pid, ProcessInfo, TrapFrame};
use crate::sync::Backoff;

/// 正在运行的进程看到的内核
pub struct UserProc {
    kernel: Arc<Kernel>,
}

impl UserProc {
    pub(crate) fn new(kernel: Arc<Kernel>) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    /// 系统调用返回路径：投递到期的时钟中断，写 a0，检查 kill 标记
    fn ret(&self, value: i32) -> i32 {
        self.kernel.clock_interrupt();
        {
            let mut ptable = self.kernel.ptable.lock();
            let me = self.kernel.current();
            ptable.procs[me].tf.a0 = value as isize;
        }
        self.kernel.return_to_user();
        value
    }

    fn ret_result(&self, result: Result<i32, Errno>) -> i32 {
        if let Err(err) = &result {
            log::trace!("syscall failed: {}", err);
        }
        self.ret(syscall_ret(result))
    }

    fn pid_arg(pid: i32) -> Result<Pid, Errno> {
        Pid::try_from(pid).map_err(|_| Errno::NoSuchProcess)
    }

    pub fn getpid(&self) -> i32 {
        let pid = {
            let ptable = self.kernel.ptable.lock();
            ptable.procs[self.kernel.current()].pid
        };
        self.ret(pid as i32)
    }

    /// 创建子进程，子进程运行 `child`
    ///
    /// 父进程得到子进程 pid，失败返回 -1。
    pub fn fork<F>(&self, child: F) -> i32
    where
        F: FnOnce(&UserProc) + Send + 'static,
    {
        let result = self.kernel.fork(Box::new(child)).map(|pid| pid as i32);
        self.ret_result(result)
    }

    pub fn exit(&self) -> ! {
        self.kernel.exit()
    }

    pub fn wait(&self) -> i32 {
        let result = self.kernel.wait().map(|pid| pid as i32);
        self.ret_result(result)
    }

    pub fn kill(&self, pid: i32) -> i32 {
        let result = Self::pid_arg(pid).and_then(|pid| self.kernel.kill(pid)).map(|()| 0);
        self.ret_result(result)
    }

    /// 睡眠 `n` 个时钟滴答
    pub fn sleep(&self, n: i32) -> i32 {
        let result = self
            .kernel
            .sleep_ticks(n.max(0) as u64)
            .map(|()| 0);
        self.ret_result(result)
    }

    pub fn uptime(&self) -> i32 {
        let ticks = self.kernel.uptime();
        self.ret(ticks as i32)
    }

    pub fn yield_now(&self) -> i32 {
        self.kernel.yield_now();
        self.ret(0)
    }

    pub fn get_num_proc(&self) -> i32 {
        let n = self.kernel.get_num_proc();
        self.ret(n as i32)
    }

    /// 最大活跃 pid，没有活跃进程时 -1
    pub fn get_max_pid(&self) -> i32 {
        let max = self.kernel.get_max_pid().map_or(-1, |pid| pid as i32);
        self.ret(max)
    }

    pub fn get_proc_info(&self, pid: i32, info: &mut ProcessInfo) -> i32 {
        let result = Self::pid_arg(pid)
            .and_then(|pid| self.kernel.get_proc_info(pid))
            .map(|found| {
                *info = found;
                0
            });
        self.ret_result(result)
    }

    pub fn set_burst_time(&self, n: i32) -> i32 {
        let result = self.kernel.set_burst_time(n).map(|()| 0);
        self.ret_result(result)
    }

    pub fn get_burst_time(&self) -> i32 {
        let burst = self.kernel.get_burst_time();
        self.ret(burst as i32)
    }

    pub fn pstate(&self) -> i32 {
        self.kernel.pstate();
        self.ret(1)
    }

    pub fn procdump(&self) {
        self.kernel.procdump();
    }

    /// 模拟一次定时器中断，长时间计算的程序应定期调用
    pub fn tick(&self) {
        self.kernel.timer_interrupt();
    }

    /// 当前陷入帧
    pub fn trapframe(&self) -> TrapFrame {
        let ptable = self.kernel.ptable.lock();
        ptable.procs[self.kernel.current()].tf
    }
}

impl Backoff for UserProc {
    /// 睡眠若干时钟滴答；被 kill 后睡眠立即失败，改为让出 CPU
    fn backoff(&self) {
        if self.kernel.sleep_ticks(MUTEX_BACKOFF_TICKS).is_err() {
            self.kernel.yield_now();
        }
    }
}
