//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程控制块 (Process Control Block)
//!
//! 每个字段的读写（除诊断输出里的 pid/state）都必须持有进程表锁。
//! 父进程用槽位下标表示，不持有父进程的任何所有权。

use std::sync::Arc;

use bitflags::bitflags;

use crate::fs::{File, Inode};
use crate::mm::{AddressSpace, KernelStack};
use crate::syscall::UserProc;

pub type Pid = u32;

/// 进程运行的程序
///
/// fork 出的子进程从这里开始执行，相当于 fork 在子进程中返回 0 之后的代码。
pub type Program = Box<dyn FnOnce(&UserProc) + Send + 'static>;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProcState {
    /// 空闲槽位
    Unused = 0,
    /// 已分配、尚未初始化完成
    Embryo = 1,
    /// 阻塞在某个通道上
    Sleeping = 2,
    /// 等待被调度
    Runnable = 3,
    /// 正在某个 CPU 上运行
    Running = 4,
    /// 已退出，等待父进程回收
    Zombie = 5,
}

impl ProcState {
    /// pstate 使用的名字
    pub const fn name(self) -> &'static str {
        match self {
            ProcState::Unused => "UNUSED",
            ProcState::Embryo => "EMBRYO",
            ProcState::Sleeping => "SLEEPING",
            ProcState::Runnable => "RUNNABLE",
            ProcState::Running => "RUNNING",
            ProcState::Zombie => "ZOMBIE",
        }
    }

    /// procdump 使用的定宽短名
    pub const fn short_name(self) -> &'static str {
        match self {
            ProcState::Unused => "unused",
            ProcState::Embryo => "embryo",
            ProcState::Sleeping => "sleep ",
            ProcState::Runnable => "runble",
            ProcState::Running => "run   ",
            ProcState::Zombie => "zombie",
        }
    }

    /// 是否允许从 `self` 迁移到 `next`
    ///
    /// `Embryo -> Unused` 是初始化失败时归还槽位。
    pub const fn can_transition_to(self, next: ProcState) -> bool {
        use ProcState::*;
        matches!(
            (self, next),
            (Unused, Embryo)
                | (Embryo, Runnable)
                | (Embryo, Unused)
                | (Runnable, Running)
                | (Running, Runnable)
                | (Running, Sleeping)
                | (Sleeping, Runnable)
                | (Running, Zombie)
                | (Zombie, Unused)
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcFlags: u32 {
        /// 已被 kill，返回用户态前退出
        const KILLED = 1 << 0;
        /// HBSJF：本轮已被调度过
        const RAN_THIS_ROUND = 1 << 1;
    }
}

/// 睡眠通道
///
/// 双方约定的会合标识，本身不携带数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 等待某个槽位上进程的子进程退出
    Proc(usize),
    /// 时钟滴答
    Ticks,
    /// 任意对象的地址
    Addr(usize),
}

impl Channel {
    /// 以对象地址作为通道
    pub fn of<T>(object: &T) -> Self {
        Channel::Addr(object as *const T as usize)
    }
}

/// 用户可见的寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapFrame {
    /// 返回值寄存器
    pub a0: isize,
    pub epc: usize,
    pub sp: usize,
}

/// 进程控制块
pub struct Proc {
    pub pid: Pid,
    state: ProcState,
    /// 父进程槽位，只有根进程为 None
    pub parent: Option<usize>,
    pub burst_time: u32,
    /// 自上次清零以来的滴答数
    pub running_time: u32,
    /// 被调度的次数
    pub switch_count: u32,
    pub flags: ProcFlags,
    /// 仅在 Sleeping 状态下有效
    pub chan: Option<Channel>,
    pub name: String,
    pub vm: Option<AddressSpace>,
    pub kstack: Option<KernelStack>,
    pub tf: TrapFrame,
    pub ofile: Vec<Option<Arc<File>>>,
    pub cwd: Option<Arc<Inode>>,
    pub(crate) program: Option<Program>,
}

impl Proc {
    pub fn new(nofile: usize) -> Self {
        Self {
            pid: 0,
            state: ProcState::Unused,
            parent: None,
            burst_time: 0,
            running_time: 0,
            switch_count: 0,
            flags: ProcFlags::empty(),
            chan: None,
            name: String::new(),
            vm: None,
            kstack: None,
            tf: TrapFrame::default(),
            ofile: (0..nofile).map(|_| None).collect(),
            cwd: None,
            program: None,
        }
    }

    #[inline]
    pub fn state(&self) -> ProcState {
        self.state
    }

    /// 迁移状态，非法迁移直接停机
    pub fn set_state(&mut self, next: ProcState) {
        if !self.state.can_transition_to(next) {
            panic!(
                "illegal transition {:?} -> {:?} (pid {})",
                self.state, next, self.pid
            );
        }
        #[cfg(feature = "debug_log")]
        log::trace!("pid {}: {:?} -> {:?}", self.pid, self.state, next);
        self.state = next;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != ProcState::Unused
    }

    #[inline]
    pub fn killed(&self) -> bool {
        self.flags.contains(ProcFlags::KILLED)
    }

    #[inline]
    pub fn ran_this_round(&self) -> bool {
        self.flags.contains(ProcFlags::RAN_THIS_ROUND)
    }

    /// 新分配时清零计数器
    pub(crate) fn clear_counters(&mut self) {
        self.burst_time = 0;
        self.running_time = 0;
        self.switch_count = 0;
        self.flags = ProcFlags::empty();
    }

    /// 回收后抹去簿记信息
    pub(crate) fn clear_identity(&mut self) {
        self.pid = 0;
        self.parent = None;
        self.name.clear();
        self.chan = None;
        self.flags = ProcFlags::empty();
        self.tf = TrapFrame::default();
        self.program = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProcState::*;

    const ALL: [ProcState; 6] = [Unused, Embryo, Sleeping, Runnable, Running, Zombie];

    #[test]
    fn test_transition_table() {
        let legal = [
            (Unused, Embryo),
            (Embryo, Runnable),
            (Embryo, Unused),
            (Runnable, Running),
            (Running, Runnable),
            (Running, Sleeping),
            (Sleeping, Runnable),
            (Running, Zombie),
            (Zombie, Unused),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut p = Proc::new(4);
        for next in [Embryo, Runnable, Running, Sleeping, Runnable, Running, Zombie, Unused] {
            p.set_state(next);
        }
        assert!(!p.is_active());
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_sleeping_cannot_run_directly() {
        let mut p = Proc::new(4);
        p.set_state(Embryo);
        p.set_state(Runnable);
        p.set_state(Running);
        p.set_state(Sleeping);
        p.set_state(Running);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_unused_cannot_become_runnable() {
        Proc::new(4).set_state(Runnable);
    }

    #[test]
    fn test_channel_of_distinguishes_objects() {
        let (a, b) = (1u64, 2u64);
        assert_eq!(Channel::of(&a), Channel::of(&a));
        assert_ne!(Channel::of(&a), Channel::of(&b));
    }
}
