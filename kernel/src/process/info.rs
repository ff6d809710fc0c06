//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程信息查询
//!
//! getNumProc / getMaxPid / getProcInfo / pstate 都只读进程表，
//! 在持锁期间取一份快照后返回；procdump 是例外，它不加锁，
//! 用于内核已经卡死时的诊断。

use crate::errno::Errno;
use crate::kernel::Kernel;

use super::proc::{Pid, ProcState};

/// getProcInfo 填写的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessInfo {
    /// 父进程 pid，没有父进程时为 0
    pub ppid: i32,
    /// 地址空间大小（字节）
    pub psize: usize,
    /// 被调度的次数
    pub switches: u32,
}

/// pstate 的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub name: String,
    pub pid: Pid,
    pub state: ProcState,
    pub switches: u32,
    pub burst_time: u32,
}

impl Kernel {
    /// 活跃（非 Unused）进程数
    pub fn get_num_proc(&self) -> usize {
        let ptable = self.ptable.lock();
        let mut count = 0;
        for p in ptable.procs.iter().filter(|p| p.is_active()) {
            log::debug!("getNumProc: {} (pid {})", p.name, p.pid);
            count += 1;
        }
        count
    }

    /// 活跃进程中最大的 pid
    pub fn get_max_pid(&self) -> Option<Pid> {
        let ptable = self.ptable.lock();
        ptable
            .procs
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.pid)
            .max()
    }

    pub fn get_proc_info(&self, pid: Pid) -> Result<ProcessInfo, Errno> {
        let ptable = self.ptable.lock();
        let slot = ptable.find(pid).ok_or(Errno::NoSuchProcess)?;
        let p = &ptable.procs[slot];
        Ok(ProcessInfo {
            ppid: p.parent.map_or(0, |parent| ptable.procs[parent].pid as i32),
            psize: p.vm.as_ref().map_or(0, |vm| vm.size()),
            switches: p.switch_count,
        })
    }

    /// 所有活跃进程的快照，按槽位顺序
    pub fn proc_stats(&self) -> Vec<ProcStat> {
        let ptable = self.ptable.lock();
        ptable
            .procs
            .iter()
            .filter(|p| p.is_active())
            .map(|p| ProcStat {
                name: p.name.clone(),
                pid: p.pid,
                state: p.state(),
                switches: p.switch_count,
                burst_time: p.burst_time,
            })
            .collect()
    }

    /// 打印进程状态表 (pstate)
    pub fn pstate(&self) {
        let stats = self.proc_stats();
        kprintln!(
            "{:<16} {:>5} {:<10} {:>15} {:>10}",
            "Name",
            "PID",
            "State",
            "No. Of Switches",
            "Burst Time"
        );
        for s in stats {
            kprintln!(
                "{:<16} {:>5} {:<10} {:>15} {:>10}",
                s.name,
                s.pid,
                s.state.name(),
                s.switches,
                s.burst_time
            );
        }
    }

    /// 不加锁打印进程列表 (procdump)
    pub fn procdump(&self) {
        // 只读，可能看到正在修改的字段
        let ptable = unsafe { self.ptable.peek() };
        for p in ptable.procs.iter().filter(|p| p.is_active()) {
            kprintln!("{} {} {}", p.pid, p.state().short_name(), p.name);
        }
    }
}
