//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 调度策略
//!
//! 调度循环持进程表锁按槽位顺序扫描，每遇到一个 Runnable 进程就
//! 询问策略本次派发哪一个：
//!
//! - FCFS: 派发扫描遇到的这个进程
//! - SJF: 派发全表 burst_time 最小的 Runnable 进程，相同取槽位小者
//! - HBSJF: 按轮次进行。派发本轮尚未运行过的进程中 burst_time 最小者；
//!   所有 Runnable 进程本轮都运行过时开启新一轮，清空全部槽位的
//!   本轮标记，派发全局最小者。被派发的进程立即标记为本轮已运行。
//!
//! SJF 与 HBSJF 都没有老化机制，长作业可能一直得不到调度。

use core::fmt;

use crate::config::SCHED_POLICY;
use crate::process::{Proc, ProcFlags, ProcState};

/// 选择策略
pub trait SchedPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// 选出要派发的槽位
    ///
    /// `first` 是扫描当前遇到的 Runnable 槽位，返回值一定是 Runnable。
    fn pick(&self, procs: &mut [Proc], first: usize) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Fcfs,
    Sjf,
    Hbsjf,
}

impl PolicyKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fcfs" => Some(PolicyKind::Fcfs),
            "sjf" => Some(PolicyKind::Sjf),
            "hbsjf" => Some(PolicyKind::Hbsjf),
            _ => None,
        }
    }

    /// Kernel.toml 中配置的策略
    pub fn configured() -> Self {
        Self::from_name(SCHED_POLICY).unwrap_or(PolicyKind::Fcfs)
    }

    pub fn build(self) -> Box<dyn SchedPolicy> {
        match self {
            PolicyKind::Fcfs => Box::new(Fcfs),
            PolicyKind::Sjf => Box::new(Sjf),
            PolicyKind::Hbsjf => Box::new(Hbsjf),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Fcfs => "fcfs",
            PolicyKind::Sjf => "sjf",
            PolicyKind::Hbsjf => "hbsjf",
        };
        f.write_str(name)
    }
}

/// 在满足 `eligible` 的 Runnable 进程中找 burst_time 最小者，相同取槽位小者
fn shortest(procs: &[Proc], eligible: impl Fn(&Proc) -> bool) -> Option<usize> {
    procs
        .iter()
        .enumerate()
        .filter(|(_, p)| p.state() == ProcState::Runnable && eligible(*p))
        .min_by_key(|(i, p)| (p.burst_time, *i))
        .map(|(i, _)| i)
}

pub struct Fcfs;

impl SchedPolicy for Fcfs {
    fn name(&self) -> &'static str {
        "fcfs"
    }

    fn pick(&self, _procs: &mut [Proc], first: usize) -> usize {
        first
    }
}

pub struct Sjf;

impl SchedPolicy for Sjf {
    fn name(&self) -> &'static str {
        "sjf"
    }

    fn pick(&self, procs: &mut [Proc], first: usize) -> usize {
        shortest(procs, |_| true).unwrap_or(first)
    }
}

pub struct Hbsjf;

impl SchedPolicy for Hbsjf {
    fn name(&self) -> &'static str {
        "hbsjf"
    }

    fn pick(&self, procs: &mut [Proc], first: usize) -> usize {
        let chosen = match shortest(procs, |p| !p.ran_this_round()) {
            Some(slot) => slot,
            None => {
                // 新一轮
                for p in procs.iter_mut() {
                    p.flags.remove(ProcFlags::RAN_THIS_ROUND);
                }
                shortest(procs, |_| true).unwrap_or(first)
            }
        };
        procs[chosen].flags.insert(ProcFlags::RAN_THIS_ROUND);
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 槽位 0 空闲，其余依次为给定 burst_time 的 Runnable 进程
    fn table(bursts: &[u32]) -> Vec<Proc> {
        let mut procs = vec![Proc::new(1)];
        for (i, &burst) in bursts.iter().enumerate() {
            let mut p = Proc::new(1);
            p.pid = i as u32 + 1;
            p.set_state(ProcState::Embryo);
            p.set_state(ProcState::Runnable);
            p.burst_time = burst;
            procs.push(p);
        }
        procs
    }

    fn first_runnable(procs: &[Proc]) -> usize {
        procs
            .iter()
            .position(|p| p.state() == ProcState::Runnable)
            .unwrap()
    }

    /// 模拟多次派发：被选中的进程运行后让出 CPU，回到 Runnable
    fn dispatches(policy: &dyn SchedPolicy, procs: &mut [Proc], n: usize) -> Vec<u32> {
        (0..n)
            .map(|_| {
                let first = first_runnable(procs);
                let chosen = policy.pick(procs, first);
                assert_eq!(procs[chosen].state(), ProcState::Runnable);
                procs[chosen].burst_time
            })
            .collect()
    }

    #[test]
    fn test_fcfs_takes_scan_position() {
        let mut procs = table(&[5, 2, 8]);
        assert_eq!(Fcfs.pick(&mut procs, 1), 1);
        assert_eq!(Fcfs.pick(&mut procs, 3), 3);
    }

    #[test]
    fn test_sjf_picks_shortest_regardless_of_order() {
        for bursts in [[5, 2, 8], [2, 8, 5], [8, 5, 2]] {
            let mut procs = table(&bursts);
            assert_eq!(dispatches(&Sjf, &mut procs, 1), vec![2]);
        }
    }

    #[test]
    fn test_sjf_starves_long_jobs() {
        let mut procs = table(&[5, 2, 8]);
        assert_eq!(dispatches(&Sjf, &mut procs, 4), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_sjf_tie_goes_to_lower_slot() {
        let mut procs = table(&[3, 3, 3]);
        assert_eq!(Sjf.pick(&mut procs, 3), 1);
    }

    #[test]
    fn test_sjf_ignores_non_runnable() {
        let mut procs = table(&[5, 2, 8]);
        procs[2].set_state(ProcState::Running);
        assert_eq!(dispatches(&Sjf, &mut procs, 1), vec![5]);
    }

    #[test]
    fn test_hbsjf_round_then_reset() {
        let mut procs = table(&[5, 2, 8]);
        assert_eq!(dispatches(&Hbsjf, &mut procs, 4), vec![2, 5, 8, 2]);
        // 第 4 次派发开启了新一轮，只有 burst 2 的进程带有本轮标记
        let marked: Vec<u32> = procs
            .iter()
            .filter(|p| p.ran_this_round())
            .map(|p| p.burst_time)
            .collect();
        assert_eq!(marked, vec![2]);
    }

    #[test]
    fn test_hbsjf_reset_clears_every_slot() {
        let mut procs = table(&[4, 6]);
        procs[0].flags.insert(ProcFlags::RAN_THIS_ROUND);
        dispatches(&Hbsjf, &mut procs, 3);
        assert!(!procs[0].ran_this_round());
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(PolicyKind::from_name("HBSJF"), Some(PolicyKind::Hbsjf));
        assert_eq!(PolicyKind::from_name("rr"), None);
        for kind in [PolicyKind::Fcfs, PolicyKind::Sjf, PolicyKind::Hbsjf] {
            assert_eq!(kind.build().name(), kind.to_string());
        }
    }
}
