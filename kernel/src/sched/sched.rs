//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 调度器实现
//!
//! 每个 CPU 运行一个永不返回的调度循环：开中断，获取进程表锁，
//! 按槽位顺序扫描，每遇到 Runnable 进程就由策略选出一个派发，
//! 派发后从被派发槽位的下一个继续扫描。整轮扫描结束才释放锁。
//!
//! 进程表锁在上下文切换时“转交”：调度循环持锁切换到进程，
//! 进程从 [`Kernel::sched`] 返回后由进程自己释放；进程再次进入
//! `sched` 前必须重新持锁并已把自己的状态改离 Running。

use std::mem::ManuallyDrop;
use std::sync::Arc;

use crate::arch::context::{context_switch, Context};
use crate::arch::cpu;
use crate::kernel::Kernel;
use crate::process::{Program, ProcState, TableGuard};

impl Kernel {
    /// 调度循环 (scheduler)
    ///
    /// 机器关机后返回。
    pub fn scheduler(&self, cpu_index: usize) {
        let cpu = &self.cpus[cpu_index];
        cpu.set_proc(None);
        log::info!("cpu{}: scheduler starting, policy {}", cpu.id(), self.policy.name());

        loop {
            // 开中断：让时钟中断有机会投递
            cpu::enable_irq();
            self.clock_interrupt();
            if self.is_halted() {
                break;
            }

            let mut dispatched = false;
            let mut ptable = self.ptable.lock();
            let mut scan = 0;
            while scan < ptable.procs.len() {
                if ptable.procs[scan].state() != ProcState::Runnable {
                    scan += 1;
                    continue;
                }

                let chosen = self.policy.pick(&mut ptable.procs, scan);
                let to = {
                    let p = &mut ptable.procs[chosen];
                    cpu.set_proc(Some(chosen));
                    p.switch_count += 1;
                    p.set_state(ProcState::Running);
                    log::trace!("cpu{}: dispatch pid {} ({})", cpu.id(), p.pid, p.name);
                    p.kstack
                        .as_ref()
                        .map(|stack| stack.context())
                        .unwrap_or_else(|| panic!("dispatch pid {} without kernel stack", p.pid))
                };

                context_switch(cpu.context(), &to);

                // 进程已把状态改离 Running 并重新持锁后才会回到这里
                cpu.set_proc(None);
                dispatched = true;
                scan = chosen + 1;
            }
            drop(ptable);

            if !dispatched {
                cpu::wfi();
            }
        }

        cpu::disable_irq();
        log::info!("cpu{}: scheduler stopped", cpu.id());
    }

    fn check_sched(&self, ptable: &TableGuard<'_>, me: usize) {
        if !self.ptable.holding() {
            panic!("sched ptable.lock");
        }
        if cpu::this_cpu().ncli() != 1 {
            panic!("sched locks");
        }
        if ptable.procs[me].state() == ProcState::Running {
            panic!("sched running");
        }
        if cpu::irq_enabled() {
            panic!("sched interruptible");
        }
    }

    /// 回到调度循环 (sched)
    ///
    /// 调用者必须只持有进程表锁，并已把自己的状态改离 Running。
    /// 返回时锁仍然持有，可能已经换了一个 CPU。
    pub(crate) fn sched<'a>(&self, ptable: TableGuard<'a>) -> TableGuard<'a> {
        let me = self.current();
        self.check_sched(&ptable, me);

        // intena 属于这个内核执行流，而不是这个 CPU
        let intena = cpu::this_cpu().intena();
        let from = self.kernel_context(&ptable, me);
        let to = cpu::cpu_id();
        context_switch(&from, self.cpus[to].context());
        cpu::this_cpu().set_intena(intena);
        ptable
    }

    /// 僵尸进程最后一次回到调度循环
    ///
    /// 内核栈被父进程回收时线程在切换点展开，守卫不会被析构。
    pub(crate) fn sched_exit(&self, ptable: TableGuard<'_>) -> ! {
        let me = self.current();
        self.check_sched(&ptable, me);

        let from = self.kernel_context(&ptable, me);
        let _ptable = ManuallyDrop::new(ptable);
        let to = cpu::cpu_id();
        context_switch(&from, self.cpus[to].context());
        panic!("zombie exit");
    }

    fn kernel_context(&self, ptable: &TableGuard<'_>, slot: usize) -> Arc<Context> {
        let p = &ptable.procs[slot];
        p.kstack
            .as_ref()
            .map(|stack| stack.context())
            .unwrap_or_else(|| panic!("pid {} has no kernel stack", p.pid))
    }

    /// 主动让出 CPU (yield)
    pub fn yield_now(&self) {
        self.clock_interrupt();
        let mut ptable = self.ptable.lock();
        let me = self.current();
        ptable.procs[me].set_state(ProcState::Runnable);
        let ptable = self.sched(ptable);
        drop(ptable);
    }

    /// 新进程第一次被调度 (forkret)
    ///
    /// 接管并释放调度循环加的进程表锁，取出要运行的程序。
    pub(crate) fn forkret(&self) -> Program {
        let me = self.current();
        let mut ptable = unsafe { self.ptable.adopt() };
        let p = &mut ptable.procs[me];
        let program = p
            .program
            .take()
            .unwrap_or_else(|| panic!("forkret: pid {} has no program", p.pid));
        log::trace!("forkret: pid {} first run", p.pid);
        drop(ptable);
        program
    }

    /// 进程的程序执行完毕
    ///
    /// 根进程的程序返回即关机；其余进程等同于调用 exit。
    pub(crate) fn program_returned(&self) -> ! {
        let me = self.current();
        if Some(me) == self.ptable.init_slot() {
            self.power_off();
            cpu::halt_unwind();
        }
        self.exit()
    }
}
