//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 回收子进程 (wait)

use crate::errno::Errno;
use crate::kernel::Kernel;

use super::proc::{Channel, Pid, ProcState};

impl Kernel {
    /// 等待任一子进程退出并回收它，返回其 pid
    ///
    /// 没有子进程返回 `NoChild`；调用者已被 kill 返回 `Interrupted`。
    pub fn wait(&self) -> Result<Pid, Errno> {
        let mut ptable = self.ptable.lock();
        let me = self.current();

        loop {
            let mut havekids = false;
            let mut reaped = None;

            for slot in 0..ptable.procs.len() {
                let p = &mut ptable.procs[slot];
                if p.parent != Some(me) {
                    continue;
                }
                havekids = true;
                if p.state() != ProcState::Zombie {
                    continue;
                }

                let pid = p.pid;
                let kstack = p.kstack.take();
                let vm = p.vm.take();
                p.clear_identity();
                p.clear_counters();
                p.set_state(ProcState::Unused);
                reaped = Some((pid, kstack, vm));
                break;
            }

            if let Some((pid, kstack, vm)) = reaped {
                drop(ptable);
                if let Some(stack) = kstack {
                    self.kstacks.free(stack);
                }
                drop(vm);
                log::debug!("wait: reaped pid {}", pid);
                return Ok(pid);
            }

            if !havekids {
                return Err(Errno::NoChild);
            }
            if ptable.procs[me].killed() {
                return Err(Errno::Interrupted);
            }

            // 子进程 exit 时唤醒
            ptable = self.sleep_locked(Channel::Proc(me), ptable);
        }
    }
}
