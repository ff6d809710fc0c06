//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程退出与 kill

use crate::errno::Errno;
use crate::kernel::Kernel;

use super::proc::{Channel, Pid, ProcFlags, ProcState};

impl Kernel {
    /// 终止当前进程 (exit)
    ///
    /// 进程成为僵尸，直到父进程在 wait 中回收。不会返回。
    pub fn exit(&self) -> ! {
        let me = self.current();
        let init = self.ptable.init_slot();
        if Some(me) == init {
            panic!("init exiting");
        }

        // 在锁外关闭所有文件、释放工作目录
        let (files, cwd) = {
            let mut ptable = self.ptable.lock();
            let p = &mut ptable.procs[me];
            let files: Vec<_> = p.ofile.iter_mut().filter_map(Option::take).collect();
            (files, p.cwd.take())
        };
        drop(files);
        drop(cwd);

        let mut ptable = self.ptable.lock();
        let p = &ptable.procs[me];
        let (pid, parent) = (p.pid, p.parent);

        // 父进程可能正睡在 wait 中
        if let Some(parent) = parent {
            ptable.wakeup1(Channel::Proc(parent));
        }

        // 孤儿交给 init
        if let Some(init) = init {
            let mut zombie_orphan = false;
            for p in ptable.procs.iter_mut() {
                if p.parent == Some(me) {
                    p.parent = Some(init);
                    zombie_orphan |= p.state() == ProcState::Zombie;
                }
            }
            if zombie_orphan {
                ptable.wakeup1(Channel::Proc(init));
            }
        }

        ptable.procs[me].set_state(ProcState::Zombie);
        log::debug!("exit: pid {} is a zombie", pid);
        self.sched_exit(ptable)
    }

    /// 当前进程是否已被 kill
    pub fn killed(&self) -> bool {
        let ptable = self.ptable.lock();
        ptable.procs[self.current()].killed()
    }

    /// 标记进程 `pid` 为已被 kill (kill)
    ///
    /// 睡眠中的进程被提前唤醒，以便尽快看到标记；真正的退出发生在
    /// 它下一次返回用户态的途中。
    pub fn kill(&self, pid: Pid) -> Result<(), Errno> {
        let mut ptable = self.ptable.lock();
        let slot = ptable.find(pid).ok_or(Errno::NoSuchProcess)?;
        let p = &mut ptable.procs[slot];
        p.flags.insert(ProcFlags::KILLED);
        if p.state() == ProcState::Sleeping {
            p.set_state(ProcState::Runnable);
        }
        log::debug!("kill: pid {}", pid);
        Ok(())
    }
}
