//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程创建
//!
//! - `userinit`: 创建根进程
//! - `fork`: 复制当前进程
//!
//! 两者都先经 [`Kernel::allocate`] 拿到 Embryo 槽位，在锁外准备
//! 地址空间，最后持锁填好 PCB 并置为 Runnable。

use std::sync::Arc;

use crate::errno::Errno;
use crate::fs::file::filedup;
use crate::fs::inode::idup;
use crate::fs::{File, Inode};
use crate::kernel::Kernel;
use crate::mm::{AddressSpace, PAGE_SIZE};

use super::proc::{Pid, ProcState, Program};
use super::table::TableGuard;

impl Kernel {
    /// 创建根进程 (userinit)
    ///
    /// 根进程没有父进程，是所有孤儿的新父进程。
    pub fn userinit(self: &Arc<Self>, program: Program) -> Result<Pid, Errno> {
        let slot = self.allocate()?;

        let mut ptable = self.ptable.lock();
        let p = &mut ptable.procs[slot];
        p.name = "initcode".to_string();
        p.parent = None;
        p.vm = Some(AddressSpace::new(PAGE_SIZE));
        p.tf.sp = PAGE_SIZE;
        p.tf.epc = 0;
        p.cwd = Some(Inode::root());
        let console = File::console();
        for fd in p.ofile.iter_mut().take(3) {
            *fd = Some(filedup(&console));
        }
        p.program = Some(program);
        p.set_state(ProcState::Runnable);
        let pid = p.pid;
        drop(ptable);

        self.ptable.set_init(slot);
        log::info!("userinit: pid {} in slot {}", pid, slot);
        Ok(pid)
    }

    /// 复制当前进程 (fork)
    ///
    /// 子进程运行 `program`，看到的返回值寄存器为 0；父进程得到子进程 pid。
    pub fn fork(self: &Arc<Self>, program: Program) -> Result<Pid, Errno> {
        let me = self.current();
        let slot = self.allocate()?;

        let vm = {
            let ptable = self.ptable.lock();
            ptable.procs[me].vm.clone()
        };
        let vm = match vm.as_ref().map(AddressSpace::copy).transpose() {
            Ok(vm) => vm,
            Err(err) => {
                self.abandon(slot);
                return Err(err);
            }
        };

        let mut ptable = self.ptable.lock();
        let (tf, ofile, cwd, name) = {
            let parent = &ptable.procs[me];
            let ofile: Vec<_> = parent
                .ofile
                .iter()
                .map(|fd| fd.as_ref().map(filedup))
                .collect();
            (
                parent.tf,
                ofile,
                parent.cwd.as_ref().map(idup),
                parent.name.clone(),
            )
        };

        let child = &mut ptable.procs[slot];
        child.vm = vm;
        child.parent = Some(me);
        child.tf = tf;
        // 子进程中 fork 返回 0
        child.tf.a0 = 0;
        child.ofile = ofile;
        child.cwd = cwd;
        child.name = name;
        child.program = Some(program);
        child.set_state(ProcState::Runnable);
        let pid = child.pid;
        log::debug!("fork: pid {} -> child pid {}", ptable.procs[me].pid, pid);
        Ok(pid)
    }

    /// 放弃一个尚未启动的 Embryo 槽位，pid 不回收
    fn abandon(&self, slot: usize) {
        let mut ptable: TableGuard<'_> = self.ptable.lock();
        let p = &mut ptable.procs[slot];
        let kstack = p.kstack.take();
        p.clear_identity();
        p.set_state(ProcState::Unused);
        drop(ptable);
        if let Some(stack) = kstack {
            self.kstacks.free(stack);
        }
    }
}
