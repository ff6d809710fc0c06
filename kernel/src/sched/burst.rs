//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 运行时间与时间片簿记
//!
//! burst_time 记录在调用者的**父进程**上：子进程声明的作业长度
//! 用来给父进程排序。根进程没有父进程，设置会失败，读取得到 0。

use std::sync::atomic::Ordering;

use crate::errno::Errno;
use crate::kernel::Kernel;

impl Kernel {
    /// 当前全局时间片
    pub fn time_quantum(&self) -> u32 {
        self.quantum.load(Ordering::Acquire)
    }

    /// 声明作业长度 (set_burst_time)
    ///
    /// 写入父进程的 burst_time；`n` 小于当前时间片时把时间片降到 `n`；
    /// 最后主动让出 CPU，让新的优先级立即生效。
    pub fn set_burst_time(&self, n: i32) -> Result<(), Errno> {
        if n < 1 {
            return Err(Errno::InvalidArgument);
        }
        let n = n as u32;

        {
            let mut ptable = self.ptable.lock();
            let me = self.current();
            let parent = ptable.procs[me].parent.ok_or(Errno::NoSuchProcess)?;
            ptable.procs[parent].burst_time = n;
            log::debug!(
                "set_burst_time: pid {} sets parent pid {} to {}",
                ptable.procs[me].pid,
                ptable.procs[parent].pid,
                n
            );
            self.quantum.fetch_min(n, Ordering::AcqRel);
        }

        self.yield_now();
        Ok(())
    }

    /// 读取父进程的 burst_time (get_burst_time)
    pub fn get_burst_time(&self) -> u32 {
        let ptable = self.ptable.lock();
        let me = self.current();
        ptable.procs[me]
            .parent
            .map_or(0, |parent| ptable.procs[parent].burst_time)
    }

    /// 记一次滴答，返回时间片是否用完 (checkTime)
    ///
    /// running_time 增加后恰为时间片的整数倍时返回 true。
    pub fn check_time(&self) -> bool {
        let running_time = {
            let mut ptable = self.ptable.lock();
            let me = self.current();
            let p = &mut ptable.procs[me];
            p.running_time += 1;
            p.running_time
        };
        running_time % self.time_quantum() == 0
    }
}
