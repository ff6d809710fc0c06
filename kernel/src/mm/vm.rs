//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 用户地址空间
//!
//! 页表细节不属于进程管理，这里只保留调度与 getProcInfo 关心的大小。

use crate::errno::Errno;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    size: usize,
}

impl AddressSpace {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// 地址空间大小（字节）
    pub fn size(&self) -> usize {
        self.size
    }

    /// 为子进程复制一份地址空间
    pub fn copy(&self) -> Result<AddressSpace, Errno> {
        Ok(Self { size: self.size })
    }
}
