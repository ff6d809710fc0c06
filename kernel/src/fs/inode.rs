//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 索引节点句柄

use std::sync::Arc;

#[derive(Debug)]
pub struct Inode {
    path: String,
}

impl Inode {
    pub fn lookup(path: &str) -> Arc<Inode> {
        Arc::new(Self { path: path.to_string() })
    }

    /// 根目录
    pub fn root() -> Arc<Inode> {
        Self::lookup("/")
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// 增加引用
pub fn idup(inode: &Arc<Inode>) -> Arc<Inode> {
    Arc::clone(inode)
}
