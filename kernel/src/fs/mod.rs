//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 文件系统接口
//!
//! 进程管理只持有引用计数句柄：fork 时复制，exit 时丢弃。

pub mod file;
pub mod inode;

pub use file::File;
pub use inode::Inode;
