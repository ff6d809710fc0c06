//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 打开的文件对象

use std::sync::Arc;

#[derive(Debug)]
pub struct File {
    name: String,
}

impl File {
    pub fn open(name: &str) -> Arc<File> {
        Arc::new(Self { name: name.to_string() })
    }

    /// 控制台设备
    pub fn console() -> Arc<File> {
        Self::open("console")
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 复制文件句柄
pub fn filedup(file: &Arc<File>) -> Arc<File> {
    Arc::clone(file)
}
