//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核打印宏
//!
//! `kprint!`/`kprintln!` 先在本地格式化整行，再一次性交给控制台。

use core::fmt;
use crate::console;

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    console::write_str(&std::fmt::format(args));
}

#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => ({
        $crate::print::_print(::core::format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! kprintln {
    () => ($crate::kprint!("\n"));
    ($($arg:tt)*) => ({
        $crate::print::_print(::core::format_args!("{}\n", ::core::format_args!($($arg)*)));
    });
}
