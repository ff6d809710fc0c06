//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程间同步场景测试：退避互斥锁、自旋锁、睡眠/唤醒

mod common;

use std::sync::Arc;

use burst::process::Channel;
use burst::{BackoffMutex, PolicyKind, SpinLock};
use common::{config, run};

const N: u64 = 200;

#[test]
fn backoff_mutex_serializes_processes() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        let counter = Arc::new(BackoffMutex::new(0u64));
        for _ in 0..2 {
            let counter = counter.clone();
            user.fork(move |u| {
                for _ in 0..N {
                    let mut value = counter.lock(u);
                    let seen = *value;
                    // 持锁期间让出 CPU，另一方只能退避
                    u.yield_now();
                    *value = seen + 1;
                }
            });
        }
        assert!(user.wait() > 0);
        assert!(user.wait() > 0);
        assert_eq!(*counter.lock(user), 2 * N);
    });
}

#[test]
fn spinlock_serializes_processes() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        let counter = Arc::new(SpinLock::new("counter", 0u64));
        for _ in 0..2 {
            let counter = counter.clone();
            user.fork(move |u| {
                for i in 0..N {
                    *counter.lock() += 1;
                    if i % 16 == 0 {
                        u.yield_now();
                    }
                }
            });
        }
        assert!(user.wait() > 0);
        assert!(user.wait() > 0);
        assert_eq!(*counter.lock(), 2 * N);
    });
}

#[test]
fn no_lost_wakeups_in_ping_pong() {
    const ROUNDS: u64 = 500;
    run(config(PolicyKind::Fcfs, 2), |user| {
        let turn = Arc::new(SpinLock::new("turn", 0u64));
        for side in 0..2u64 {
            let turn = turn.clone();
            user.fork(move |u| {
                let kernel = u.kernel();
                let chan = Channel::of(&*turn);
                for _ in 0..ROUNDS {
                    let mut t = turn.lock();
                    while *t % 2 != side {
                        t = kernel.sleep(chan, t);
                    }
                    *t += 1;
                    kernel.wakeup(chan);
                }
            });
        }
        assert!(user.wait() > 0);
        assert!(user.wait() > 0);
        assert_eq!(*turn.lock(), 2 * ROUNDS);
    });
}
