//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! burst_time、时间片与信息查询场景测试

mod common;

use burst::{KernelConfig, PolicyKind, ProcessInfo};
use common::{config, run};

#[test]
fn burst_time_is_recorded_on_parent() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        let child = user.fork(|u| {
            assert_eq!(u.set_burst_time(7), 0);
            // 读到的是父进程（init）上的值
            assert_eq!(u.get_burst_time(), 7);
        });
        assert_eq!(user.wait(), child);

        let stats = user.kernel().proc_stats();
        let init = stats.iter().find(|s| s.pid == 1).unwrap();
        assert_eq!(init.name, "initcode");
        assert_eq!(init.burst_time, 7);

        // 根进程没有父进程
        assert_eq!(user.get_burst_time(), 0);
        assert_eq!(user.set_burst_time(3), -1);
    });
}

#[test]
fn child_own_burst_time_is_untouched() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        let child = user.fork(|u| {
            let me = u.getpid() as u32;
            u.set_burst_time(4);
            let stats = u.kernel().proc_stats();
            let own = stats.iter().find(|s| s.pid == me).unwrap();
            assert_eq!(own.burst_time, 0);
        });
        assert_eq!(user.wait(), child);
    });
}

#[test]
fn set_burst_time_rejects_non_positive() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        let child = user.fork(|u| {
            assert_eq!(u.set_burst_time(0), -1);
            assert_eq!(u.set_burst_time(-3), -1);
            assert_eq!(u.get_burst_time(), 0);
        });
        assert_eq!(user.wait(), child);
    });
}

#[test]
fn quantum_only_goes_down() {
    let config = KernelConfig::default()
        .with_policy(PolicyKind::Fcfs)
        .with_time_quantum(10);
    run(config, |user| {
        assert_eq!(user.kernel().time_quantum(), 10);
        let child = user.fork(|u| {
            u.set_burst_time(3);
            assert_eq!(u.kernel().time_quantum(), 3);
            u.set_burst_time(5);
            assert_eq!(u.kernel().time_quantum(), 3);
        });
        assert_eq!(user.wait(), child);
    });
}

#[test]
fn check_time_reports_quantum_expiry() {
    run(config(PolicyKind::Fcfs, 1).with_time_quantum(3), |user| {
        let expired: Vec<bool> = (0..6).map(|_| user.kernel().check_time()).collect();
        assert_eq!(expired, vec![false, false, true, false, false, true]);
    });
}

#[test]
fn proc_queries() {
    run(config(PolicyKind::Fcfs, 2), |user| {
        assert_eq!(user.get_num_proc(), 1);
        assert_eq!(user.get_max_pid(), 1);

        let a = user.fork(|u| {
            u.sleep(1);
        });
        let b = user.fork(|u| {
            u.sleep(1);
        });
        assert_eq!(user.get_num_proc(), 3);
        assert_eq!(user.get_max_pid(), b);

        let mut info = ProcessInfo::default();
        assert_eq!(user.get_proc_info(a, &mut info), 0);
        assert_eq!(info.ppid, 1);
        assert_eq!(info.psize, 4096);
        assert_eq!(user.get_proc_info(999, &mut info), -1);

        assert_eq!(user.pstate(), 1);
        let mut reaped = vec![user.wait(), user.wait()];
        reaped.sort_unstable();
        assert_eq!(reaped, vec![a, b]);
        assert_eq!(user.get_num_proc(), 1);
    });
}
