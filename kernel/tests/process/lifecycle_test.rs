/*!
 * Lifecycle Tests
 * Stack ownership across create/terminate churn and id reuse
 */

use pretty_assertions::assert_eq;
use proc_core::{
    BlockManager, ConfigError, EntryPoint, KernelConfig, MemoryInfo, Pid, Priority,
    ProcessError, ProcessManager,
};
use std::collections::HashSet;

#[test]
fn test_create_terminate_returns_every_byte() {
    let memory = BlockManager::with_capacity(8 * 64 * 1024);
    let pm = ProcessManager::builder()
        .with_capacity(8)
        .with_memory_manager(memory.clone())
        .build()
        .unwrap();

    for round in 0..50 {
        let before = memory.outstanding_bytes();
        let pid = pm
            .create(&format!("r{}", round), EntryPoint::new(0x1000), Priority::Normal)
            .unwrap();
        assert_eq!(memory.outstanding_bytes(), before + 64 * 1024);
        pm.terminate(pid).unwrap();
        assert_eq!(memory.outstanding_bytes(), before);
    }
    assert_eq!(memory.stats().used_memory, 0);
    assert_eq!(memory.stats().peak_memory, 64 * 1024);
}

#[test]
fn test_full_table_churn_with_scheduling() {
    let memory = BlockManager::with_capacity(4 * 64 * 1024);
    let pm = ProcessManager::builder()
        .with_capacity(5)
        .with_memory_manager(memory.clone())
        .build()
        .unwrap();

    let mut live: Vec<Pid> = (0..4)
        .map(|i| pm.create(&format!("p{}", i), EntryPoint::new(0x1000), Priority::Normal).unwrap())
        .collect();
    assert!(matches!(
        pm.create("extra", EntryPoint::new(0x1000), Priority::Normal),
        Err(ProcessError::ResourceExhausted { capacity: 5 })
    ));

    for step in 0..40 {
        pm.schedule().unwrap();
        if step % 3 == 0 {
            let victim = live.remove(0);
            pm.terminate(victim).unwrap();
            let pid = pm
                .create(&format!("s{}", step), EntryPoint::new(0x2000), Priority::Low)
                .unwrap();
            live.push(pid);
        }

        let running: Vec<_> = pm
            .list()
            .into_iter()
            .filter(|p| p.state == proc_core::ProcessState::Running)
            .collect();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].pid, pm.current_id());
    }

    for pid in live {
        pm.terminate(pid).unwrap();
    }
    assert_eq!(pm.len(), 1);
    assert_eq!(memory.outstanding_bytes(), 0);
    assert_eq!(memory.outstanding_regions(), 0);
}

#[test]
fn test_ids_are_not_reused_while_counter_advances() {
    let pm = ProcessManager::builder()
        .with_config(KernelConfig::minimal(3))
        .build()
        .unwrap();
    let mut seen = HashSet::new();
    for _ in 0..20 {
        let pid = pm.create("again", EntryPoint::new(0x1000), Priority::Normal).unwrap();
        assert!(seen.insert(pid), "pid {} handed out twice", pid);
        pm.terminate(pid).unwrap();
    }
}

#[test]
fn test_wraparound_skips_kernel_and_live_ids() {
    let pm = ProcessManager::builder()
        .with_capacity(4)
        .with_first_pid(Pid::MAX)
        .build()
        .unwrap();
    let last = pm.create("last", EntryPoint::new(0x10), Priority::Normal).unwrap();
    let wrapped = pm.create("wrapped", EntryPoint::new(0x10), Priority::Normal).unwrap();
    assert_eq!(last, Pid::MAX);
    assert_eq!(wrapped, 1);
}

#[test]
fn test_child_records_parent() {
    let pm = ProcessManager::builder().with_capacity(4).build().unwrap();
    let parent = pm.create("parent", EntryPoint::new(0x10), Priority::Normal).unwrap();
    pm.schedule().unwrap();
    let child = pm.create("child", EntryPoint::new(0x20), Priority::Normal).unwrap();
    assert_eq!(pm.get(child).unwrap().parent_pid, parent);
    assert_eq!(pm.get(parent).unwrap().parent_pid, 0);
}

#[test]
fn test_created_at_follows_scheduling_clock() {
    let pm = ProcessManager::builder().with_capacity(4).build().unwrap();
    let early = pm.create("early", EntryPoint::new(0x10), Priority::Normal).unwrap();
    pm.schedule().unwrap();
    pm.schedule().unwrap();
    let late = pm.create("late", EntryPoint::new(0x10), Priority::Normal).unwrap();
    assert_eq!(pm.get(early).unwrap().created_at, 0);
    assert_eq!(pm.get(late).unwrap().created_at, 2);
}

#[test]
fn test_zero_block_size_fails_to_build() {
    let config = KernelConfig {
        block_size: 0,
        ..KernelConfig::default()
    };
    let err = ProcessManager::builder().with_config(config).build().unwrap_err();
    match err {
        ConfigError::InvalidValue { key, .. } => assert_eq!(key, "block_size"),
        other => panic!("unexpected error: {:?}", other),
    }

    let zero_blocks = BlockManager::with_geometry(16, 0);
    let err = ProcessManager::builder()
        .with_capacity(4)
        .with_memory_manager(zero_blocks)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
