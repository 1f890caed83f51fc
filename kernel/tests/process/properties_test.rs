/*!
 * Property Tests
 * Table invariants under random create/terminate/schedule sequences
 */

use proc_core::{
    BlockManager, EntryPoint, Pid, Priority, ProcessError, ProcessManager, ProcessState,
    RecordingSwitch, SwitchOutcome,
};
use proptest::prelude::*;
use std::collections::HashSet;

const STACK: usize = 64 * 1024;

#[derive(Debug, Clone)]
enum Op {
    Create(u8),
    /// Terminate the n-th live user process (modulo the live count)
    Terminate(usize),
    TerminateUnknown(Pid),
    Schedule,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u8>().prop_map(Op::Create),
        2 => any::<usize>().prop_map(Op::Terminate),
        1 => (10_000u32..20_000).prop_map(Op::TerminateUnknown),
        3 => Just(Op::Schedule),
    ]
}

fn manager(capacity: usize) -> (ProcessManager, BlockManager, RecordingSwitch) {
    let memory = BlockManager::with_capacity(capacity * STACK);
    let switch = RecordingSwitch::new();
    let pm = ProcessManager::builder()
        .with_capacity(capacity)
        .with_memory_manager(memory.clone())
        .with_switch(switch.clone())
        .build()
        .unwrap();
    (pm, memory, switch)
}

fn user_pids(pm: &ProcessManager) -> Vec<Pid> {
    pm.list().iter().map(|p| p.pid).filter(|&pid| pid != 0).collect()
}

fn check_table(pm: &ProcessManager, memory: &BlockManager) -> Result<(), TestCaseError> {
    let list = pm.list();

    let pids: HashSet<Pid> = list.iter().map(|p| p.pid).collect();
    prop_assert_eq!(pids.len(), list.len(), "duplicate live pid in {:?}", list);
    prop_assert!(pids.contains(&0), "kernel missing");

    let running: Vec<Pid> = list
        .iter()
        .filter(|p| p.state == ProcessState::Running)
        .map(|p| p.pid)
        .collect();
    prop_assert_eq!(running, vec![pm.current_id()]);

    prop_assert_eq!(memory.outstanding_bytes(), (list.len() - 1) * STACK);
    prop_assert!(list.iter().all(|p| p.state != ProcessState::Unused));
    prop_assert!(list.windows(2).all(|w| w[0].slot < w[1].slot));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every reachable table has unique ids, one running process and no
    /// leaked stacks.
    #[test]
    fn random_operations_keep_table_consistent(
        capacity in 2usize..10,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let (pm, memory, switch) = manager(capacity);

        for op in ops {
            match op {
                Op::Create(tag) => {
                    let before = pm.list();
                    let name = format!("p{}", tag);
                    match pm.create(&name, EntryPoint::new(0x1000), Priority::Normal) {
                        Ok(pid) => {
                            prop_assert_eq!(pm.get(pid).unwrap().state, ProcessState::Ready)
                        }
                        Err(ProcessError::ResourceExhausted { capacity: c }) => {
                            prop_assert_eq!(c, capacity);
                            prop_assert_eq!(before.len(), capacity);
                            prop_assert_eq!(pm.list(), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected create error: {}", e),
                    }
                }
                Op::Terminate(n) => {
                    let users = user_pids(&pm);
                    if !users.is_empty() {
                        let victim = users[n % users.len()];
                        let was_current = pm.current_id() == victim;
                        let outcome = pm.terminate(victim).unwrap();
                        prop_assert!(!pm.contains(victim));
                        prop_assert_eq!(outcome.is_some(), was_current);
                        prop_assert_ne!(pm.current_id(), victim);
                    }
                }
                Op::TerminateUnknown(pid) => {
                    let before = pm.list();
                    let current = pm.current_id();
                    prop_assert_eq!(pm.terminate(pid), Ok(None));
                    prop_assert_eq!(pm.list(), before);
                    prop_assert_eq!(pm.current_id(), current);
                }
                Op::Schedule => {
                    let ready = pm.list().iter().filter(|p| p.state == ProcessState::Ready).count();
                    let outcome = pm.schedule().unwrap();
                    prop_assert_eq!(outcome.is_idle(), ready == 0);
                }
            }
            check_table(&pm, &memory)?;
        }

        // The last switch target is the running process
        if let Some(last) = switch.last() {
            prop_assert_eq!(last.to, pm.current_id());
        }
    }

    /// k ready processes each run at least once in k consecutive switches.
    #[test]
    fn round_robin_visits_every_ready_process(k in 1usize..12, warmup in 0usize..20) {
        let (pm, _, switch) = manager(k + 1);
        for i in 0..k {
            pm.create(&format!("w{}", i), EntryPoint::new(0x1000), Priority::Normal).unwrap();
        }
        for _ in 0..warmup {
            pm.schedule().unwrap();
        }

        // k user processes plus the kernel: k ready at any moment
        let ready: HashSet<Pid> = pm
            .list()
            .iter()
            .filter(|p| p.state == ProcessState::Ready)
            .map(|p| p.pid)
            .collect();
        prop_assert_eq!(ready.len(), k);

        let start = switch.len();
        for _ in 0..k {
            let outcome = pm.schedule().unwrap();
            prop_assert!(
                matches!(outcome, SwitchOutcome::Switched { .. }),
                "expected Switched, got {:?}",
                outcome
            );
        }
        let visited: HashSet<Pid> = switch.targets()[start..].iter().copied().collect();
        prop_assert_eq!(visited, ready);
    }

    /// Creating then terminating a process leaves the allocator as it was.
    #[test]
    fn create_terminate_does_not_leak(prefill in 0usize..6, schedules in 0usize..5) {
        let (pm, memory, _) = manager(8);
        for i in 0..prefill {
            pm.create(&format!("bg{}", i), EntryPoint::new(0x1000), Priority::Low).unwrap();
        }
        for _ in 0..schedules {
            pm.schedule().unwrap();
        }

        let before = memory.outstanding_bytes();
        let pid = pm.create("late", EntryPoint::new(0x2000), Priority::High).unwrap();
        pm.terminate(pid).unwrap();
        prop_assert_eq!(memory.outstanding_bytes(), before);
    }

    /// Names longer than the limit are cut on a character boundary.
    #[test]
    fn names_are_bounded(name in "\\PC{0,80}") {
        let (pm, _, _) = manager(2);
        let pid = pm.create(&name, EntryPoint::new(0x1000), Priority::Normal).unwrap();
        let stored = pm.get(pid).unwrap().name;
        prop_assert!(stored.len() <= 32);
        prop_assert!(name.starts_with(stored.as_str()));
    }
}
