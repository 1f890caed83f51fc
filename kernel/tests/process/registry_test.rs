/*!
 * Process Registry Tests
 * Creation, lookup, termination and listing through the shared manager
 */

use pretty_assertions::assert_eq;
use proc_core::{
    BlockManager, EntryPoint, Priority, ProcessError, ProcessManager, ProcessState,
    RecordingSwitch,
};

const ENTRY: EntryPoint = EntryPoint::new(0x40_0000);

fn manager(capacity: usize) -> (ProcessManager, BlockManager, RecordingSwitch) {
    let memory = BlockManager::with_capacity(capacity * 64 * 1024);
    let switch = RecordingSwitch::new();
    let pm = ProcessManager::builder()
        .with_capacity(capacity)
        .with_memory_manager(memory.clone())
        .with_switch(switch.clone())
        .build()
        .unwrap();
    (pm, memory, switch)
}

#[test]
fn test_boot_lists_only_kernel() {
    let (pm, _, _) = manager(4);
    let list = pm.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].pid, 0);
    assert_eq!(list[0].name, "kernel");
    assert_eq!(list[0].state, ProcessState::Running);
    assert_eq!(list[0].priority, Priority::Kernel);
    assert!(list[0].stack.is_none());
}

#[test]
fn test_create_assigns_sequential_ids() {
    let (pm, _, _) = manager(4);
    assert_eq!(pm.create("A", ENTRY, Priority::Normal), Ok(1));
    assert_eq!(pm.create("B", ENTRY, Priority::Normal), Ok(2));

    let b = pm.get(2).unwrap();
    assert_eq!(b.name, "B");
    assert_eq!(b.state, ProcessState::Ready);
    assert_eq!(b.parent_pid, 0);
    assert_eq!(b.slot, 2);
    assert_eq!(b.entry_point, ENTRY);
}

#[test]
fn test_new_process_context_points_into_its_stack() {
    let (pm, _, _) = manager(2);
    let pid = pm.create("A", ENTRY, Priority::Normal).unwrap();
    let snap = pm.get(pid).unwrap();
    let stack = snap.stack.unwrap();

    assert!(stack.contains(snap.stack_pointer));
    assert_eq!(snap.stack_pointer % 16, 0);
    assert_eq!(snap.stack_pointer, stack.top() - 128);

    pm.with_registry(|reg| {
        let pcb = reg.get(pid).unwrap();
        let stack = pcb.stack().unwrap();
        assert_eq!(stack.read_word(stack.top() - 8), Some(ENTRY.address() as u64));
        assert_eq!(pcb.context().instruction_pointer(), ENTRY.address());
    });
}

#[test]
fn test_exhaustion_leaves_table_unchanged() {
    let (pm, memory, _) = manager(3);
    pm.create("A", ENTRY, Priority::Normal).unwrap();
    pm.create("B", ENTRY, Priority::Normal).unwrap();
    let before = pm.list();
    let bytes = memory.outstanding_bytes();

    assert_eq!(
        pm.create("C", ENTRY, Priority::Normal),
        Err(ProcessError::ResourceExhausted { capacity: 3 })
    );
    assert_eq!(pm.list(), before);
    assert_eq!(memory.outstanding_bytes(), bytes);
}

#[test]
fn test_out_of_memory_rolls_back() {
    let memory = BlockManager::with_capacity(64 * 1024);
    let pm = ProcessManager::builder()
        .with_capacity(4)
        .with_memory_manager(memory.clone())
        .build()
        .unwrap();

    pm.create("A", ENTRY, Priority::Normal).unwrap();
    let err = pm.create("B", ENTRY, Priority::Normal).unwrap_err();
    assert!(matches!(err, ProcessError::OutOfMemory { .. }));
    assert_eq!(pm.len(), 2);
    assert_eq!(pm.stats().created, 1);

    // The slot B would have used is still free
    pm.terminate(1).unwrap();
    let c = pm.create("C", ENTRY, Priority::Normal).unwrap();
    assert_eq!(pm.get(c).unwrap().slot, 1);
}

#[test]
fn test_terminate_unknown_is_noop() {
    let (pm, _, switch) = manager(4);
    pm.create("A", ENTRY, Priority::Normal).unwrap();
    let before = pm.list();

    assert_eq!(pm.terminate(42), Ok(None));
    assert_eq!(pm.list(), before);
    assert_eq!(pm.current_id(), 0);
    assert!(switch.is_empty());
}

#[test]
fn test_terminate_kernel_is_refused() {
    let (pm, _, _) = manager(2);
    assert_eq!(pm.terminate(0), Err(ProcessError::KernelProcess));
    assert_eq!(pm.current().unwrap().pid, 0);
}

#[test]
fn test_terminated_process_disappears() {
    let (pm, memory, _) = manager(4);
    let pid = pm.create("A", ENTRY, Priority::Normal).unwrap();
    pm.terminate(pid).unwrap();

    assert_eq!(pm.get(pid), Err(ProcessError::NotFound(pid)));
    assert!(!pm.contains(pid));
    assert_eq!(memory.outstanding_bytes(), 0);
    assert_eq!(pm.stats().terminated, 1);
}

#[test]
fn test_list_is_in_slot_order() {
    let (pm, _, _) = manager(5);
    let a = pm.create("A", ENTRY, Priority::Normal).unwrap();
    pm.create("B", ENTRY, Priority::Normal).unwrap();
    pm.create("C", ENTRY, Priority::Normal).unwrap();
    pm.terminate(a).unwrap();
    let d = pm.create("D", ENTRY, Priority::Normal).unwrap();

    let names: Vec<String> = pm.list().iter().map(|p| p.name.to_string()).collect();
    assert_eq!(names, vec!["kernel", "D", "B", "C"]);
    assert_eq!(pm.get(d).unwrap().slot, 1);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let (pm, _, _) = manager(2);
    pm.create("A", ENTRY, Priority::High).unwrap();
    let json = serde_json::to_value(pm.list()).unwrap();
    assert_eq!(json[1]["name"], "A");
    assert_eq!(json[1]["pid"], 1);
}
