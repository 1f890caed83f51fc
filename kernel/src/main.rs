/*!
 * Process Core Kernel - Main Entry Point
 *
 * Boots the process registry on a simulated CPU and drives it from a
 * periodic timer, the way a timer interrupt would on hardware:
 * - Configuration from the environment (`KERNEL_*`, `KERNEL_CONFIG`)
 * - Stacks from the block allocator
 * - One scheduling point per tick until Ctrl+C or `KERNEL_DEMO_TICKS`
 */

use std::error::Error;
use tracing::{error, info, warn, Instrument};

use proc_core::monitoring::{span_operation, span_tick};
use proc_core::{
    init_tracing, BlockManager, EntryPoint, KernelConfig, MemoryInfo, Priority, ProcessError,
    ProcessManager, SimulatedCpu, SwitchOutcome,
};

/// Ticks to run before shutting down on its own; 0 runs until Ctrl+C
const DEMO_TICKS_ENV: &str = "KERNEL_DEMO_TICKS";

fn demo_shell() {}
fn demo_logger() {}
fn demo_worker() {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    info!("Process core kernel starting...");

    let config = match KernelConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e.clone()));
            return Err(e.into());
        }
    };
    let max_ticks: u64 = std::env::var(DEMO_TICKS_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);

    info!("Initializing block allocator...");
    let memory_manager = BlockManager::from_config(&config);

    info!("Initializing process manager on simulated CPU...");
    let cpu = SimulatedCpu::new();
    let process_manager = match ProcessManager::builder()
        .with_config(config.clone())
        .with_memory_manager(memory_manager.clone())
        .with_switch(cpu.clone())
        .build()
    {
        Ok(pm) => pm,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e.clone()));
            return Err(e.into());
        }
    };

    let demo: [(&str, fn(), Priority); 3] = [
        ("shell", demo_shell, Priority::High),
        ("logger", demo_logger, Priority::Low),
        ("worker", demo_worker, Priority::Normal),
    ];
    let mut worker = None;
    for (name, entry, priority) in demo {
        match process_manager.create(name, EntryPoint::from(entry), priority) {
            Ok(pid) => {
                if name == "worker" {
                    worker = Some(pid);
                }
            }
            Err(e) => warn!(name, error = %e, "Could not start demo process"),
        }
    }

    let mut interval = tokio::time::interval(config.tick_interval());
    let mut tick: u64 = 0;

    info!(
        tick_ms = config.tick_interval_ms,
        max_ticks, "Scheduler running. Press Ctrl+C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            _ = interval.tick() => {
                tick += 1;
                let outcome = run_tick(&process_manager, &cpu)
                    .instrument(span_tick(tick))
                    .await;
                match outcome {
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => {
                        error!(error = %e, "Fatal scheduler error, aborting");
                        std::process::abort();
                    }
                    Err(e) => warn!(error = %e, "Scheduling point failed"),
                }

                // Let the worker finish halfway through the run
                if tick == max_ticks / 2 {
                    if let Some(pid) = worker.take() {
                        let _span = span_operation("terminate", pid).entered();
                        match process_manager.terminate(pid) {
                            Ok(_) => {}
                            Err(e) if e.is_fatal() => {
                                error!(pid, error = %e, "Fatal error terminating worker, aborting");
                                std::process::abort();
                            }
                            Err(e) => warn!(pid, error = %e, "Could not terminate worker"),
                        }
                    }
                }

                if max_ticks != 0 && tick >= max_ticks {
                    break;
                }
            }
        }
    }

    let stats = process_manager.stats();
    info!(
        ticks = stats.ticks,
        context_switches = stats.context_switches,
        idle_ticks = stats.idle_ticks,
        live = stats.live_processes,
        "Scheduler stopped"
    );
    let memory = memory_manager.stats();
    info!(
        used = memory.used_memory,
        peak = memory.peak_memory,
        "Stack memory at shutdown"
    );

    println!("{}", process_manager.table());
    Ok(())
}

/// One simulated timer interrupt: the running process does some work, then
/// the scheduler picks who runs next
async fn run_tick(pm: &ProcessManager, cpu: &SimulatedCpu) -> Result<SwitchOutcome, ProcessError> {
    cpu.execute(|regs| regs.rax = regs.rax.wrapping_add(1));
    let outcome = pm.schedule()?;
    if let SwitchOutcome::Switched { from, to } = outcome {
        tracing::debug!(from, to, "Timer preempted process");
    }
    Ok(outcome)
}
