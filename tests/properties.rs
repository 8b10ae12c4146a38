//! Property checks over random operation sequences
use lcfs::process::{weight, ProcessState, MAX_NICE, MIN_NICE};
use lcfs::{Pid, ProcessService, SchedConfig};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Fork(usize),
    Exit(usize),
    Wait(usize),
    Sleep(usize, usize),
    Wakeup(usize),
    Kill(usize),
    Nice(usize, i32),
    Schedule,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<usize>().prop_map(Op::Fork),
        2 => any::<usize>().prop_map(Op::Exit),
        2 => any::<usize>().prop_map(Op::Wait),
        1 => (any::<usize>(), 0usize..4).prop_map(|(i, c)| Op::Sleep(i, c)),
        1 => (0usize..4).prop_map(Op::Wakeup),
        1 => any::<usize>().prop_map(Op::Kill),
        1 => (any::<usize>(), MIN_NICE..=MAX_NICE).prop_map(|(i, n)| Op::Nice(i, n)),
        3 => Just(Op::Schedule),
    ]
}

fn live_pids(svc: &ProcessService) -> Vec<Pid> {
    svc.table().live().map(|pcb| pcb.pid).collect()
}

/// Map an arbitrary index onto a live pid
fn target(svc: &ProcessService, idx: usize) -> Pid {
    let pids = live_pids(svc);
    pids[idx % pids.len()]
}

fn apply(svc: &mut ProcessService, op: &Op) {
    match *op {
        Op::Fork(i) => {
            let pid = target(svc, i);
            let _ = svc.fork(pid);
        }
        Op::Exit(i) => {
            let pid = target(svc, i);
            let _ = svc.exit(pid);
        }
        Op::Wait(i) => {
            let pid = target(svc, i);
            let _ = svc.wait(pid);
        }
        Op::Sleep(i, chan) => {
            let pid = target(svc, i);
            let _ = svc.sleep(pid, chan);
        }
        Op::Wakeup(chan) => {
            svc.wakeup(chan);
        }
        Op::Kill(i) => {
            let pid = target(svc, i);
            let _ = svc.kill(pid);
        }
        Op::Nice(i, nice) => {
            let pid = target(svc, i);
            let _ = svc.set_nice(pid, nice);
        }
        Op::Schedule => {
            svc.schedule();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn weight_is_strictly_decreasing(nice in MIN_NICE..MAX_NICE) {
        prop_assert!(weight(nice).unwrap() > weight(nice + 1).unwrap());
    }

    #[test]
    fn weight_rejects_out_of_range(nice in any::<i32>()) {
        prop_assert_eq!(weight(nice).is_ok(), (MIN_NICE..=MAX_NICE).contains(&nice));
    }

    /// Random lifecycle traffic never breaks the table's invariants.
    #[test]
    fn table_invariants_hold(ops in prop::collection::vec(op(), 1..120)) {
        let mut svc = ProcessService::new(SchedConfig::new().with_capacity(6));
        let init = svc.init().unwrap();
        let mut highest = init;

        for op in &ops {
            let before = live_pids(&svc);
            apply(&mut svc, op);
            let after = live_pids(&svc);

            prop_assert!(after.len() <= 6);
            let mut sorted = after.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), after.len(), "duplicate live pid");

            for pid in after.iter().filter(|pid| !before.contains(pid)) {
                prop_assert!(*pid > highest, "pid {} was reused", pid);
                highest = *pid;
            }

            let init_pcb = svc.get_process(init);
            prop_assert!(init_pcb.is_some(), "init was reaped");
            prop_assert_ne!(init_pcb.unwrap().state, ProcessState::Zombie);
        }
    }

    /// Every slice is at least the floor, and unfloored slices never hand
    /// out more than the latency.
    #[test]
    fn timeslices_are_bounded(nices in prop::collection::vec(MIN_NICE..=MAX_NICE, 1..8)) {
        let config = SchedConfig::new().with_capacity(8);
        let mut svc = ProcessService::new(config);
        let init = svc.init().unwrap();
        svc.set_nice(init, nices[0]).unwrap();
        for &nice in &nices[1..] {
            let pid = svc.fork(init).unwrap();
            svc.set_nice(pid, nice).unwrap();
        }

        svc.assign_timeslice();
        let total = svc.total_weight();
        let mut handed_out = 0u64;
        for pcb in svc.table().live() {
            prop_assert!(pcb.timeslice >= config.min_granularity);
            let share = u64::from(config.sched_latency) * u64::from(pcb.weight) / total;
            if share >= u64::from(config.min_granularity) {
                prop_assert_eq!(u64::from(pcb.timeslice), share);
                handed_out += share;
            }
        }
        prop_assert!(handed_out <= u64::from(config.sched_latency));
    }
}
