//! In-process rank group: each rank is a thread and collectives meet at a
//! shared rendezvous.

use super::Communicator;
use std::any::Any;
use std::panic;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

/// Panic payload of a rank released from a collective because another rank
/// panicked.
#[derive(Debug)]
struct RankAborted;

struct Slots {
    data: Vec<Vec<f64>>,
    arrived: usize,
    generation: u64,
    aborted: bool,
}

struct Exchange {
    size: usize,
    slots: Mutex<Slots>,
    turn: Condvar,
}

impl Exchange {
    fn slots(&self) -> MutexGuard<'_, Slots> {
        // a panicking rank poisons the lock; the data is still consistent
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until all ranks arrive, or panic once the group is aborted.
    fn wait(&self) {
        let mut slots = self.slots();
        if slots.aborted {
            drop(slots);
            panic::panic_any(RankAborted);
        }
        let generation = slots.generation;
        slots.arrived += 1;
        if slots.arrived == self.size {
            slots.arrived = 0;
            slots.generation += 1;
            self.turn.notify_all();
            return;
        }
        while slots.generation == generation && !slots.aborted {
            slots = self
                .turn
                .wait(slots)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if slots.generation == generation {
            drop(slots);
            panic::panic_any(RankAborted);
        }
    }

    fn abort(&self) {
        self.slots().aborted = true;
        self.turn.notify_all();
    }
}

/// Aborts the group when its rank unwinds.
struct AbortOnPanic<'a>(&'a Exchange);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// One rank of an in-process group created by [`ThreadComm::group`].
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Exchange>,
}

impl ThreadComm {
    /// Create the communicators of a group of `size` ranks. Each one must be
    /// moved to its own thread before any collective is called.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let size = size.max(1);
        let shared = Arc::new(Exchange {
            size,
            slots: Mutex::new(Slots {
                data: vec![Vec::new(); size],
                arrived: 0,
                generation: 0,
                aborted: false,
            }),
            turn: Condvar::new(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Publish `local` and return the contributions of all ranks.
    fn exchange(&self, local: Vec<f64>) -> Vec<Vec<f64>> {
        self.shared.slots().data[self.rank] = local;
        self.shared.wait();
        let all = self.shared.slots().data.clone();
        // nobody may overwrite a slot before every rank has read it
        self.shared.wait();
        all
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&self, buf: &mut [f64]) {
        let all = self.exchange(buf.to_vec());
        for (i, value) in buf.iter_mut().enumerate() {
            *value = all.iter().map(|contribution| contribution[i]).sum();
        }
    }

    fn all_gather_varcount(&self, local: &[f64], counts: &[usize]) -> Vec<f64> {
        debug_assert_eq!(counts[self.rank], local.len());
        self.exchange(local.to_vec()).concat()
    }

    fn all_gather_count(&self, value: usize) -> Vec<usize> {
        // the bit pattern travels unchanged through the f64 slot
        self.exchange(vec![f64::from_bits(value as u64)])
            .iter()
            .map(|slot| slot[0].to_bits() as usize)
            .collect()
    }
}

/// Run `task` on `size` ranks, one thread each, and collect the per-rank
/// results in rank order.
///
/// A panic on any rank releases the ranks waiting in a collective and is
/// re-raised on the caller with its original payload.
pub fn run_ranks<T, F>(size: usize, task: F) -> Vec<T>
where
    T: Send,
    F: Fn(&ThreadComm) -> T + Sync,
{
    let comms = ThreadComm::group(size);
    let task = &task;
    let joined: Vec<thread::Result<T>> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let _guard = AbortOnPanic(&comm.shared);
                    task(&comm)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    let mut failures: Vec<Box<dyn Any + Send>> = Vec::new();
    let mut results = Vec::with_capacity(joined.len());
    for outcome in joined {
        match outcome {
            Ok(value) => results.push(value),
            Err(payload) => failures.push(payload),
        }
    }
    if !failures.is_empty() {
        let first = failures
            .iter()
            .position(|payload| !payload.is::<RankAborted>())
            .unwrap_or(0);
        panic::resume_unwind(failures.swap_remove(first));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_collectives_stay_in_step() {
        let results = run_ranks(4, |comm| {
            let mut total = 0.0;
            for round in 0..50 {
                let mut buf = [(comm.rank() * round) as f64];
                comm.all_reduce_sum(&mut buf);
                total += buf[0];
            }
            total
        });
        // sum over rounds of round * (0 + 1 + 2 + 3)
        assert!(results.iter().all(|&t| t == 6.0 * 1225.0));
    }

    #[test]
    #[should_panic(expected = "rank 1 gave up")]
    fn test_panic_releases_waiting_ranks() {
        run_ranks(3, |comm| {
            if comm.rank() == 1 {
                panic!("rank 1 gave up");
            }
            let mut buf = [1.0];
            comm.all_reduce_sum(&mut buf);
            buf[0]
        });
    }

    #[test]
    fn test_group_of_one() {
        let results = run_ranks(0, |comm| {
            let mut buf = [2.5];
            comm.all_reduce_sum(&mut buf);
            (comm.size(), buf[0])
        });
        assert_eq!(results, vec![(1, 2.5)]);
    }
}
