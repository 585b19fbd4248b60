use ndarray_linalg::c64;
use std::sync::{Arc, Barrier, Mutex};

/// Blocking collective summation across the fixed group of worker processes.
/// Every member contributes a buffer of identical length, every member leaves
/// the call holding the element-wise sum. Broadcast is expressed as summation
/// with all non-owning members contributing zeros. All members must reach the
/// same reduction at the same logical step or the group stalls; there is no
/// timeout or cancellation.
pub trait ProcessGroup: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn sum_f64(&self, buffer: &mut [f64]);

    fn sum_scalar(&self, value: f64) -> f64 {
        let mut buf = [value];
        self.sum_f64(&mut buf);
        buf[0]
    }

    fn sum_count(&self, value: usize) -> usize {
        self.sum_scalar(value as f64).round() as usize
    }

    fn sum_c64(&self, buffer: &mut [c64]) {
        let mut re: Vec<f64> = buffer.iter().map(|v| v.re).collect();
        let mut im: Vec<f64> = buffer.iter().map(|v| v.im).collect();
        self.sum_f64(&mut re);
        self.sum_f64(&mut im);
        for (v, (re, im)) in buffer.iter_mut().zip(re.iter().zip(im.iter())) {
            *v = c64::new(*re, *im);
        }
    }
}

/// Role assignment within the group: exactly one propagator, exactly one
/// diagonalizer, every member a replica contributor. With a single process
/// all roles collapse onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub propagator: bool,
    pub diagonalizer: bool,
    pub replica: usize,
}

impl Roles {
    pub fn assign(group: &dyn ProcessGroup) -> Roles {
        let rank = group.rank();
        if group.size() == 1 {
            Roles {
                propagator: true,
                diagonalizer: true,
                replica: 0,
            }
        } else {
            Roles {
                propagator: rank == 0,
                diagonalizer: rank == 1,
                replica: rank,
            }
        }
    }
}

/// A group of one: every reduction is the identity.
pub struct SerialGroup;

impl ProcessGroup for SerialGroup {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn sum_f64(&self, _buffer: &mut [f64]) {}
}

struct ThreadGroupShared {
    barrier: Barrier,
    accumulator: Mutex<Vec<f64>>,
}

/// In-process group backed by a barrier and a shared accumulator, one member
/// per thread. Mirrors the blocking all-reduce semantics of the inter-process
/// collectives and is used to exercise the coordinator logic in tests.
pub struct ThreadGroup {
    shared: Arc<ThreadGroupShared>,
    rank: usize,
    size: usize,
}

impl ThreadGroup {
    /// Create all members of a group of `size`. Each member is handed to its
    /// own thread.
    pub fn create(size: usize) -> Vec<ThreadGroup> {
        assert!(size > 0, "empty process group");
        let shared = Arc::new(ThreadGroupShared {
            barrier: Barrier::new(size),
            accumulator: Mutex::new(Vec::new()),
        });
        (0..size)
            .map(|rank| ThreadGroup {
                shared: shared.clone(),
                rank,
                size,
            })
            .collect()
    }
}

impl ProcessGroup for ThreadGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn sum_f64(&self, buffer: &mut [f64]) {
        {
            let mut acc = self.shared.accumulator.lock().unwrap();
            if acc.len() != buffer.len() {
                assert!(acc.is_empty(), "mismatched reduction lengths");
                acc.resize(buffer.len(), 0.0);
            }
            for (a, b) in acc.iter_mut().zip(buffer.iter()) {
                *a += *b;
            }
        }
        // everyone has contributed
        self.shared.barrier.wait();
        {
            let acc = self.shared.accumulator.lock().unwrap();
            buffer.copy_from_slice(&acc);
        }
        // everyone has read the result
        let token = self.shared.barrier.wait();
        if token.is_leader() {
            self.shared.accumulator.lock().unwrap().clear();
        }
        self.shared.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn serial_group_is_identity() {
        let group = SerialGroup;
        let mut buf = [1.0, -2.5, 3.0];
        group.sum_f64(&mut buf);
        assert_eq!(buf, [1.0, -2.5, 3.0]);
        assert_eq!(group.sum_count(3), 3);
    }

    #[test]
    fn roles_collapse_for_single_process() {
        let roles = Roles::assign(&SerialGroup);
        assert!(roles.propagator && roles.diagonalizer);
        assert_eq!(roles.replica, 0);
    }

    #[test]
    fn thread_group_all_reduce() {
        let members = ThreadGroup::create(3);
        let handles: Vec<_> = members
            .into_iter()
            .map(|group| {
                thread::spawn(move || {
                    let rank = group.rank();
                    // three consecutive reductions, as in a real step
                    let mut buf = vec![rank as f64, 1.0];
                    group.sum_f64(&mut buf);
                    assert_eq!(buf, vec![3.0, 3.0]);
                    let total = group.sum_scalar(0.5);
                    assert!((total - 1.5).abs() < 1e-12);
                    let count = group.sum_count((rank == 1) as usize);
                    assert_eq!(count, 1);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn thread_group_broadcast_by_summation() {
        let members = ThreadGroup::create(2);
        let handles: Vec<_> = members
            .into_iter()
            .map(|group| {
                thread::spawn(move || {
                    // only rank 0 owns the data, the other contributes zeros
                    let mut buf = if group.rank() == 0 {
                        vec![c64::new(1.0, -1.0)]
                    } else {
                        vec![c64::new(0.0, 0.0)]
                    };
                    group.sum_c64(&mut buf);
                    assert_eq!(buf[0], c64::new(1.0, -1.0));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
