//! Loopback port allocator for helper hops.
//!
//! Asks the OS for a free ephemeral port and remembers every port handed out,
//! so two builds running at the same time never receive the same one even if
//! the OS recycles it before the helper binds.

use parking_lot::Mutex;
use sb_types::ports::PortAllocator;
use sb_types::BuildError;
use std::collections::HashSet;
use std::net::{Ipv4Addr, TcpListener};

/// Probes before giving up.
const MAX_ATTEMPTS: usize = 64;

#[derive(Debug, Default)]
pub struct LoopbackPortAllocator {
    handed_out: Mutex<HashSet<u16>>,
}

impl LoopbackPortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ports currently handed out.
    pub fn in_use(&self) -> usize {
        self.handed_out.lock().len()
    }

    fn probe() -> Result<u16, BuildError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .map_err(|e| BuildError::PortUnavailable(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| BuildError::PortUnavailable(e.to_string()))?
            .port();
        Ok(port)
    }
}

impl PortAllocator for LoopbackPortAllocator {
    fn allocate(&self) -> Result<u16, BuildError> {
        for _ in 0..MAX_ATTEMPTS {
            let port = Self::probe()?;
            if self.handed_out.lock().insert(port) {
                tracing::trace!(port, "loopback port allocated");
                return Ok(port);
            }
        }
        Err(BuildError::PortUnavailable(format!(
            "no unused port after {MAX_ATTEMPTS} probes"
        )))
    }

    fn release(&self, port: u16) {
        self.handed_out.lock().remove(&port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn ports_are_unique_and_releasable() {
        let a = LoopbackPortAllocator::new();
        let p1 = a.allocate().unwrap();
        let p2 = a.allocate().unwrap();
        assert_ne!(p1, p2);
        assert_ne!(p1, 0);
        assert_eq!(a.in_use(), 2);
        a.release(p1);
        assert_eq!(a.in_use(), 1);
    }

    #[test]
    fn concurrent_allocation_never_collides() {
        let a = Arc::new(LoopbackPortAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let a = Arc::clone(&a);
                std::thread::spawn(move || (0..4).map(|_| a.allocate().unwrap()).collect::<Vec<_>>())
            })
            .collect();
        let mut all = HashSet::new();
        for h in handles {
            for p in h.join().unwrap() {
                assert!(all.insert(p), "duplicate port {p}");
            }
        }
        assert_eq!(all.len(), 32);
    }
}
