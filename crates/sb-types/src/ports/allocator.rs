//! Local port allocation port.

use crate::errors::BuildError;

/// Hands out loopback ports for external-helper hops.
///
/// Must be collision-free across concurrently running builds.
pub trait PortAllocator: Send + Sync {
    /// Reserve one free loopback port.
    fn allocate(&self) -> Result<u16, BuildError>;

    /// Return a port previously handed out. Default is a no-op.
    fn release(&self, _port: u16) {}
}

/// Fixed sequence allocator, handy for deterministic output.
///
/// Counts upward from `next`; never reuses a port.
#[derive(Debug)]
pub struct SequentialPorts {
    next: std::sync::atomic::AtomicU32,
}

impl SequentialPorts {
    pub fn starting_at(first: u16) -> Self {
        Self {
            next: std::sync::atomic::AtomicU32::new(u32::from(first)),
        }
    }
}

impl PortAllocator for SequentialPorts {
    fn allocate(&self) -> Result<u16, BuildError> {
        let p = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        u16::try_from(p)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| BuildError::PortUnavailable(format!("sequence exhausted at {p}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ports_count_up_and_exhaust() {
        let a = SequentialPorts::starting_at(65534);
        assert_eq!(a.allocate().unwrap(), 65534);
        assert_eq!(a.allocate().unwrap(), 65535);
        assert!(matches!(
            a.allocate(),
            Err(BuildError::PortUnavailable(_))
        ));
    }
}
