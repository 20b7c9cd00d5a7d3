/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Bounded pool of local ports handed out to publishers in networked mode.

use crate::error::{Error, Result};
use crate::observability::events;
use tracing::{debug, error, warn};

const COMPONENT: &str = "port_pool";

/// Fixed window `[start, start + capacity)` of local ports with a rotating scan cursor.
///
/// The live-allocation count is authoritative: once it reaches the capacity, assignment
/// fails without scanning.
#[derive(Debug)]
pub(crate) struct PortPool {
    start: u16,
    slots: Vec<bool>,
    cursor: usize,
    live: usize,
}

impl PortPool {
    pub(crate) fn new(start: u16, capacity: u16) -> Self {
        // Never hand out ports past u16::MAX.
        let capacity = u32::from(capacity).min(u32::from(u16::MAX) - u32::from(start) + 1);
        Self {
            start,
            slots: vec![false; capacity as usize],
            cursor: 0,
            live: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn assign(&mut self) -> Result<u16> {
        let capacity = self.slots.len();
        if self.live >= capacity {
            warn!(
                event = events::PORT_POOL_EXHAUSTED,
                component = COMPONENT,
                live = self.live,
                capacity,
                "no dynamic port left"
            );
            return Err(Error::MaximumPortExceeded);
        }

        for _ in 0..capacity {
            let index = self.cursor;
            self.cursor = (self.cursor + 1) % capacity;
            if !self.slots[index] {
                self.slots[index] = true;
                self.live += 1;
                let port = self.start + index as u16;
                debug!(
                    event = events::PORT_ASSIGNED,
                    component = COMPONENT,
                    port,
                    live = self.live,
                    "assigned dynamic port"
                );
                return Ok(port);
            }
        }

        error!(
            event = events::PORT_POOL_INCONSISTENT,
            component = COMPONENT,
            live = self.live,
            capacity,
            "live count below capacity but no free slot found"
        );
        Err(Error::UnknownState)
    }

    pub(crate) fn release(&mut self, port: u16) -> Result<()> {
        let slot = port
            .checked_sub(self.start)
            .map(usize::from)
            .and_then(|index| self.slots.get_mut(index));

        match slot {
            Some(used) if *used => {
                *used = false;
                self.live -= 1;
                debug!(
                    event = events::PORT_RELEASED,
                    component = COMPONENT,
                    port,
                    live = self.live,
                    "released dynamic port"
                );
                Ok(())
            }
            _ => {
                warn!(
                    event = events::PORT_RELEASE_REJECTED,
                    component = COMPONENT,
                    port,
                    "port is not assigned"
                );
                Err(Error::ReleaseWrongPort)
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = false);
        self.cursor = 0;
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::PortPool;
    use crate::Error;
    use proptest::prelude::*;

    #[test]
    fn assigns_sequentially_until_exhausted() {
        let mut pool = PortPool::new(4000, 3);

        assert_eq!(pool.assign(), Ok(4000));
        assert_eq!(pool.assign(), Ok(4001));
        assert_eq!(pool.assign(), Ok(4002));
        assert_eq!(pool.assign(), Err(Error::MaximumPortExceeded));
        assert_eq!(pool.live(), 3);
    }

    #[test]
    fn released_port_can_be_reassigned() {
        let mut pool = PortPool::new(4000, 1);

        assert_eq!(pool.assign(), Ok(4000));
        assert_eq!(pool.release(4000), Ok(()));
        assert_eq!(pool.assign(), Ok(4000));
    }

    #[test]
    fn cursor_rotates_past_freed_slots() {
        let mut pool = PortPool::new(4000, 3);

        assert_eq!(pool.assign(), Ok(4000));
        assert_eq!(pool.assign(), Ok(4001));
        assert_eq!(pool.release(4000), Ok(()));
        // Scan continues from the cursor and wraps back to the freed slot.
        assert_eq!(pool.assign(), Ok(4002));
        assert_eq!(pool.assign(), Ok(4000));
    }

    #[test]
    fn release_rejects_unknown_and_double_release() {
        let mut pool = PortPool::new(4000, 2);

        assert_eq!(pool.release(4000), Err(Error::ReleaseWrongPort));
        assert_eq!(pool.release(3999), Err(Error::ReleaseWrongPort));
        assert_eq!(pool.release(5000), Err(Error::ReleaseWrongPort));

        let port = pool.assign().unwrap();
        assert_eq!(pool.release(port), Ok(()));
        assert_eq!(pool.release(port), Err(Error::ReleaseWrongPort));
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn zero_capacity_pool_is_always_exhausted() {
        let mut pool = PortPool::new(4000, 0);
        assert_eq!(pool.assign(), Err(Error::MaximumPortExceeded));
    }

    #[test]
    fn reset_frees_everything() {
        let mut pool = PortPool::new(4000, 2);
        pool.assign().unwrap();
        pool.assign().unwrap();

        pool.reset();

        assert_eq!(pool.live(), 0);
        assert_eq!(pool.assign(), Ok(4000));
    }

    proptest! {
        #[test]
        fn live_count_never_exceeds_capacity(ops in proptest::collection::vec(any::<(bool, u8)>(), 0..200)) {
            let capacity = 8u16;
            let mut pool = PortPool::new(4000, capacity);
            let mut held: Vec<u16> = Vec::new();

            for (assign, pick) in ops {
                if assign {
                    match pool.assign() {
                        Ok(port) => {
                            prop_assert!(!held.contains(&port));
                            held.push(port);
                        }
                        Err(err) => {
                            prop_assert_eq!(err, Error::MaximumPortExceeded);
                            prop_assert_eq!(held.len(), capacity as usize);
                        }
                    }
                } else if !held.is_empty() {
                    let port = held.remove(pick as usize % held.len());
                    prop_assert_eq!(pool.release(port), Ok(()));
                }
                prop_assert!(pool.live() <= capacity as usize);
                prop_assert_eq!(pool.live(), held.len());
            }
        }
    }
}
