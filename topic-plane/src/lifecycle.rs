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

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle shared by publishers and subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Status {
    Created = 0,
    Initialized = 1,
    Terminating = 2,
    Initializing = 3,
}

impl Status {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Status::Initialized,
            2 => Status::Terminating,
            3 => Status::Initializing,
            _ => Status::Created,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(Status::Created as u8))
    }

    pub(crate) fn get(&self) -> Status {
        Status::from_raw(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, status: Status) {
        self.0.store(status as u8, Ordering::SeqCst);
    }

    /// Moves from `from` to `to` atomically. Returns `false` if the current status is not `from`.
    pub(crate) fn transition(&self, from: Status, to: Status) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Status, StatusCell};

    #[test]
    fn transition_only_from_expected_status() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), Status::Created);

        assert!(!cell.transition(Status::Initialized, Status::Terminating));
        assert!(cell.transition(Status::Created, Status::Initialized));
        assert!(cell.transition(Status::Initialized, Status::Terminating));
        assert!(!cell.transition(Status::Initialized, Status::Terminating));

        cell.set(Status::Created);
        assert_eq!(cell.get(), Status::Created);
    }

    #[test]
    fn initializing_blocks_a_second_initialize() {
        let cell = StatusCell::new();

        assert!(cell.transition(Status::Created, Status::Initializing));
        assert!(!cell.transition(Status::Created, Status::Initializing));
        assert!(!cell.transition(Status::Initialized, Status::Terminating));
        assert_eq!(cell.get(), Status::Initializing);
    }

    #[test]
    fn only_one_concurrent_terminate_wins() {
        let cell = std::sync::Arc::new(StatusCell::new());
        cell.set(Status::Initialized);

        let winners: usize = (0..8)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.transition(Status::Initialized, Status::Terminating))
            })
            .map(|handle| usize::from(handle.join().unwrap()))
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(cell.get(), Status::Terminating);
    }
}
