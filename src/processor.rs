// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which processor the render is being driven from.  Purely
//! informational; nothing in the pipeline depends on it.

use std::fmt;

/// A snapshot of the processor the calling thread runs on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcessorInfo {
    /// The core the calling thread was on when probed, where the
    /// platform can say.
    pub cpu: Option<usize>,
    /// Logical processors available.
    pub logical: usize,
    /// Physical cores available.
    pub physical: usize,
}

impl ProcessorInfo {
    /// Looks at the machine once.
    pub fn probe() -> ProcessorInfo {
        ProcessorInfo {
            cpu: current_cpu(),
            logical: num_cpus::get(),
            physical: num_cpus::get_physical(),
        }
    }
}

impl fmt::Display for ProcessorInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cpu {
            Some(cpu) => write!(f, "cpu {}", cpu)?,
            None => write!(f, "cpu unknown")?,
        }
        write!(f, " ({} logical, {} physical)", self.logical, self.physical)
    }
}

#[cfg(target_os = "linux")]
fn current_cpu() -> Option<usize> {
    // SAFETY: sched_getcpu takes no arguments and reads or writes no
    // memory of ours. It reports failure by returning -1.
    let cpu = unsafe { libc::sched_getcpu() };
    if cpu < 0 {
        None
    } else {
        Some(cpu as usize)
    }
}

#[cfg(not(target_os = "linux"))]
fn current_cpu() -> Option<usize> {
    None
}
