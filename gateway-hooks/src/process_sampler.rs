//! Point-in-time process/system sampling used by the global process
//! pressure hook. Backed by `sysinfo` in production so the hook never
//! shells out to `ps`/`top` itself.

use sysinfo::System;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSample {
    pub continue_process_count: u32,
    pub opencode_process_count: u32,
    pub max_rss_mb: u64,
}

pub trait ProcessSampler: Send + Sync {
    fn sample(&self) -> ProcessSample;
}

pub struct SystemProcessSampler;

impl SystemProcessSampler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProcessSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSampler for SystemProcessSampler {
    fn sample(&self) -> ProcessSample {
        let mut system = System::new_all();
        system.refresh_all();

        let mut continue_process_count = 0u32;
        let mut opencode_process_count = 0u32;
        let mut max_rss_mb = 0u64;

        for process in system.processes().values() {
            let name = process.name().to_string_lossy().to_lowercase();
            if name.contains("continue") {
                continue_process_count += 1;
            }
            if name.contains("opencode") {
                opencode_process_count += 1;
            }
            let rss_mb = process.memory() / (1024 * 1024);
            max_rss_mb = max_rss_mb.max(rss_mb);
        }

        ProcessSample {
            continue_process_count,
            opencode_process_count,
            max_rss_mb,
        }
    }
}

#[cfg(test)]
pub use test_support::FakeProcessSampler;

#[cfg(test)]
mod test_support {
    use super::{ProcessSample, ProcessSampler};
    use std::sync::Mutex;

    pub struct FakeProcessSampler {
        sample: Mutex<ProcessSample>,
    }

    impl FakeProcessSampler {
        pub fn new(sample: ProcessSample) -> Self {
            Self {
                sample: Mutex::new(sample),
            }
        }

        pub fn set(&self, sample: ProcessSample) {
            *self.sample.lock().unwrap() = sample;
        }
    }

    impl ProcessSampler for FakeProcessSampler {
        fn sample(&self) -> ProcessSample {
            *self.sample.lock().unwrap()
        }
    }
}
