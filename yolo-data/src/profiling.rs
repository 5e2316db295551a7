//! The profiling toolkit that can be disabled in compile-time.

#[cfg(feature = "profiling")]
use crate::common::*;
#[cfg(feature = "profiling")]
use std::time::{Duration, Instant};

#[cfg(feature = "profiling")]
#[derive(Debug)]
pub struct Timing {
    name: &'static str,
    instant: Instant,
    elapsed: Vec<(&'static str, Duration)>,
}

#[cfg(not(feature = "profiling"))]
#[derive(Debug)]
pub struct Timing;

impl Timing {
    pub fn new(name: &'static str) -> Self {
        #[cfg(feature = "profiling")]
        {
            Self {
                name,
                instant: Instant::now(),
                elapsed: vec![],
            }
        }

        #[cfg(not(feature = "profiling"))]
        {
            let _ = name;
            Self
        }
    }

    /// Record the time elapsed since the previous record.
    pub fn set_record(&mut self, name: &'static str) {
        #[cfg(feature = "profiling")]
        {
            self.elapsed.push((name, self.instant.elapsed()));
            self.instant = Instant::now();
        }

        #[cfg(not(feature = "profiling"))]
        let _ = name;
    }

    pub fn report(&self) {
        #[cfg(feature = "profiling")]
        {
            let total: Duration = self.elapsed.iter().map(|(_, elapsed)| *elapsed).sum();
            debug!("profiling report for '{}', total {:?}", self.name, total);
            self.elapsed.iter().for_each(|(name, elapsed)| {
                debug!("- {}\t{:?}", name, elapsed);
            });
        }
    }
}
