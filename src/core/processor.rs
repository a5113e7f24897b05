//! Processor trait and the bundled implementations

use crate::core::error::Result;
use crate::core::item::WorkItem;
use std::fmt;
use std::thread;
use std::time::Duration;

/// The processing function a worker runs for every dequeued item.
///
/// One processor instance is shared by the whole pool, so `process` takes
/// `&self` and may be called from several workers at once.
pub trait Processor<P>: Send + Sync {
    /// Process one item on behalf of `worker_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the item could not be processed. The worker logs
    /// the failure and drops the item; it is never retried.
    fn process(&self, worker_id: usize, item: &WorkItem<P>) -> Result<()>;

    /// Name used in log lines and debug output
    fn name(&self) -> &str {
        "Processor"
    }
}

impl<P> fmt::Debug for dyn Processor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processor({})", self.name())
    }
}

/// Helper to create a processor from a closure
pub struct ClosureProcessor<F> {
    closure: F,
    name: String,
}

impl<F> ClosureProcessor<F> {
    /// Create a new closure processor
    pub fn new<P>(closure: F) -> Self
    where
        F: Fn(usize, &WorkItem<P>) -> Result<()> + Send + Sync,
    {
        Self {
            closure,
            name: "ClosureProcessor".to_string(),
        }
    }

    /// Create a new closure processor with a custom name
    pub fn with_name<P, S: Into<String>>(closure: F, name: S) -> Self
    where
        F: Fn(usize, &WorkItem<P>) -> Result<()> + Send + Sync,
    {
        Self {
            closure,
            name: name.into(),
        }
    }
}

impl<P, F> Processor<P> for ClosureProcessor<F>
where
    F: Fn(usize, &WorkItem<P>) -> Result<()> + Send + Sync,
{
    fn process(&self, worker_id: usize, item: &WorkItem<P>) -> Result<()> {
        (self.closure)(worker_id, item)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Latency model of a [`SimulatedProcessor`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Latency {
    /// Return immediately
    #[default]
    None,
    /// Sleep for a fixed duration
    Fixed(Duration),
    /// Sleep for a duration drawn uniformly from `min..=max`
    Uniform {
        /// Shortest delay
        min: Duration,
        /// Longest delay
        max: Duration,
    },
}

impl Latency {
    /// Draw the delay for one item
    pub fn sample(&self) -> Duration {
        match *self {
            Latency::None => Duration::ZERO,
            Latency::Fixed(delay) => delay,
            Latency::Uniform { min, max } if max <= min => min,
            Latency::Uniform { min, max } => {
                let lo = min.as_micros() as u64;
                let hi = max.as_micros() as u64;
                Duration::from_micros(fastrand::u64(lo..=hi))
            }
        }
    }
}

/// Stand-in for an inference backend: sleeps for the configured latency and
/// logs which worker handled which item.
#[derive(Clone, Debug, Default)]
pub struct SimulatedProcessor {
    latency: Latency,
}

impl SimulatedProcessor {
    /// Create a processor with the given latency model
    pub fn new(latency: Latency) -> Self {
        Self { latency }
    }

    /// Processor with a fixed per-item latency
    pub fn fixed(delay: Duration) -> Self {
        Self::new(Latency::Fixed(delay))
    }

    /// Latency model in use
    pub fn latency(&self) -> Latency {
        self.latency
    }
}

impl<P> Processor<P> for SimulatedProcessor {
    fn process(&self, worker_id: usize, item: &WorkItem<P>) -> Result<()> {
        let delay = self.latency.sample();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        log::trace!(
            "simulated processing of item {} on worker {} took {:?}",
            item.id(),
            worker_id,
            delay
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "SimulatedProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DispatchError;
    use std::time::Instant;

    #[test]
    fn test_closure_processor() {
        let processor = ClosureProcessor::new(|_worker: usize, item: &WorkItem<u32>| {
            if *item.payload() == 0 {
                Err(DispatchError::processing(item.id(), "zero payload"))
            } else {
                Ok(())
            }
        });

        assert_eq!(Processor::<u32>::name(&processor), "ClosureProcessor");
        assert!(processor.process(0, &WorkItem::new(1, 5)).is_ok());
        assert!(processor.process(0, &WorkItem::new(2, 0)).is_err());
    }

    #[test]
    fn test_closure_processor_with_name() {
        let processor = ClosureProcessor::with_name(|_: usize, _: &WorkItem<()>| Ok(()), "echo");
        assert!(Processor::<()>::process(&processor, 1, &WorkItem::new(0, ())).is_ok());
        assert_eq!(Processor::<()>::name(&processor), "echo");
    }

    #[test]
    fn test_latency_sampling() {
        assert_eq!(Latency::None.sample(), Duration::ZERO);

        let fixed = Latency::Fixed(Duration::from_millis(3));
        assert_eq!(fixed.sample(), Duration::from_millis(3));

        let uniform = Latency::Uniform {
            min: Duration::from_millis(1),
            max: Duration::from_millis(4),
        };
        for _ in 0..100 {
            let delay = uniform.sample();
            assert!(delay >= Duration::from_millis(1));
            assert!(delay <= Duration::from_millis(4));
        }

        let inverted = Latency::Uniform {
            min: Duration::from_millis(5),
            max: Duration::from_millis(2),
        };
        assert_eq!(inverted.sample(), Duration::from_millis(5));
    }

    #[test]
    fn test_simulated_processor_sleeps() {
        let processor = SimulatedProcessor::fixed(Duration::from_millis(20));
        let start = Instant::now();
        processor
            .process(3, &WorkItem::new(1, "request"))
            .expect("simulated processing never fails");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
