//! The sampler abstraction shared by the system and network collectors.

use crate::error::Result;
use futures_util::stream::{self, BoxStream};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// A periodic metric sampler.
///
/// Implementations read ambient provider state and return one normalized
/// sample per call. [`Sampler::into_stream`] turns a sampler into an endless
/// stream of samples on a fixed interval: the first tick fires immediately,
/// a failed tick is logged and skipped, and because each tick is awaited to
/// completion before the next one starts, a slow tick delays rather than
/// overlaps its successor.
pub trait Sampler: Send + Sized + 'static {
    /// The normalized sample type this sampler produces.
    type Sample: Send + 'static;

    /// Short name used in log lines.
    fn label(&self) -> &'static str;

    /// Take one sample of the current provider state.
    fn sample(&mut self) -> impl Future<Output = Result<Self::Sample>> + Send;

    /// Consume the sampler into a fixed-interval sample stream.
    fn into_stream(self, interval_ms: u64) -> BoxStream<'static, Self::Sample> {
        let mut ticker = time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Box::pin(stream::unfold(
            (self, ticker),
            |(mut sampler, mut ticker)| async move {
                loop {
                    ticker.tick().await;
                    match sampler.sample().await {
                        Ok(sample) => return Some((sample, (sampler, ticker))),
                        Err(err) => {
                            tracing::error!(
                                "{} sampling failed, skipping tick: {err}",
                                sampler.label()
                            );
                        }
                    }
                }
            },
        ))
    }
}
