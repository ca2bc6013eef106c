//! Sequencing primitives
//!
//! Two generic combinators over collections of fallible asynchronous units.
//! Both complete exactly once with either every result or the first error.
//! Futures are lazy, so `run_in_order` never constructs work for a unit it
//! does not reach.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Drive all units concurrently
///
/// Results come back in input index order regardless of completion order.
/// The first unit to fail ends the call with that error; units still in
/// flight are dropped and their outcomes discarded. An empty input resolves
/// immediately with an empty result list.
pub async fn run_all<I, F, T, E>(units: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut in_flight = FuturesUnordered::new();
    for (index, unit) in units.into_iter().enumerate() {
        in_flight.push(async move { (index, unit.await) });
    }

    let mut slots: Vec<Option<T>> = Vec::new();
    slots.resize_with(in_flight.len(), || None);

    while let Some((index, outcome)) = in_flight.next().await {
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(error) => return Err(error),
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| slot.expect("slot filled when its unit resolved"))
        .collect())
}

/// Drive units strictly one at a time
///
/// Unit N+1 starts only after unit N succeeds. The first failure ends the
/// call with that error; results accumulated so far are discarded. An empty
/// input resolves immediately with an empty result list.
pub async fn run_in_order<I, F, T, E>(units: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut results = Vec::new();
    for unit in units {
        results.push(unit.await?);
    }
    Ok(results)
}
