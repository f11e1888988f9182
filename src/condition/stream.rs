//! Subscription driver
//!
//! Turns a stream of telemetry into a stream of aggregates by feeding each datum
//! through the criterion's streaming path, one at a time and in arrival order.

use futures::stream::{Stream, StreamExt};

use super::criterion::TelemetryCriterion;
use crate::telemetry::{Datum, Result};

/// Evaluate every datum of `data` against the criterion's known sources.
///
/// The stream ends when `data` ends or the criterion is retired.
pub fn subscribe<'a, S>(
    criterion: &'a mut TelemetryCriterion,
    data: S,
) -> impl Stream<Item = Result<bool>> + 'a
where
    S: Stream<Item = Datum> + 'a,
{
    let retired = criterion.retire_handle().token().cancelled_owned();
    data.take_until(retired)
        .map(move |datum| criterion.observe(&datum))
}
