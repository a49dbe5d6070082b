//! Terminal consumers.
//!
//! Each consumer walks the probe ladder from cheapest to universal (count,
//! contiguous view, bulk copy, pull) and never re-issues a cheaper probe
//! after falling back, so a stage is never partially re-enumerated.
//!
//! The bulk-copy probe takes an initialized destination, so it belongs to
//! [`copy_into`]; materialization sizes its vector with the count probe and
//! fills it from the view probe or the pull path.

use crate::error::{Error, Result};
use crate::stage::Stage;

/// Materialize a stage into a `Vec`.
pub(crate) fn to_vec<S>(mut stage: S) -> Result<Vec<S::Item>>
where
    S: Stage,
    S::Item: Clone,
{
    drain_to_vec(&mut stage)
}

/// Materialize through a mutable borrow; the single probe ladder behind
/// [`to_vec`] and the ordering stage's own buffering.
pub(crate) fn drain_to_vec<S>(stage: &mut S) -> Result<Vec<S::Item>>
where
    S: Stage,
    S::Item: Clone,
{
    let hint = stage.try_count();
    if let Some(slice) = stage.try_as_slice() {
        return Ok(slice.to_vec());
    }
    let mut out = Vec::with_capacity(hint.unwrap_or(0));
    while let Some(item) = stage.try_next()? {
        out.push(item);
    }
    Ok(out)
}

/// Count elements, preferring the count probe.
pub(crate) fn count<S: Stage>(mut stage: S) -> Result<usize> {
    if let Some(n) = stage.try_count() {
        return Ok(n);
    }
    let mut n = 0;
    while stage.try_next()?.is_some() {
        n += 1;
    }
    Ok(n)
}

/// Copy the full result into `dest`, returning the element count written.
pub(crate) fn copy_into<S>(mut stage: S, dest: &mut [S::Item]) -> Result<usize>
where
    S: Stage,
    S::Item: Clone,
{
    let known = stage.try_count();
    if let Some(need) = known {
        if dest.len() < need {
            return Err(Error::DestinationTooSmall {
                need,
                have: dest.len(),
            });
        }
    }

    if let Some(slice) = stage.try_as_slice() {
        let n = slice.len();
        if dest.len() < n {
            return Err(Error::DestinationTooSmall {
                need: n,
                have: dest.len(),
            });
        }
        dest[..n].clone_from_slice(slice);
        return Ok(n);
    }

    if let Some(n) = known {
        if stage.try_copy_into(&mut dest[..n])? {
            return Ok(n);
        }
    }

    let mut written = 0;
    while let Some(item) = stage.try_next()? {
        if written == dest.len() {
            return Err(Error::DestinationTooSmall {
                need: written + 1,
                have: dest.len(),
            });
        }
        dest[written] = item;
        written += 1;
    }
    Ok(written)
}
