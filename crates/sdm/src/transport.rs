//! Transport bookkeeping: keeping the global super-droplet array sorted by
//! gridbox index and the per-gridbox spans consistent with it.
//!
//! The global array is sorted non-decreasing by `gbx_index` (ties broken by
//! droplet id so a deterministic sort gives a deterministic permutation).
//! The union of all gridbox spans covers exactly the in-domain prefix;
//! out-of-domain droplets sort to a trailing segment no span references.

use crate::errors::SdmError;
use crate::gridbox::Gridbox;
use crate::superdrop::Superdrop;

/// Stable sort of the global array by `(gbx_index, id)`. The
/// outside-domain sentinel is the maximum index, so inert droplets that
/// left the domain end up in the trailing segment.
pub fn sort_supers(supers: &mut [Superdrop]) {
    supers.sort_by(|a, b| {
        a.gbx_index
            .cmp(&b.gbx_index)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// True if the array is sorted non-decreasing by gridbox index.
pub fn is_sorted(supers: &[Superdrop]) -> bool {
    supers.windows(2).all(|w| w[0].gbx_index <= w[1].gbx_index)
}

/// Rebuild every gridbox's span by binary-searching the sorted global
/// array for the first and one-past-last droplet with its index.
pub fn set_spans(gridboxes: &mut [Gridbox], supers: &[Superdrop]) -> Result<(), SdmError> {
    if !is_sorted(supers) {
        return Err(SdmError::Invariant(
            "cannot set spans: global super-droplet array is not sorted by gridbox index".into(),
        ));
    }

    for gbx in gridboxes.iter_mut() {
        let begin = supers.partition_point(|d| d.gbx_index < gbx.index);
        let end = supers.partition_point(|d| d.gbx_index <= gbx.index);
        gbx.span = begin..end;
    }
    Ok(())
}

/// Check the central data-structure invariant: every droplet inside a
/// gridbox's span carries that gridbox's index.
pub fn check_spans(gridboxes: &[Gridbox], supers: &[Superdrop]) -> Result<(), SdmError> {
    for gbx in gridboxes {
        if gbx.span.end > supers.len() {
            return Err(SdmError::Invariant(format!(
                "gridbox {} span {:?} exceeds array length {}",
                gbx.index,
                gbx.span,
                supers.len()
            )));
        }
        if let Some(bad) = supers[gbx.span.clone()]
            .iter()
            .find(|d| d.gbx_index != gbx.index)
        {
            return Err(SdmError::Invariant(format!(
                "droplet {} with gridbox index {} found in span of gridbox {}",
                bad.id, bad.gbx_index, gbx.index
            )));
        }
    }
    Ok(())
}

/// Split the global array into one mutable slice per gridbox span, in
/// gridbox order, so that per-gridbox kernels can run in parallel on
/// disjoint droplets.
pub fn disjoint_spans<'a>(
    gridboxes: &[Gridbox],
    supers: &'a mut [Superdrop],
) -> Result<Vec<&'a mut [Superdrop]>, SdmError> {
    let total = supers.len();
    let mut out = Vec::with_capacity(gridboxes.len());
    let mut rest = supers;
    let mut offset = 0usize;

    for gbx in gridboxes {
        if gbx.span.start < offset || gbx.span.end > total || gbx.span.start > gbx.span.end {
            return Err(SdmError::Invariant(format!(
                "gridbox {} span {:?} overlaps a previous span or exceeds the array",
                gbx.index, gbx.span
            )));
        }
        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(gbx.span.start - offset);
        let (span, tail) = tail.split_at_mut(gbx.span.len());
        out.push(span);
        rest = tail;
        offset = gbx.span.end;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridbox::State;
    use crate::superdrop::{SoluteProperties, OUTSIDE_DOMAIN};

    fn drop_in(gbx: u32, id: u64) -> Superdrop {
        Superdrop::new(
            gbx,
            0.5,
            0.5,
            0.5,
            1,
            10.0,
            1e-9,
            SoluteProperties::default(),
            id,
        )
    }

    fn gridboxes(n: u32) -> Vec<Gridbox> {
        (0..n)
            .map(|i| Gridbox::new(i, State::new(1.0, 1.0, 1.0, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_sort_orders_by_index_then_id() {
        let mut supers = vec![drop_in(2, 0), drop_in(0, 3), drop_in(0, 1), drop_in(1, 2)];
        sort_supers(&mut supers);
        let order: Vec<(u32, u64)> = supers.iter().map(|d| (d.gbx_index, d.id)).collect();
        assert_eq!(order, vec![(0, 1), (0, 3), (1, 2), (2, 0)]);
        assert!(is_sorted(&supers));
    }

    #[test]
    fn test_spans_cover_in_domain_prefix() {
        let mut supers = vec![
            drop_in(1, 0),
            drop_in(0, 1),
            drop_in(OUTSIDE_DOMAIN, 2),
            drop_in(1, 3),
        ];
        let mut gbxs = gridboxes(3);
        sort_supers(&mut supers);
        set_spans(&mut gbxs, &supers).unwrap();

        assert_eq!(gbxs[0].span, 0..1);
        assert_eq!(gbxs[1].span, 1..3);
        assert_eq!(gbxs[2].span, 3..3); // empty gridbox
        check_spans(&gbxs, &supers).unwrap();

        // out-of-domain droplet trails beyond every span
        assert_eq!(supers[3].gbx_index, OUTSIDE_DOMAIN);
    }

    #[test]
    fn test_set_spans_rejects_unsorted() {
        let supers = vec![drop_in(1, 0), drop_in(0, 1)];
        let mut gbxs = gridboxes(2);
        let err = set_spans(&mut gbxs, &supers).unwrap_err();
        assert!(matches!(err, SdmError::Invariant(_)));
    }

    #[test]
    fn test_check_spans_detects_mismatch() {
        let mut supers = vec![drop_in(0, 0), drop_in(1, 1)];
        let mut gbxs = gridboxes(2);
        sort_supers(&mut supers);
        set_spans(&mut gbxs, &supers).unwrap();
        supers[0].gbx_index = 1; // break the invariant behind the spans' back
        let err = check_spans(&gbxs, &supers).unwrap_err();
        assert!(matches!(err, SdmError::Invariant(_)));
    }

    #[test]
    fn test_disjoint_spans_partition() {
        let mut supers = vec![drop_in(0, 0), drop_in(0, 1), drop_in(2, 2)];
        let mut gbxs = gridboxes(3);
        sort_supers(&mut supers);
        set_spans(&mut gbxs, &supers).unwrap();

        let spans = disjoint_spans(&gbxs, &mut supers).unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].len(), 2);
        assert_eq!(spans[1].len(), 0);
        assert_eq!(spans[2].len(), 1);
    }
}
