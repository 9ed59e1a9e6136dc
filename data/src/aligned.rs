/// One timeline plus N parallel value series, all kept the same length.
///
/// Series storage is positional: slot `i` belongs to the `i`-th key in
/// the owning stream's registry. A missing observation is `f64::NAN`.
/// The length invariant (`timeline.len() == series[i].len()` for every
/// slot) holds after every mutation; no partial update is observable.
#[derive(Debug, Clone, Default)]
pub struct AlignedBuffer {
    timeline: Vec<f64>,
    series: Vec<Vec<f64>>,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    #[error("timestamp is not finite")]
    NonFiniteTimestamp,
    #[error("append carries no values")]
    EmptyValues,
}

impl AlignedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn timeline(&self) -> &[f64] {
        &self.timeline
    }

    pub fn series(&self, slot: usize) -> Option<&[f64]> {
        self.series.get(slot).map(Vec::as_slice)
    }

    pub fn series_iter(&self) -> impl Iterator<Item = &[f64]> {
        self.series.iter().map(Vec::as_slice)
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.timeline.last().copied()
    }

    /// Append one point. `slots[i]` is the observation for registry slot
    /// `i`; `None` records a missing-value marker. A slot count larger
    /// than the current series count grows the buffer, back-filling the
    /// new series with NaN for every prior timestamp.
    ///
    /// Rejects (without mutating) a non-finite timestamp or a slot set
    /// with no observations at all.
    pub fn append(&mut self, timestamp: f64, slots: &[Option<f64>]) -> Result<(), AppendError> {
        if !timestamp.is_finite() {
            return Err(AppendError::NonFiniteTimestamp);
        }
        if slots.is_empty() || slots.iter().all(Option::is_none) {
            return Err(AppendError::EmptyValues);
        }

        self.ensure_series(slots.len());

        self.timeline.push(timestamp);
        for (series, slot) in self.series.iter_mut().zip(slots) {
            series.push(slot.unwrap_or(f64::NAN));
        }

        debug_assert!(self.is_aligned());
        Ok(())
    }

    /// Append every point of `chunk` onto this buffer. Used by the
    /// render handle, whose retained dataset is a copy, not a reference.
    /// Series the chunk does not carry are padded with NaN; series this
    /// buffer has not seen yet are back-filled before the extend.
    pub fn extend_from(&mut self, chunk: &AlignedBuffer) {
        if chunk.is_empty() {
            return;
        }

        self.ensure_series(chunk.series_count());

        self.timeline.extend_from_slice(&chunk.timeline);
        for (slot, series) in self.series.iter_mut().enumerate() {
            match chunk.series.get(slot) {
                Some(src) => series.extend_from_slice(src),
                None => series.extend(std::iter::repeat_n(f64::NAN, chunk.len())),
            }
        }

        debug_assert!(self.is_aligned());
    }

    /// Drop the first `n` points from the timeline and every series in
    /// lockstep. `n == 0` returns without touching anything.
    pub fn trim(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let n = n.min(self.timeline.len());

        self.timeline.drain(..n);
        for series in &mut self.series {
            series.drain(..n);
        }

        debug_assert!(self.is_aligned());
    }

    /// Reset to empty while keeping series slots and their allocations.
    pub fn clear(&mut self) {
        self.timeline.clear();
        for series in &mut self.series {
            series.clear();
        }
    }

    /// Min/max over the finite values of every series within the
    /// timestamp range `[earliest, latest]`. None when nothing finite
    /// falls inside the range.
    pub fn value_range(&self, earliest: f64, latest: f64) -> Option<(f64, f64)> {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for (idx, &ts) in self.timeline.iter().enumerate() {
            if ts < earliest || ts > latest {
                continue;
            }
            for series in &self.series {
                let value = series[idx];
                if !value.is_finite() {
                    continue;
                }
                min = Some(min.map_or(value, |m| m.min(value)));
                max = Some(max.map_or(value, |m| m.max(value)));
            }
        }

        match (min, max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    fn ensure_series(&mut self, count: usize) {
        while self.series.len() < count {
            self.series.push(vec![f64::NAN; self.timeline.len()]);
        }
    }

    fn is_aligned(&self) -> bool {
        self.series.iter().all(|s| s.len() == self.timeline.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn append_keeps_alignment() {
        let mut buf = AlignedBuffer::new();
        buf.append(1.0, &slots(&[10.0])).unwrap();
        buf.append(2.0, &slots(&[11.0, 20.0])).unwrap();
        buf.append(3.0, &[None, Some(21.0)]).unwrap();

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.series_count(), 2);
        for series in buf.series_iter() {
            assert_eq!(series.len(), buf.len());
        }
        assert_eq!(buf.timeline(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_series_backfills_history_with_nan() {
        let mut buf = AlignedBuffer::new();
        buf.append(1.0, &slots(&[10.0])).unwrap();
        buf.append(2.0, &slots(&[11.0])).unwrap();
        buf.append(3.0, &slots(&[12.0, 99.0])).unwrap();

        let late = buf.series(1).unwrap();
        assert_eq!(late.len(), 3);
        assert!(late[0].is_nan());
        assert!(late[1].is_nan());
        assert_eq!(late[2], 99.0);
    }

    #[test]
    fn absent_known_key_records_missing_marker() {
        let mut buf = AlignedBuffer::new();
        buf.append(1.0, &slots(&[10.0, 20.0])).unwrap();
        buf.append(2.0, &[Some(11.0), None]).unwrap();

        assert!(buf.series(1).unwrap()[1].is_nan());
        assert_eq!(buf.series(0).unwrap()[1], 11.0);
    }

    #[test]
    fn rejects_invalid_appends_without_mutation() {
        let mut buf = AlignedBuffer::new();
        buf.append(1.0, &slots(&[10.0])).unwrap();

        assert_eq!(
            buf.append(f64::NAN, &slots(&[11.0])),
            Err(AppendError::NonFiniteTimestamp)
        );
        assert_eq!(buf.append(2.0, &[]), Err(AppendError::EmptyValues));
        assert_eq!(buf.append(2.0, &[None]), Err(AppendError::EmptyValues));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn trim_is_lockstep_and_zero_is_noop() {
        let mut buf = AlignedBuffer::new();
        for i in 0..5 {
            buf.append(i as f64, &slots(&[i as f64 * 10.0, i as f64 * 100.0]))
                .unwrap();
        }

        buf.trim(0);
        assert_eq!(buf.len(), 5);

        buf.trim(2);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.timeline(), &[2.0, 3.0, 4.0]);
        assert_eq!(buf.series(0).unwrap(), &[20.0, 30.0, 40.0]);
        assert_eq!(buf.series(1).unwrap(), &[200.0, 300.0, 400.0]);

        buf.trim(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn extend_pads_missing_chunk_series() {
        let mut target = AlignedBuffer::new();
        target.append(1.0, &slots(&[10.0, 20.0])).unwrap();

        let mut chunk = AlignedBuffer::new();
        chunk.append(2.0, &slots(&[11.0])).unwrap();
        target.extend_from(&chunk);

        assert_eq!(target.len(), 2);
        assert_eq!(target.series(0).unwrap(), &[10.0, 11.0]);
        assert!(target.series(1).unwrap()[1].is_nan());
    }

    #[test]
    fn extend_grows_target_series() {
        let mut target = AlignedBuffer::new();
        target.append(1.0, &slots(&[10.0])).unwrap();

        let mut chunk = AlignedBuffer::new();
        chunk.append(2.0, &slots(&[11.0, 99.0])).unwrap();
        target.extend_from(&chunk);

        assert_eq!(target.series_count(), 2);
        assert!(target.series(1).unwrap()[0].is_nan());
        assert_eq!(target.series(1).unwrap()[1], 99.0);
    }

    #[test]
    fn value_range_skips_nan() {
        let mut buf = AlignedBuffer::new();
        buf.append(1.0, &slots(&[10.0])).unwrap();
        buf.append(2.0, &[None, Some(50.0)]).unwrap();
        buf.append(3.0, &slots(&[30.0, 5.0])).unwrap();

        assert_eq!(buf.value_range(1.0, 3.0), Some((5.0, 50.0)));
        assert_eq!(buf.value_range(2.0, 2.0), Some((50.0, 50.0)));
        assert_eq!(buf.value_range(10.0, 20.0), None);
    }
}
