/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rolling-window precomputation.
//!
//! The window ranges depend only on the horizon length, so they are computed
//! once per model build and shared by every employee's rows.  These are free
//! functions so they can be tested without building a model.

use std::ops::Range;

/// Every window of `len` slots starting at `0, stride, 2·stride, …` inside
/// `0..num_slots`, plus the tail window ending at `num_slots` when the stride
/// does not land on it.
///
/// A horizon shorter than `len` yields the single window `0..num_slots`, so a
/// window never reaches past the last slot.  Returns an empty list when
/// `num_slots`, `len` or `stride` is zero.
pub fn rolling_windows(num_slots: usize, len: usize, stride: usize) -> Vec<Range<usize>> {
    if num_slots == 0 || len == 0 || stride == 0 {
        return Vec::new();
    }
    if len >= num_slots {
        return vec![0..num_slots];
    }

    let last_start = num_slots - len;
    let mut windows: Vec<Range<usize>> = (0..=last_start)
        .step_by(stride)
        .map(|start| start..start + len)
        .collect();
    if windows.last().map(|w| w.start) != Some(last_start) {
        windows.push(last_start..num_slots);
    }
    windows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
