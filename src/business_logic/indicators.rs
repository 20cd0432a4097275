use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

/// Trailing rolling max/min over a fixed window (no look-ahead)
///
/// Keeps a monotonic deque of `(position, value)` so each update is
/// amortised O(1).
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    period: usize,
    kind: Extreme,
    window: VecDeque<(usize, f64)>,
    seen: usize,
}

impl RollingExtreme {
    pub fn new(period: usize, kind: Extreme) -> Self {
        Self {
            period,
            kind,
            window: VecDeque::new(),
            seen: 0,
        }
    }

    pub fn max(period: usize) -> Self {
        Self::new(period, Extreme::Max)
    }

    pub fn min(period: usize) -> Self {
        Self::new(period, Extreme::Min)
    }

    fn dominates(&self, value: f64, other: f64) -> bool {
        match self.kind {
            Extreme::Max => value >= other,
            Extreme::Min => value <= other,
        }
    }

    /// Push a value, returns the extreme once a full window has been seen
    pub fn update(&mut self, value: f64) -> Option<f64> {
        let position = self.seen;
        self.seen += 1;

        while let Some(&(_, last)) = self.window.back() {
            if self.dominates(value, last) {
                self.window.pop_back();
            } else {
                break;
            }
        }
        self.window.push_back((position, value));

        while let Some(&(front, _)) = self.window.front() {
            if position - front >= self.period {
                self.window.pop_front();
            } else {
                break;
            }
        }

        if self.seen >= self.period {
            self.current()
        } else {
            None
        }
    }

    /// Extreme of the values currently in the window, partial windows included
    pub fn current(&self) -> Option<f64> {
        self.window.front().map(|&(_, value)| value)
    }
}
