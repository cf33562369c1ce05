use foundation::time::Time;

/// One tick of the host's animation clock.
///
/// Animation frames are independent of scene updates: hosts typically drive
/// them from the display refresh while scenes arrive on UI events.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Clock time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn at(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    /// Frame `index` of a fixed-rate clock; handy for replay and tests.
    pub fn fixed(index: u64, dt_s: f64) -> Self {
        Self::at(index, Time(index as f64 * dt_s))
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn fixed_frames_are_deterministic() {
        let a = Frame::fixed(10, 0.5);
        assert_eq!(a, Frame::fixed(10, 0.5));
        assert_eq!(a.time, Time(5.0));
    }
}
