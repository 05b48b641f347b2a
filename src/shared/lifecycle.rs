/// A component driven one step at a time by an external scheduler.
///
/// A run is `reset` once, receives any number of `step` calls, and ends
/// with `finalize`. Implementations must tolerate `reset` being called
/// again to start a new run.
pub trait StepComponent {
    type Input;
    type Output;
    type Error: std::error::Error;

    /// Start a new run, discarding any state left by a previous one
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Process every input that is ready for the current step
    fn step(&mut self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// End the current run
    fn finalize(&mut self) -> Result<(), Self::Error>;
}

/// Return the value on the last ready channel, scanning channels in order.
///
/// Multi-channel inputs deliver at most one value per channel per step;
/// when several channels are ready the highest-numbered one wins.
pub fn last_ready<T>(channels: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    channels.into_iter().flatten().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_ready_picks_final_value() {
        assert_eq!(last_ready(vec![Some(1), Some(2), Some(3)]), Some(3));
        assert_eq!(last_ready(vec![Some(1), Some(2), None]), Some(2));
    }

    #[test]
    fn test_last_ready_no_values() {
        assert_eq!(last_ready(Vec::<Option<i64>>::new()), None);
        assert_eq!(last_ready(vec![None::<i64>, None]), None);
    }
}
