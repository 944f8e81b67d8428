//! Last-request-wins bookkeeping shared by every controller.

/// Monotonic token source.
///
/// Each outbound request is tagged with the value returned by [`issue`].
/// A response may only mutate state while its token is still current;
/// [`invalidate`] retires the outstanding token without issuing a new one.
///
/// [`issue`]: RequestSequence::issue
/// [`invalidate`]: RequestSequence::invalidate
#[derive(Debug, Default)]
pub struct RequestSequence {
    current: u64,
}

impl RequestSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new request, superseding all earlier ones.
    pub fn issue(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Retire the outstanding token.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    #[must_use]
    pub fn is_current(&self, token: u64) -> bool {
        token != 0 && token == self.current
    }
}
