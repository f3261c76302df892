//! Render target ownership and the stale-response guard.

use crate::model::{Fragment, RenderTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Applied,
    /// A newer request has been issued since this one; the target is untouched.
    Stale { latest: u64 },
}

/// Owns the render target and decides which responses may replace it.
///
/// Sequence numbers start at 1; only the most recently issued one renders.
#[derive(Debug, Clone)]
pub struct FragmentRenderer {
    target: RenderTarget,
    latest_issued: u64,
}

impl FragmentRenderer {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target: RenderTarget::new(target_name),
            latest_issued: 0,
        }
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn latest_issued(&self) -> u64 {
        self.latest_issued
    }

    pub fn issue(&mut self) -> u64 {
        self.latest_issued += 1;
        self.latest_issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_issued
    }

    /// Replace the whole target content with `fragment`, verbatim.
    pub fn render(&mut self, seq: u64, fragment: Fragment) -> RenderOutcome {
        if !self.is_current(seq) {
            tracing::debug!(seq, latest = self.latest_issued, "stale fragment dropped");
            return RenderOutcome::Stale {
                latest: self.latest_issued,
            };
        }
        self.target.content = fragment.body;
        self.target.rendered_seq = Some(seq);
        self.target.rendered_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .ok();
        RenderOutcome::Applied
    }
}
