use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::component::ComponentKind;
use crate::labels::Labels;

/// Everything a `Dispatch` call threads down through the component tree.
///
/// Plays the role of the original's `context.Context` plus its four
/// reserved `context.Value` keys (`ComponentID`, `ComponentKind`,
/// `ComponentLabels`, `DispatchStartTime`): rather than an untyped key/value
/// bag, those become typed fields here, and `child()` gives fan-out/routers
/// an explicit way to derive a per-child context carrying its own
/// cancellation token while inheriting the parent's deadline and labels.
#[derive(Clone)]
pub struct DispatchContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    labels: Labels,
    component_id: Arc<str>,
    component_kind: ComponentKind,
    start_time: Instant,
}

impl DispatchContext {
    /// A fresh root context for a new incoming request, with no deadline
    /// and an empty label set.
    pub fn new(component_id: impl Into<Arc<str>>, component_kind: ComponentKind) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            deadline: None,
            labels: Labels::new(),
            component_id: component_id.into(),
            component_kind,
            start_time: Instant::now(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = self.labels.with_labels(labels);
        self
    }

    /// Derives a context for a child component: a linked cancellation token
    /// (cancelling `self` cancels the child, but not vice versa) and the
    /// child's own id/kind, inheriting the parent's deadline and labels.
    pub fn child(&self, component_id: impl Into<Arc<str>>, component_kind: ComponentKind) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
            labels: self.labels.clone(),
            component_id: component_id.into(),
            component_kind,
            start_time: self.start_time,
        }
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn component_kind(&self) -> ComponentKind {
        self.component_kind
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolves once the deadline passes, or never if there is none. Meant
    /// for use as one arm of a `tokio::select!` alongside a response
    /// channel and the cancellation token, per the multi-way wait the
    /// routing state machines need.
    pub async fn sleep_until_deadline(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_deadline_and_labels_with_linked_cancellation() {
        let parent = DispatchContext::new("root", ComponentKind::Caller)
            .with_timeout(Duration::from_secs(1))
            .with_labels(Labels::new().with_label("a", vec!["1".into()]));

        let child = parent.child("child-1", ComponentKind::Combiner);
        assert_eq!(child.deadline(), parent.deadline());
        assert_eq!(child.labels().label("a"), ["1"]);

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn sleep_until_deadline_resolves_immediately_when_exceeded() {
        let ctx = DispatchContext::new("root", ComponentKind::Caller)
            .with_timeout(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(ctx.is_deadline_exceeded());
        ctx.sleep_until_deadline().await;
    }
}
