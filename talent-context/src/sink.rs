//! The narrow capability a context needs from the correlator: "add a
//! gatherer" — nothing else. Contexts hold this, not the correlator itself
//! (spec §3 ownership: "Contexts hold weak references (lookup only, no
//! lifecycle control)"). `talent-client::Client` implements this trait by
//! locking the single mutex that guards its owned `ReplyCorrelator`.

use async_trait::async_trait;
use talent_correlator::GathererDyn;

/// Accepts a freshly constructed gatherer into whatever correlator the
/// implementor owns.
#[async_trait]
pub trait GathererSink: Send + Sync {
    /// Hand `gatherer` off to the correlator.
    async fn add(&self, gatherer: Box<dyn GathererDyn>);
}
