use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Shells without a vibration motor drop the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HapticsOperation {
    Vibrate { millis: u64 },
}

impl Operation for HapticsOperation {
    type Output = ();
}

pub struct Haptics<Ev> {
    context: CapabilityContext<HapticsOperation, Ev>,
}

impl<Ev> Capability<Ev> for Haptics<Ev> {
    type Operation = HapticsOperation;
    type MappedSelf<MappedEv> = Haptics<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Haptics::new(self.context.map_event(f))
    }
}

impl<Ev> Haptics<Ev> {
    pub fn new(context: CapabilityContext<HapticsOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Haptics<Ev>
where
    Ev: Send + 'static,
{
    pub fn vibrate(&self, millis: u64) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(HapticsOperation::Vibrate { millis }).await;
        });
    }
}
