use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::model::Route;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigatorOperation {
    GoTo { route: Route, path: String },
}

impl Operation for NavigatorOperation {
    type Output = ();
}

/// Moves the shell's router. The core has already switched `Model::route`
/// by the time this goes out.
pub struct Navigator<Ev> {
    context: CapabilityContext<NavigatorOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigatorOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<Ev> Navigator<Ev> {
    pub fn new(context: CapabilityContext<NavigatorOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Navigator<Ev>
where
    Ev: Send + 'static,
{
    pub fn go_to(&self, route: Route) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(NavigatorOperation::GoTo {
                route,
                path: route.path().to_string(),
            })
            .await;
        });
    }
}
