//! §8 scenario 4: a slot that disconnects itself mid-trigger still counts as
//! activated, but the connection is dead and the container is empty
//! afterward.

use metastew::invokable::self_aware_extension;
use metastew::{ObjectExtension, Signal, Variable};

#[test]
fn self_disconnecting_slot_still_counts_as_activated() -> anyhow::Result<()> {
    let signal: Signal<()> = Signal::new("sigVoid");
    let slot = self_aware_extension("self_disconnect", |me, _args| {
        me.disconnect();
        Ok(Some(Variable::empty()))
    });
    let connection = signal.connect(slot);

    assert_eq!(signal.trigger(vec![]), 1);
    assert!(!connection.is_valid());
    assert_eq!(signal.extension().core().connections().len(), 0);
    Ok(())
}
