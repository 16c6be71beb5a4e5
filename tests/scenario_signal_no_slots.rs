//! §8 scenario 1: a signal with no slots triggers cleanly and logs nothing.

use metastew::Signal;

#[test]
fn signal_with_no_slots_returns_zero() {
    let signal: Signal<()> = Signal::new("sigVoid");
    assert_eq!(signal.trigger(vec![]), 0);
}
