//! §8 scenario 3: an integer-argument signal forwards to a void slot and an
//! `(i64,)` slot; both fire and both produce their expected log entry.

use std::cell::RefCell;
use std::rc::Rc;

use metastew::invokable::closure_extension;
use metastew::{Signal, Variable};

#[test]
fn both_slots_see_the_trigger() -> anyhow::Result<()> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let signal: Signal<(i64,)> = Signal::new("sigInt");

    let log_a = log.clone();
    let slot_a = closure_extension("a", move |_args| {
        log_a.borrow_mut().push("function".to_string());
        Ok(Some(Variable::empty()))
    });
    let log_b = log.clone();
    let slot_b = closure_extension("b", move |args| {
        let (n,): (i64,) = args.to_tuple()?;
        log_b.borrow_mut().push(format!("function({n})"));
        Ok(Some(Variable::empty()))
    });

    signal.connect(slot_a);
    signal.connect(slot_b);

    assert_eq!(signal.trigger(vec![Variable::new(10i64)]), 2);
    assert_eq!(*log.borrow(), vec!["function".to_string(), "function(10)".to_string()]);
    Ok(())
}
