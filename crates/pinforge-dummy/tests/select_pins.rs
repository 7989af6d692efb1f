use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use pinforge_core::pin::{PinCapFlags, PinCapability, PinCfgFlags, PinConfiguration, PinGroup, RejectReason};
use pinforge_core::port::{PinClaims, Port};
use pinforge_core::select::{ChipSelectManager, MultiplexerSelect, PinSelect, PinSetSelect};
use pinforge_core::{Error, Result};
use pinforge_dummy::{DummyEvent, DummyPort, DummyPortConfig, DummySelect, SelectEvent};

fn port() -> Arc<DummyPort> {
    let config = DummyPortConfig::new(8)
        .with_offset(100)
        .with_pin(6, PinCapability::new(PinCapFlags::INPUT | PinCapFlags::INPUT_PULL_UP, 0))
        .without_pin(7);
    Arc::new(DummyPort::new(config))
}

/// Forwards to a dummy port and remembers the most output lines ever
/// driven low at once
struct LowWatch {
    inner: DummyPort,
    most_low: AtomicUsize,
}

impl LowWatch {
    fn new(pins: u32) -> Arc<Self> {
        Arc::new(Self {
            inner: DummyPort::with_pins(pins),
            most_low: AtomicUsize::new(0),
        })
    }

    fn most_low(&self) -> usize {
        self.most_low.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.most_low.store(0, Ordering::SeqCst);
    }

    fn observe(&self) {
        let low = (0..self.inner.pin_count())
            .filter_map(|local| self.inner.configuration(local).ok())
            .filter(|cfg| cfg.is_output() && !cfg.output_state())
            .count();
        self.most_low.fetch_max(low, Ordering::SeqCst);
    }
}

impl Port for LowWatch {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn pin_count(&self) -> u32 {
        self.inner.pin_count()
    }

    fn capability(&self, local: u32) -> PinCapability {
        self.inner.capability(local)
    }

    fn configuration(&self, local: u32) -> Result<PinConfiguration> {
        self.inner.configuration(local)
    }

    fn apply(&self, local: u32, cfg: &PinConfiguration) -> Result<()> {
        self.inner.apply(local, cfg)?;
        self.observe();
        Ok(())
    }

    fn input(&self, local: u32) -> Result<bool> {
        self.inner.input(local)
    }

    fn output(&self, local: u32, high: bool) -> Result<()> {
        self.inner.output(local, high)?;
        self.observe();
        Ok(())
    }

    fn claims(&self) -> &PinClaims {
        self.inner.claims()
    }
}

#[test]
fn active_low_lines_stay_idle_while_taken_over() {
    let port = LowWatch::new(4);

    let group = PinGroup::from_raw(port.clone(), &[0, 1, 2]).unwrap();
    let cs = PinSetSelect::new(group.access().unwrap(), false).unwrap();
    assert_eq!(port.most_low(), 0);
    drop(cs);

    port.reset();
    let group = PinGroup::from_raw(port.clone(), &[3]).unwrap();
    let cs = PinSelect::new(group.access().unwrap(), false).unwrap();
    assert_eq!(port.most_low(), 0);

    // selecting is the only thing that pulls the line low
    let manager = ChipSelectManager::new(cs);
    let token = manager.select(0).unwrap();
    assert_eq!(port.most_low(), 1);
    drop(token);
}

#[test]
fn multiplexer_enable_stays_idle_while_taken_over() {
    let port = LowWatch::new(3);
    let group = PinGroup::from_raw(port.clone(), &[0, 1, 2]).unwrap();
    let cs = MultiplexerSelect::new(group.access().unwrap(), Some(false)).unwrap();
    // only the two address lines sit low; the enable line never does
    assert_eq!(port.most_low(), 2);
    assert!(port.configuration(2).unwrap().output_state());
    drop(cs);
}

#[test]
fn negotiate_then_apply() {
    let port = port();
    let group = PinGroup::from_raw(port.clone(), &[106, -1, 100]).unwrap();

    let mut proposed = [
        PinConfiguration::input().with(PinCfgFlags::INPUT_PULL_DOWN),
        PinConfiguration::NO_CHANGE,
        PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL),
    ];
    let verdict = group.propose_configs(&mut proposed, None, None).unwrap();
    assert_eq!(verdict, RejectReason::PullUnsupported);
    assert!(port.history().is_empty());

    let access = group.access().unwrap();
    let applied = access
        .configure_all(&[
            PinConfiguration::input().with(PinCfgFlags::INPUT_PULL_UP),
            PinConfiguration::NO_CHANGE,
            PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL),
        ])
        .unwrap();
    assert!(applied[0].is_input());
    assert_eq!(port.history().len(), 2);

    access.output(2, true).unwrap();
    assert_eq!(access.inputs().unwrap(), vec![Some(true), None, Some(true)]);
    assert_eq!(port.history().last(), Some(&DummyEvent::Output(0, true)));
}

#[test]
fn group_rejects_hole() {
    let port = port();
    assert!(matches!(
        PinGroup::from_raw(port, &[107]),
        Err(Error::NonexistentPin(107))
    ));
}

#[test]
fn pin_set_select_under_contention() {
    let port = port();
    let group = PinGroup::from_raw(port.clone(), &[100, 101, 102]).unwrap();
    let cs = PinSetSelect::new(group.access().unwrap(), false).unwrap();
    // all lines idle high
    for local in 0..3 {
        assert!(port.output_level(local).unwrap());
    }

    let manager = ChipSelectManager::new(cs);
    let handles: Vec<_> = (0..6)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let port = Arc::clone(&port);
            thread::spawn(move || {
                let chip = i % 3;
                let _token = manager.select(chip).unwrap();
                // only the selected line is low
                for local in 0..3 {
                    assert_eq!(port.output_level(local).unwrap(), local != chip as u32);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for local in 0..3 {
        assert!(port.output_level(local).unwrap());
    }
}

#[test]
fn select_pins_stay_claimed() {
    let port = port();
    let group = PinGroup::from_raw(port.clone(), &[100, 101, 102]).unwrap();
    let cs = MultiplexerSelect::new(group.access().unwrap(), Some(false)).unwrap();
    assert!(matches!(group.access(), Err(Error::PinInUse(100))));

    drop(cs);
    assert!(group.access().is_ok());
}

#[test]
fn multiplexer_change_chip() {
    let port = port();
    let group = PinGroup::from_raw(port.clone(), &[100, 101, 102]).unwrap();
    let cs = MultiplexerSelect::new(group.access().unwrap(), Some(false)).unwrap();
    let manager = ChipSelectManager::new(cs);

    let mut token = manager.select(1).unwrap();
    port.clear_history();
    token.change_chip(2).unwrap();

    // enable released before the address changes
    assert_eq!(
        port.history(),
        vec![
            DummyEvent::Output(2, true),
            DummyEvent::Output(0, false),
            DummyEvent::Output(1, true),
            DummyEvent::Output(2, false),
        ]
    );
}

#[test]
fn dummy_select_with_manager() {
    let driver = Arc::new(DummySelect::new(2));
    let manager = ChipSelectManager::new(Arc::clone(&driver));

    let mut token = manager.select(0).unwrap();
    assert_eq!(driver.selected(), Some(0));
    token.change_chip(1).unwrap();
    assert_eq!(driver.selected(), Some(1));
    drop(token);

    assert_eq!(driver.selected(), None);
    assert_eq!(
        driver.events(),
        vec![
            SelectEvent::Select(0),
            SelectEvent::Deselect(0),
            SelectEvent::Select(1),
            SelectEvent::Deselect(1),
        ]
    );
    assert!(port().exists(100));
}
