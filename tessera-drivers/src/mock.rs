//! Recording mocks for driver tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorType as SpiErrorType, Operation, SpiDevice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(u8),
    Data(Vec<u8>),
    Reset(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Shared event log plus the DC line level
#[derive(Clone, Default)]
pub struct Bus {
    pub events: Rc<RefCell<Vec<Event>>>,
    dc: Rc<Cell<bool>>,
    pub fail: Rc<Cell<bool>>,
}

impl Bus {
    pub fn spi(&self) -> MockSpi {
        MockSpi { bus: self.clone() }
    }

    pub fn dc(&self) -> MockDc {
        MockDc { bus: self.clone() }
    }

    pub fn rst(&self) -> MockRst {
        MockRst { bus: self.clone() }
    }

    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Commands in the log, in order
    pub fn commands(&self) -> Vec<u8> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Data bytes following each occurrence of `cmd`, concatenated
    pub fn data_after(&self, cmd: u8) -> Vec<u8> {
        let events = self.events.borrow();
        let mut out = Vec::new();
        let mut capture = false;
        for event in events.iter() {
            match event {
                Event::Command(c) => capture = *c == cmd,
                Event::Data(bytes) if capture => out.extend_from_slice(bytes),
                _ => {}
            }
        }
        out
    }
}

pub struct MockSpi {
    bus: Bus,
}

impl SpiErrorType for MockSpi {
    type Error = MockError;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), MockError> {
        if self.bus.fail.get() {
            return Err(MockError);
        }
        let mut events = self.bus.events.borrow_mut();
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if self.bus.dc.get() {
                        events.push(Event::Data(bytes.to_vec()));
                    } else {
                        events.extend(bytes.iter().map(|b| Event::Command(*b)));
                    }
                }
                Operation::DelayNs(_) => {}
                _ => return Err(MockError),
            }
        }
        Ok(())
    }
}

pub struct MockDc {
    bus: Bus,
}

impl PinErrorType for MockDc {
    type Error = MockError;
}

impl OutputPin for MockDc {
    fn set_low(&mut self) -> Result<(), MockError> {
        self.bus.dc.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), MockError> {
        self.bus.dc.set(true);
        Ok(())
    }
}

pub struct MockRst {
    bus: Bus,
}

impl PinErrorType for MockRst {
    type Error = MockError;
}

impl OutputPin for MockRst {
    fn set_low(&mut self) -> Result<(), MockError> {
        self.bus.events.borrow_mut().push(Event::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), MockError> {
        self.bus.events.borrow_mut().push(Event::Reset(true));
        Ok(())
    }
}

/// Input pin replaying queued levels, then holding the last one
#[derive(Clone)]
pub struct MockInput {
    levels: Rc<RefCell<VecDeque<bool>>>,
    idle: Rc<Cell<bool>>,
}

impl MockInput {
    pub fn new(idle: bool) -> Self {
        Self {
            levels: Rc::default(),
            idle: Rc::new(Cell::new(idle)),
        }
    }

    pub fn queue(&self, levels: &[bool]) {
        self.levels.borrow_mut().extend(levels.iter().copied());
    }

    pub fn set_idle(&self, idle: bool) {
        self.idle.set(idle);
    }
}

impl PinErrorType for MockInput {
    type Error = MockError;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, MockError> {
        Ok(self.levels.borrow_mut().pop_front().unwrap_or(self.idle.get()))
    }

    fn is_low(&mut self) -> Result<bool, MockError> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that only adds up the requested time
#[derive(Clone, Default)]
pub struct MockDelay {
    pub elapsed_ns: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns.get() / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + u64::from(ns));
    }
}
