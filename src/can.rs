//! The CAN bus driver contract the link layer is built against.
//!
//! Physical CAN driver implementations are out of scope for this crate;
//! this trait is the seam an embedding application implements.

use crate::packet::CanFrame;

/// A synchronous, blocking CAN bus interface.
pub trait CanBus {
    type Error;

    /// Transmits a single CAN frame.
    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Blocks for up to `timeout_ms` milliseconds waiting for a frame on a
    /// currently-listened identifier. Returns `Ok(None)` on timeout.
    fn recv(&mut self, timeout_ms: u32) -> Result<Option<CanFrame>, Self::Error>;

    /// Starts listening for frames on the given identifiers.
    fn start_listen(&mut self, ids: &[u16]) -> Result<(), Self::Error>;

    /// Stops listening for frames on every previously registered identifier.
    fn stop_listen(&mut self) -> Result<(), Self::Error>;

    /// Discards any frames queued but not yet consumed.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A scoped listener guard: calls [`CanBus::stop_listen`] on drop so
/// callers cannot forget to unregister a listener set up for one exchange.
pub struct ListenGuard<'a, B: CanBus> {
    bus: &'a mut B,
}

impl<'a, B: CanBus> ListenGuard<'a, B> {
    pub fn new(bus: &'a mut B, ids: &[u16]) -> Result<Self, B::Error> {
        bus.start_listen(ids)?;
        Ok(Self { bus })
    }

    pub fn bus(&mut self) -> &mut B {
        self.bus
    }
}

impl<'a, B: CanBus> Drop for ListenGuard<'a, B> {
    fn drop(&mut self) {
        let _ = self.bus.stop_listen();
    }
}

#[cfg(test)]
pub mod mock {
    //! A mock `CanBus` driven by a list of expected transactions, in the
    //! style of `radio::mock::MockRadio`'s `expect()`/`done()` idiom.
    extern crate std;

    use std::vec::Vec;

    use super::CanBus;
    use crate::packet::CanFrame;

    /// A single expected interaction with the mock bus.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Transaction {
        Send(CanFrame),
        Recv(Option<CanFrame>),
        StartListen(Vec<u16>),
        StopListen,
        Flush,
    }

    impl Transaction {
        pub fn send(frame: CanFrame) -> Self {
            Transaction::Send(frame)
        }
        pub fn recv(frame: Option<CanFrame>) -> Self {
            Transaction::Recv(frame)
        }
        pub fn start_listen(ids: Vec<u16>) -> Self {
            Transaction::StartListen(ids)
        }
        pub fn stop_listen() -> Self {
            Transaction::StopListen
        }
        pub fn flush() -> Self {
            Transaction::Flush
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct MockError(pub std::string::String);

    pub struct MockCanBus {
        expected: Vec<Transaction>,
        index: usize,
    }

    impl MockCanBus {
        pub fn new() -> Self {
            Self {
                expected: Vec::new(),
                index: 0,
            }
        }

        pub fn expect(&mut self, transactions: &[Transaction]) {
            self.expected = transactions.to_vec();
            self.index = 0;
        }

        pub fn done(&self) {
            assert_eq!(
                self.index,
                self.expected.len(),
                "not all expected CAN bus transactions were consumed"
            );
        }

        fn next(&mut self) -> Transaction {
            assert!(
                self.index < self.expected.len(),
                "no more CAN bus transactions were expected"
            );
            let t = self.expected[self.index].clone();
            self.index += 1;
            t
        }
    }

    impl CanBus for MockCanBus {
        type Error = MockError;

        fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
            match self.next() {
                Transaction::Send(expected) => {
                    assert_eq!(&expected, frame, "unexpected frame sent");
                    Ok(())
                }
                other => panic!("expected {:?}, got send({:?})", other, frame),
            }
        }

        fn recv(&mut self, _timeout_ms: u32) -> Result<Option<CanFrame>, Self::Error> {
            match self.next() {
                Transaction::Recv(frame) => Ok(frame),
                other => panic!("expected {:?}, got recv()", other),
            }
        }

        fn start_listen(&mut self, ids: &[u16]) -> Result<(), Self::Error> {
            match self.next() {
                Transaction::StartListen(expected) => {
                    assert_eq!(&expected[..], ids, "unexpected start_listen ids");
                    Ok(())
                }
                other => panic!("expected {:?}, got start_listen({:?})", other, ids),
            }
        }

        fn stop_listen(&mut self) -> Result<(), Self::Error> {
            match self.next() {
                Transaction::StopListen => Ok(()),
                other => panic!("expected {:?}, got stop_listen()", other),
            }
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            match self.next() {
                Transaction::Flush => Ok(()),
                other => panic!("expected {:?}, got flush()", other),
            }
        }
    }
}
