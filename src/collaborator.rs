//! The out-of-core collaborators (spec §6): egress port I/O and the
//! controller transport. Both are opaque sinks from this crate's point of
//! view; only the egress/controller collaborators may block (spec §5),
//! which is why they're trait objects rather than something the pipeline
//! driver owns concrete knowledge of.

use crate::packet::PacketSnapshot;
use crate::port::PortNumber;

/// Receives packets emitted by an `output` action.
pub trait EgressSink {
    fn emit(&self, port_no: PortNumber, packet: PacketSnapshot);
}

/// Receives packets redirected to the controller, either by a
/// controller-bound table miss or by an explicit `output(CONTROLLER)`.
pub trait ControllerSink {
    fn send(&self, packet: PacketSnapshot);
}

/// Recording implementations, used across this crate's unit and
/// integration tests in place of a real I/O/controller transport.
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct RecordingEgress {
        emitted: Mutex<Vec<(PortNumber, PacketSnapshot)>>,
    }

    impl RecordingEgress {
        pub fn emitted(&self) -> Vec<(PortNumber, PacketSnapshot)> {
            self.emitted.lock().clone()
        }
    }

    impl EgressSink for RecordingEgress {
        fn emit(&self, port_no: PortNumber, packet: PacketSnapshot) {
            self.emitted.lock().push((port_no, packet));
        }
    }

    #[derive(Default)]
    pub struct RecordingController {
        received: Mutex<Vec<PacketSnapshot>>,
    }

    impl RecordingController {
        pub fn received(&self) -> Vec<PacketSnapshot> {
            self.received.lock().clone()
        }
    }

    impl ControllerSink for RecordingController {
        fn send(&self, packet: PacketSnapshot) {
            self.received.lock().push(packet);
        }
    }
}
