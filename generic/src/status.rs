//! Idle service: interlocks, stop recovery and status reports.

use crate::codec::encode;
use crate::collaborators::{Limit, Planner, SenseControl, StackProbe, Stepper, Transport};
use crate::flow_control::ReportKind;
use crate::markers::{InfoFlag, InfoParam, STATUS_END};
use crate::protocol::Protocol;
use crate::state::{X_AXIS, Y_AXIS, Z_AXIS};

impl<'a, P, S, T, C, K> Protocol<'a, P, S, T, C, K>
where
    P: Planner,
    S: Stepper,
    T: Transport,
    C: SenseControl,
    K: StackProbe,
{
    /// Runs after every received byte and on every pass of a wait loop.
    /// Nothing called from here waits on the planner or the stepper, so
    /// idle never re-enters itself.
    pub fn idle(&mut self) {
        if self.config.interlocks && (self.sense.door_open() || self.sense.chiller_off()) {
            self.sense.set_laser_intensity(0);
        }

        if self.stepper.stop_requested() {
            self.recover_from_stop();
        } else {
            self.stop_seen = false;
        }

        if let Some(kind) = self.flow.take_request() {
            self.report(kind);
        }
    }

    fn recover_from_stop(&mut self) {
        if !self.stop_seen {
            info!("[STOP] flushing queue, waiting for resume");
            self.stop_seen = true;
        }
        self.planner.reset_block_buffer();
        let pos = self.stepper.position();
        self.planner.set_position(pos);
        self.st.target = pos;
        self.pdata.reset();
    }

    fn report(&mut self, kind: ReportKind) {
        let stop = self.stepper.stop_status();

        if !self.planner.blocks_available()
            && !self.serial.data_available()
            && !self.stepper.stop_requested()
        {
            self.write_byte(InfoFlag::IdleYes.marker());
            self.sense.sleep();
        }

        if self.sense.door_open() {
            self.write_byte(InfoFlag::DoorOpen.marker());
        }
        if self.sense.chiller_off() {
            self.write_byte(InfoFlag::ChillerOff.marker());
        }

        if let Some(code) = stop {
            self.write_byte(code.code());
        }

        if self.config.interlocks {
            for limit in Limit::ALL {
                if limit.is_z() && !self.config.three_axes {
                    continue;
                }
                // the latched cause is reported once, above
                if self.sense.limit_hit(limit) && stop != Some(limit.stop_error()) {
                    self.write_byte(limit.stop_error().code());
                }
            }
        }

        let pos = self.stepper.position();
        for axis in [X_AXIS, Y_AXIS, Z_AXIS] {
            let val = pos[axis] - self.config.origin_offset[axis] - self.st.offset[axis];
            self.write_param(InfoParam::position(axis), val);
        }

        if let Some(count) = self.flow.take_underrun() {
            self.write_param(InfoParam::BufferUnderrun, f64::from(count));
        }

        let clearance = self.stack.clearance();
        self.write_param(InfoParam::StackClearance, f64::from(clearance));

        if kind == ReportKind::Superstatus {
            self.write_param(InfoParam::Version, f64::from(self.config.version));
            for axis in [X_AXIS, Y_AXIS, Z_AXIS] {
                self.write_param(InfoParam::offset(axis), self.st.offset[axis]);
            }
            self.write_param(InfoParam::Feedrate, self.st.feedrate);
            self.write_param(InfoParam::Intensity, f64::from(self.st.intensity));
            self.write_param(InfoParam::Duration, self.st.duration);
            self.write_param(InfoParam::PixelWidth, self.st.pixel_width);
        }

        self.write_byte(STATUS_END);
    }

    fn write_param(&mut self, param: InfoParam, val: f64) {
        for chr in encode(val) {
            self.write_byte(chr);
        }
        self.write_byte(param.marker());
    }

    fn write_byte(&mut self, byte: u8) {
        if nb::block!(self.serial.write(byte)).is_err() {
            warn!("status write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::decode;
    use crate::collaborators::{Block, Limit};
    use crate::config::MachineConfig;
    use crate::driveboard_error::StopError;
    use crate::flow_control::ReportKind;
    use crate::markers::{InfoParam, STATUS_END};
    use crate::mock::{mock_protocol, send, send_param};
    use crate::status_parser::{StatusEvent, StatusParser, StatusReport};

    fn reports(tx: &[u8]) -> Vec<StatusReport> {
        let mut parser = StatusParser::new();
        tx.iter()
            .filter_map(|b| parser.push(*b).unwrap())
            .filter_map(|ev| match ev {
                StatusEvent::Report(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn interlocked() -> MachineConfig {
        MachineConfig {
            interlocks: true,
            ..MachineConfig::default()
        }
    }

    #[test]
    fn test_boot_reports_superstatus_once() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        p.idle();
        let m = m.borrow();
        assert_eq!(m.tx.iter().filter(|b| **b == STATUS_END).count(), 1);
        let r = &reports(&m.tx)[0];
        assert!(r.ready);
        assert_eq!(r.version, Some(2012.0));
        assert_eq!(r.feedrate, Some(8000.0));
        assert_eq!(r.position, [0.0, 0.0, 0.0]);
        assert_eq!(m.sleeps, 1);
    }

    #[test]
    fn test_position_excludes_origin_and_offset() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        send_param(&mut p, b'h', 2.0);
        send_param(&mut p, b'x', 10.0);
        send(&mut p, b"B");
        m.borrow_mut().run_all();
        m.borrow_mut().tx.clear();

        p.flow.request_status();
        p.idle();
        let r = &reports(&m.borrow().tx)[0];
        assert_eq!(r.position[0], 10.0);
        // plain status leaves out the superstatus fields
        assert_eq!(r.version, None);
        assert_eq!(r.offset, [None, None, None]);
    }

    #[test]
    fn test_busy_machine_is_not_ready() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        send(&mut p, b"L");
        m.borrow_mut().tx.clear();
        p.flow.request_status();
        p.idle();
        let m = m.borrow();
        assert!(!reports(&m.tx)[0].ready);
        assert_eq!(m.sleeps, 1);
    }

    #[test]
    fn test_status_is_idempotent() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        m.borrow_mut().tx.clear();

        p.flow.request_status();
        p.idle();
        p.flow.request_status();
        p.idle();
        let r = reports(&m.borrow().tx);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0], r[1]);
    }

    #[test]
    fn test_stop_flushes_queue_and_reports_code() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        for x in [10.0, 20.0, 30.0] {
            send_param(&mut p, b'x', x);
            send(&mut p, b"B");
        }
        m.borrow_mut().step();
        assert_eq!(m.borrow().queue.len(), 2);

        m.borrow().stop.request(StopError::SerialStopRequest);
        m.borrow_mut().tx.clear();
        p.flow.request_status();
        p.idle();

        {
            let m = m.borrow();
            assert!(m.queue.is_empty());
            assert_eq!(m.planner_position, m.position);
            assert_eq!(p.state().target, m.position);
            let r = &reports(&m.tx)[0];
            assert_eq!(r.stops.as_slice(), &[StopError::SerialStopRequest]);
            assert!(!r.ready);
            assert_eq!(r.position[0], 10.0);
        }

        // after resume the next move starts from where the head stopped
        m.borrow().stop.clear();
        send(&mut p, b"E");
        send_param(&mut p, b'x', 1.0);
        assert_eq!(p.state().target[0], 16.0);
    }

    #[test]
    fn test_stop_drops_pending_submission() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        {
            let mut m = m.borrow_mut();
            m.capacity = 1;
            m.stop_on_reject = Some(StopError::LimitHitX2);
        }
        send(&mut p, b"LN");
        let m = m.borrow();
        assert!(m.queue.is_empty());
        assert!(!m.executed.contains(&Block::AuxAssist(true)));
        assert_eq!(m.stop.status(), Some(StopError::LimitHitX2));
    }

    #[test]
    fn test_superstatus_fields() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        send_param(&mut p, b'h', 1.25);
        send_param(&mut p, b'j', -3.0);
        send_param(&mut p, b'f', 1500.0);
        send_param(&mut p, b's', 77.0);
        send_param(&mut p, b'd', 0.5);
        send_param(&mut p, b'p', 0.1);
        m.borrow_mut().tx.clear();
        p.flow.request_superstatus();
        p.idle();

        let r = &reports(&m.borrow().tx)[0];
        assert_eq!(r.offset, [Some(1.25), Some(0.0), Some(-3.0)]);
        assert_eq!(r.feedrate, Some(1500.0));
        assert_eq!(r.intensity, Some(77.0));
        assert_eq!(r.duration, Some(0.5));
        assert_eq!(r.pixel_width, Some(0.1));
        assert_eq!(r.stack_clearance, Some(512.0));
    }

    #[test]
    fn test_underrun_reported_once() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        p.flow.mark_underrun();
        p.flow.mark_underrun();
        m.borrow_mut().tx.clear();
        p.flow.request_status();
        p.idle();
        p.flow.request_status();
        p.idle();
        let r = reports(&m.borrow().tx);
        assert_eq!(r[0].underruns, Some(2.0));
        assert_eq!(r[1].underruns, None);
    }

    #[test]
    fn test_param_record_layout() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        p.idle();
        m.borrow_mut().tx.clear();
        p.flow.request_status();
        p.idle();
        let m = m.borrow();
        // ready flag, then x position as four data bytes and its marker
        assert_eq!(m.tx[0], b'A');
        assert!(m.tx[1..5].iter().all(|b| *b >= 128));
        assert_eq!(decode(&[m.tx[1], m.tx[2], m.tx[3], m.tx[4]]), 0.0);
        assert_eq!(m.tx[5], InfoParam::PosX.marker());
        assert_eq!(*m.tx.last().unwrap(), STATUS_END);
    }

    #[test]
    fn test_interlock_kills_laser() {
        let (mut p, m) = mock_protocol(interlocked());
        m.borrow_mut().door_open = true;
        p.idle();
        let m = m.borrow();
        assert_eq!(m.laser_overrides, vec![0]);
        assert!(reports(&m.tx)[0].door_open);
    }

    #[test]
    fn test_door_flag_without_interlocks() {
        let (mut p, m) = mock_protocol(MachineConfig::default());
        m.borrow_mut().chiller_off = true;
        p.idle();
        let m = m.borrow();
        assert!(m.laser_overrides.is_empty());
        assert!(reports(&m.tx)[0].chiller_off);
    }

    #[test]
    fn test_limit_codes_skip_latched_cause() {
        let (mut p, m) = mock_protocol(interlocked());
        {
            let mut m = m.borrow_mut();
            m.limits = vec![Limit::X1, Limit::Y2, Limit::Z1];
            m.stop.request(StopError::LimitHitX1);
        }
        p.idle();
        let r = &reports(&m.borrow().tx)[0];
        // two axes only, so Z is not reported
        assert_eq!(r.stops.as_slice(), &[StopError::LimitHitX1, StopError::LimitHitY2]);
    }

    #[test]
    fn test_z_limits_with_three_axes() {
        let config = MachineConfig {
            three_axes: true,
            ..interlocked()
        };
        let (mut p, m) = mock_protocol(config);
        m.borrow_mut().limits = vec![Limit::Z2];
        p.idle();
        let r = &reports(&m.borrow().tx)[0];
        assert_eq!(r.stops.as_slice(), &[StopError::LimitHitZ2]);
    }

    #[test]
    fn test_pending_request_kind() {
        let (p, _m) = mock_protocol(MachineConfig::default());
        assert_eq!(p.flow.take_request(), Some(ReportKind::Superstatus));
        assert_eq!(p.flow.take_request(), None);
    }
}
