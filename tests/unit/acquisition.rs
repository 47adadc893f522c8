//! Single-shot measurements: data-ready polling, burst read and remap

use ak09916::{Config, Error, Mode, Orientation, Sample};
use embassy_futures::{block_on, join::join};

use crate::common::*;

#[test]
fn one_shot_triggers_polls_and_reads_burst() {
  let r = rig();
  r.bus.set_sample(120, -45, 300);

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(120, -45, 300));
  assert_eq!(r.mag.last_sample(), sample);
  assert_eq!(
    r.bus.operations(),
    vec![Op::Write { reg: CNTL2, value: SINGLE }, Op::Read { reg: ST1, len: 1 }, Op::Read { reg: HXL, len: 8 }]
  );
}

#[test]
fn data_ready_retries_while_status_reads_zero() {
  let r = rig();
  r.bus.set_sample(1, 2, 3);
  r.bus.set_not_ready(3, 0x00);

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(1, 2, 3));
  assert_eq!(r.bus.reads_of(ST1), 4);
  // settle after the mode write plus three 2 ms retry waits
  assert_eq!(r.delay.slept_ns(), 100_000 + 3 * 2 * MS);
}

#[test]
fn data_ready_gives_up_after_five_retries() {
  let r = rig();
  r.bus.set_not_ready(100, 0x00);

  let result = block_on(r.mag.read_raw());

  assert!(matches!(result, Err(Error::DataNotReady { st1: 0 })));
  assert_eq!(r.bus.reads_of(ST1), 6);
  assert_eq!(r.bus.reads_of(HXL), 0);
}

#[test]
fn nonzero_status_without_ready_fails_at_once() {
  let r = rig();
  r.bus.set_not_ready(1, 0x02);

  let result = block_on(r.mag.read_raw());

  assert!(matches!(result, Err(Error::DataNotReady { st1: 0x02 })));
  assert_eq!(r.bus.reads_of(ST1), 1);
}

#[test]
fn failed_read_keeps_previous_sample() {
  let r = rig();
  r.bus.set_sample(7, 8, 9);
  block_on(r.mag.read_raw()).unwrap();

  r.bus.set_sample(1, 1, 1);
  r.bus.fail_next(1);
  let result = block_on(r.mag.read_raw());

  assert!(matches!(result, Err(Error::I2c(_))));
  assert_eq!(r.mag.last_sample(), Sample::new(7, 8, 9));
}

#[test]
fn default_mounting_rotates_axes() {
  let r = rig_with(Config::default());
  r.bus.set_sample(1, 2, 3);

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(2, -1, 3));
}

#[test]
fn bottom_mounting_flips_z() {
  let r = rig_with(Config { orientation: Orientation::BottomUpperRight, ..Config::default() });
  r.bus.set_sample(10, 20, 30);

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(-10, 20, -30));
  assert_eq!(Orientation::BottomUpperRight.invert(sample), Sample::new(10, 20, 30));
}

#[test]
fn overflow_is_still_reported() {
  let r = rig();
  r.bus.set_overflow(true);
  r.bus.set_sample(4912, 0, -4912);

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(4912, 0, -4912));
}

#[test]
fn micro_tesla_scaling() {
  let r = rig();
  r.bus.set_sample(100, -20, 0);

  let v = block_on(r.mag.read_micro_tesla()).unwrap();

  assert!((v.x - 15.0).abs() < 1e-4);
  assert!((v.y + 3.0).abs() < 1e-4);
  assert!(v.z.abs() < 1e-4);
}

#[test]
fn enabled_stream_serves_last_sample_without_bus_traffic() {
  let r = rig();
  r.bus.set_sample(5, 6, 7);
  block_on(r.mag.read_raw()).unwrap();
  block_on(r.mag.set_enabled(true)).unwrap();
  r.bus.set_sample(0, 0, 0);
  r.bus.clear_operations();

  let sample = block_on(r.mag.read_raw()).unwrap();

  assert_eq!(sample, Sample::new(5, 6, 7));
  assert!(r.bus.operations().is_empty());
}

#[test]
fn concurrent_mode_write_waits_for_the_measurement() {
  let r = rig();
  r.bus.set_sample(3, 2, 1);
  r.bus.set_not_ready(3, 0x00);

  let (sample, powered_down) = block_on(join(r.mag.read_raw(), r.mag.set_mode(Mode::PowerDown)));

  assert_eq!(sample.unwrap(), Sample::new(3, 2, 1));
  powered_down.unwrap();
  let st1 = Op::Read { reg: ST1, len: 1 };
  assert_eq!(
    r.bus.operations(),
    vec![
      Op::Write { reg: CNTL2, value: SINGLE },
      st1,
      st1,
      st1,
      st1,
      Op::Read { reg: HXL, len: 8 },
      Op::Write { reg: CNTL2, value: POWER_DOWN },
    ]
  );
}
