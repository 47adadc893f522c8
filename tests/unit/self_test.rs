//! Factory self-test sequence and report

use ak09916::{Asa, Config, Orientation, Sample};
use embassy_futures::{
  block_on,
  join::join,
  select::{select, Either},
};

use crate::common::*;

#[test]
fn nominal_response_passes_on_first_attempt() {
  let r = rig();
  r.bus.set_self_test_response(0, 0, -500);
  r.bus.set_sample(10, 20, 30);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(report.passed);
  assert!(report.calibration_ok);
  assert!(report.cntl_ok);
  assert!(report.adc_ok);
  assert_eq!(report.response, Sample::new(0, 0, -500));
  assert_eq!(report.adc, Sample::new(10, 20, 30));
  assert_eq!(report.codes(), [0, 0, 0, 0, -500, 0, 0, 10, 20, 30]);
  assert_eq!(r.bus.writes_to(CNTL2), vec![POWER_DOWN, SELF_TEST, SINGLE]);
  assert_eq!(r.mag.last_sample(), Sample::new(10, 20, 30));
}

#[test]
fn attempt_reads_identity_then_polls_ready() {
  let r = rig();

  block_on(r.mag.run_self_test()).unwrap();

  let ops = r.bus.operations();
  assert_eq!(
    &ops[..6],
    &[
      Op::Write { reg: CNTL2, value: POWER_DOWN },
      Op::Read { reg: CNTL2, len: 1 },
      Op::Read { reg: WIA1, len: 2 },
      Op::Write { reg: CNTL2, value: SELF_TEST },
      Op::Read { reg: ST1, len: 1 },
      Op::Read { reg: HXL, len: 6 },
    ]
  );
}

#[test]
fn out_of_window_response_is_retried_five_times() {
  let r = rig();
  r.bus.set_self_test_response(300, 0, -500);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(!report.passed);
  assert_eq!(report.response, Sample::new(300, 0, -500));
  assert_eq!(report.codes()[1], -1);
  let self_test_writes = r.bus.writes_to(CNTL2).iter().filter(|&&v| v == SELF_TEST).count();
  assert_eq!(self_test_writes, 6);
}

#[test]
fn response_is_not_remapped() {
  let r = rig_with(Config { orientation: Orientation::BottomLowerLeft, ..Config::default() });
  r.bus.set_self_test_response(150, -150, -900);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(report.passed);
  assert_eq!(report.response, Sample::new(150, -150, -900));
}

#[test]
fn adc_check_flags_saturated_conversion() {
  let r = rig();
  r.bus.set_sample(6500, 0, 0);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(report.passed);
  assert!(!report.adc_ok);
  assert_eq!(report.adc, Sample::new(6500, 0, 0));
  assert_eq!(report.codes()[6], -1);
}

#[test]
fn adc_check_gives_up_after_five_conversions() {
  let r = rig();
  r.bus.set_not_ready(100, 0x00);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(report.passed);
  assert!(!report.adc_ok);
  assert_eq!(report.adc, Sample::default());
  assert_eq!(r.bus.writes_to(CNTL2).iter().filter(|&&v| v == SINGLE).count(), 5);
}

#[test]
fn cntl_failure_is_reported_not_raised() {
  let r = rig();
  r.bus.fail_next(1);

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(report.passed);
  assert!(!report.cntl_ok);
  assert_eq!(report.codes()[5], -1);
}

#[test]
fn bad_calibration_bytes_are_reported() {
  let r = rig_with(Config { asa: Asa([128, 0, 128]), ..Config::default() });

  let report = block_on(r.mag.run_self_test()).unwrap();

  assert!(!report.calibration_ok);
  assert_eq!(report.codes()[0], -1);
}

#[test]
fn one_shot_read_waits_for_the_whole_self_test() {
  let r = rig();
  r.bus.set_self_test_response(300, 0, -500);
  r.bus.set_sample(10, 20, 30);

  let (report, sample) = block_on(join(r.mag.run_self_test(), r.mag.read_raw()));

  assert!(!report.unwrap().passed);
  assert_eq!(sample.unwrap(), Sample::new(10, 20, 30));

  let attempt = [
    Op::Write { reg: CNTL2, value: POWER_DOWN },
    Op::Read { reg: CNTL2, len: 1 },
    Op::Read { reg: WIA1, len: 2 },
    Op::Write { reg: CNTL2, value: SELF_TEST },
    Op::Read { reg: ST1, len: 1 },
    Op::Read { reg: HXL, len: 6 },
  ];
  let conversion = [Op::Write { reg: CNTL2, value: SINGLE }, Op::Read { reg: ST1, len: 1 }, Op::Read { reg: HXL, len: 8 }];

  // six attempts, the ADC check, then the one-shot read
  let mut expected = Vec::new();
  for _ in 0..6 {
    expected.extend_from_slice(&attempt);
  }
  expected.extend_from_slice(&conversion);
  expected.extend_from_slice(&conversion);
  assert_eq!(r.bus.operations(), expected);
}

#[test]
fn running_stream_is_paused_and_resumed() {
  let r = rig();
  let mut delay = SimDelay::new(&r.clock);
  let mut sink = Recorder::default();
  let rec = sink.clone();

  let control = async {
    r.mag.set_delay_ns(100 * MS).await;
    r.mag.set_enabled(true).await.unwrap();
    rec.wait_for(1).await;

    let report = r.mag.run_self_test().await.unwrap();
    let after = rec.len();
    assert!(r.mag.is_enabled());

    rec.wait_for(after + 1).await;
    r.mag.set_enabled(false).await.unwrap();
    (report, after)
  };
  let (report, after) = match block_on(select(r.mag.run(&mut delay, &mut sink), control)) {
    Either::First(_) => unreachable!(),
    Either::Second(v) => v,
  };

  assert!(report.passed);
  // baseline was dropped by the power-down, so the stream restarts cleanly
  assert!(!rec.events()[after].synthetic);
  let writes = r.bus.writes_to(CNTL2);
  let st = writes.iter().position(|&v| v == SELF_TEST).unwrap();
  assert_eq!(writes[st - 2..st], [POWER_DOWN, POWER_DOWN]);
  assert!(writes[st + 1..].contains(&SINGLE));
}
