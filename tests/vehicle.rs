use racer_drive::{
    control::{duty_pair, DutyPair},
    state::Event,
    web::{Method, Reply, Router},
    Axis, AxisConfig, CommandIngress, Drive, DriveConfig, StateCell, Targets, Vehicle,
};

/// Records the duty pairs written for each axis, like the four LEDC channels would hold them.
#[derive(Default)]
struct Channels {
    throttle: Vec<DutyPair>,
    steering: Vec<DutyPair>,
}

impl Channels {
    fn last(&self, axis: Axis) -> DutyPair {
        let writes = match axis {
            Axis::Throttle => &self.throttle,
            Axis::Steering => &self.steering,
        };
        *writes.last().expect("no writes")
    }
}

impl Drive for Channels {
    fn write_axis(&mut self, axis: Axis, speed: i16) {
        match axis {
            Axis::Throttle => self.throttle.push(duty_pair(speed)),
            Axis::Steering => self.steering.push(duty_pair(speed)),
        }
    }
}

fn setup(targets: &Targets, config: DriveConfig) -> (Vehicle<'_, Channels>, CommandIngress<'_>) {
    let vehicle = Vehicle::new(&config, targets, Channels::default(), 0).unwrap();
    (vehicle, CommandIngress::new(targets, &config))
}

#[test]
fn immediate_stop_regardless_of_step() {
    let targets = Targets::new();
    let config = DriveConfig::default().with_throttle(AxisConfig::new(200, 1, 128));
    let (mut vehicle, ingress) = setup(&targets, config);

    ingress.set_targets(200, -250);
    for _ in 0..30 {
        vehicle.tick();
    }
    assert_eq!(vehicle.outputs().throttle, 157);
    assert_eq!(vehicle.outputs().steering, -250);

    ingress.set_targets(0, 0);
    let outputs = vehicle.tick();
    assert_eq!((outputs.throttle, outputs.steering), (0, 0));
    assert_eq!(vehicle.drive.last(Axis::Throttle), DutyPair::COAST);
    assert_eq!(vehicle.drive.last(Axis::Steering), DutyPair::COAST);
}

#[test]
fn kick_then_ramp_on_throttle() {
    let targets = Targets::new();
    let (mut vehicle, ingress) = setup(&targets, DriveConfig::default());

    ingress.set_targets(128 + 3 * 5, 0);
    let throttle: Vec<i16> = (0..5).map(|_| vehicle.tick().throttle).collect();
    assert_eq!(throttle, [128, 133, 138, 143, 143]);
    assert_eq!(
        vehicle.drive.last(Axis::Throttle),
        DutyPair {
            positive: 143,
            negative: 0
        }
    );
}

#[test]
fn small_target_is_not_overshot() {
    let targets = Targets::new();
    let (mut vehicle, ingress) = setup(&targets, DriveConfig::default());

    ingress.set_targets(0, -40);
    assert_eq!(vehicle.tick().steering, -40);
    assert_eq!(
        vehicle.drive.last(Axis::Steering),
        DutyPair {
            positive: 0,
            negative: 40
        }
    );
}

#[test]
fn writes_every_tick() {
    let targets = Targets::new();
    let (mut vehicle, _ingress) = setup(&targets, DriveConfig::default());

    for _ in 0..3 {
        vehicle.tick();
    }
    assert_eq!(vehicle.drive.throttle.len(), 3);
    assert_eq!(vehicle.drive.steering, [DutyPair::COAST; 3]);
}

#[test]
fn poll_ticks_once_per_interval() {
    let targets = Targets::new();
    let (mut vehicle, ingress) = setup(&targets, DriveConfig::default());
    ingress.set_targets(200, 0);

    let ticks = (0..100u32).filter_map(|now| vehicle.poll(now)).count();
    assert_eq!(ticks, 9);

    // A long stall still produces a single step
    let before = vehicle.outputs().throttle;
    assert!(vehicle.poll(400).is_some());
    assert_eq!(vehicle.outputs().throttle, before + 5);
    assert!(vehicle.poll(405).is_none());
}

#[test]
fn watchdog_stops_silent_controller() {
    let targets = Targets::new();
    let config = DriveConfig::default().with_command_timeout_ms(Some(300));
    let (mut vehicle, ingress) = setup(&targets, config);

    ingress.set_targets(200, 100);
    for now in (10..=290).step_by(10) {
        vehicle.poll(now);
    }
    assert!(vehicle.outputs().throttle > 0);

    // Command keeps arriving, vehicle keeps going
    ingress.set_targets(200, 100);
    for now in (300..=590).step_by(10) {
        vehicle.poll(now);
    }
    assert!(vehicle.outputs().throttle > 0);

    for now in (600..=700).step_by(10) {
        vehicle.poll(now);
    }
    assert_eq!(vehicle.outputs(), Default::default());
    assert_eq!(vehicle.drive.last(Axis::Throttle), DutyPair::COAST);
    assert_eq!(vehicle.drive.last(Axis::Steering), DutyPair::COAST);
    // The published command is left alone
    assert_eq!(targets.load(), (200, 100));
    assert_eq!(targets.sequence(), 2);

    // A fresh command drives again
    ingress.set_targets(200, 100);
    vehicle.poll(710);
    assert_eq!(vehicle.outputs().throttle, 128);
}

#[test]
fn disabled_watchdog_keeps_last_command() {
    let targets = Targets::new();
    let config = DriveConfig::default().with_command_timeout_ms(None);
    let (mut vehicle, ingress) = setup(&targets, config);

    ingress.set_targets(100, 0);
    for now in (10..=10_000).step_by(10) {
        vehicle.poll(now);
    }
    assert_eq!(vehicle.outputs().throttle, 100);
}

#[test]
fn web_request_drives_motors() {
    let targets = Targets::new();
    let state = StateCell::new();
    let config = DriveConfig::default();
    let mut vehicle = Vehicle::new(&config, &targets, Channels::default(), 0).unwrap();
    let router = Router::new(CommandIngress::new(&targets, &config), &state);

    state.apply(Event::Associated).unwrap();
    assert_eq!(
        router.handle(Method::Get, "/control?t=90&s=0"),
        Reply::Unavailable
    );
    state.apply(Event::ServicesStarted).unwrap();

    assert_eq!(
        router.handle(Method::Get, "/control?t=-90&s=999"),
        Reply::Accepted
    );
    let outputs = vehicle.tick();
    assert_eq!(outputs.throttle, -90);
    assert_eq!(outputs.steering, 150);

    assert_eq!(
        router.handle(Method::Get, "/control?t=0"),
        Reply::BadRequest(racer_drive::web::IngressError::Missing)
    );
    assert_eq!(vehicle.tick().throttle, -90);

    router.handle(Method::Get, "/control?t=0&s=0");
    assert_eq!(vehicle.tick(), Default::default());
}

#[test]
fn invalid_config_is_rejected() {
    let targets = Targets::new();
    let config = DriveConfig::default().with_throttle(AxisConfig::new(300, 5, 128));
    assert!(Vehicle::new(&config, &targets, Channels::default(), 0).is_err());
}
